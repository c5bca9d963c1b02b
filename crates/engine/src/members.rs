//! People that take part in groups. Identity lives in the id; the name is
//! for display and store-level lookup.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person expenses can be split with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}
