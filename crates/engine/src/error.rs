//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`UnknownMember`] thrown when a record references a member outside its
//!   group.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`UnknownMember`]: EngineError::UnknownMember
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("member not in group: {0}")]
    UnknownMember(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid rule: {0}")]
    InvalidRule(String),
}
