//! Engine error types.

use thiserror::Error;

use crate::object::ObjectId;

/// Errors that can occur when addressing tracked objects.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ObjectError {
    #[error("No object with id {0}")]
    NotFound(ObjectId),
}
