//! Result type alias for generation operations

use crate::error::DevgenError;

/// Standard Result type for devgen operations
pub type Result<T> = std::result::Result<T, DevgenError>;
