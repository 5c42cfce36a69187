//! Cache errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// A cache exists under this name but stores a different value type.
    #[error("cache '{name}' type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}
