//! Error types for lodcrate

use thiserror::Error;

/// Main error type for lodcrate operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Non-manifold topology: {0}")]
    NonManifold(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),
}

/// Result type alias for lodcrate operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidData("facet 3 references vertex 9".to_string());
        assert_eq!(err.to_string(), "Invalid data: facet 3 references vertex 9");
        let err = Error::NonManifold("edge (1, 2) used twice".to_string());
        assert_eq!(err.to_string(), "Non-manifold topology: edge (1, 2) used twice");
    }
}
