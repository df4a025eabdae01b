use thiserror::Error;

/// Failure propagated through the construction call chain. Produced by the
/// schema source while reading or parsing a document; the builder adds no
/// kinds of its own.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read a schema document")]
    Io(#[from] std::io::Error),
    /// Malformed input the source could not recover from. Diagnostics for it
    /// are expected to have been reported through the sink already.
    #[error("schema document could not be parsed")]
    IllegalSchema,
    #[error("schema source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BuildError {
    pub fn source_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Source(Box::new(error))
    }
}

/// Outcome of a top-level build, classified once at the entry point.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// At least one diagnostic was reported. A structurally complete tree
    /// may well have been produced; it is discarded.
    #[error("schema is incorrect")]
    IncorrectSchema,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("schema source failed: {0}")]
    Structural(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<BuildError> for SchemaError {
    fn from(error: BuildError) -> Self {
        match error {
            BuildError::Io(error) => Self::Io(error),
            BuildError::IllegalSchema => Self::IncorrectSchema,
            BuildError::Source(error) => Self::Structural(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_schema_maps_to_incorrect_schema() {
        assert!(matches!(
            SchemaError::from(BuildError::IllegalSchema),
            SchemaError::IncorrectSchema
        ));
    }

    #[test]
    fn source_failures_keep_their_cause() {
        let error = BuildError::source_error(crate::datatype::DatatypeError::new("bad input"));
        match SchemaError::from(error) {
            SchemaError::Structural(cause) => assert_eq!(cause.to_string(), "bad input"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn io_failures_keep_their_cause() {
        let error = BuildError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "b.rng"));
        match SchemaError::from(error) {
            SchemaError::Io(error) => assert_eq!(error.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
