//! Data source trait definitions.

use crate::error::DataError;
use crate::types::Bar;

/// Supplier of historical bars.
///
/// Implementations must hand back bars ordered from oldest to newest with
/// strictly increasing timestamps, rejecting anything else at ingestion.
pub trait DataSource {
    /// Human-readable description of where the bars come from.
    fn name(&self) -> &str;

    /// Load every bar the source holds.
    fn load(&self) -> Result<Vec<Bar>, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource(Vec<Bar>);

    impl DataSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        fn load(&self) -> Result<Vec<Bar>, DataError> {
            if self.0.is_empty() {
                return Err(DataError::NoDataAvailable);
            }
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_source_contract() {
        let source = StaticSource(vec![Bar::new(1, 10.0, 11.0, 9.0, 10.0, 1.0)]);
        assert_eq!(source.load().unwrap().len(), 1);
        assert!(StaticSource(vec![]).load().is_err());
    }
}
