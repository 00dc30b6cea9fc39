//! Data sources for the backtesting engine.

mod csv_source;

pub use csv_source::CsvDataSource;

use std::path::Path;

use barlab_core::error::DataError;
use barlab_core::traits::DataSource;
use barlab_core::types::Bar;

/// Load and validate bars from a CSV file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>, DataError> {
    CsvDataSource::new(path)?.load()
}
