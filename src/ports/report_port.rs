//! Output port for analysis tables.

use crate::domain::correlation::CorrelationResult;
use crate::domain::error::SentipriceError;
use crate::domain::table::WindowTable;
use std::path::Path;

pub trait ReportPort {
    fn write_windows(&self, table: &WindowTable, output_path: &Path) -> Result<(), SentipriceError>;

    fn write_correlations(
        &self,
        results: &[CorrelationResult],
        output_path: &Path,
    ) -> Result<(), SentipriceError>;
}
