//! Delimited-text report writer.

use crate::domain::correlation::CorrelationResult;
use crate::domain::error::SentipriceError;
use crate::domain::table::WindowTable;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;

pub const CORRELATION_HEADERS: [&str; 7] =
    ["variant", "offset", "metric", "r", "p_value", "n", "significant"];

pub struct CsvReportAdapter {
    delimiter: u8,
}

impl CsvReportAdapter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    fn writer(&self, output_path: &Path) -> Result<csv::Writer<fs::File>, SentipriceError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(output_path)
            .map_err(|e| output_error(output_path, e))
    }
}

fn output_error(path: &Path, e: csv::Error) -> SentipriceError {
    SentipriceError::Output {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_windows(
        &self,
        table: &WindowTable,
        output_path: &Path,
    ) -> Result<(), SentipriceError> {
        let mut wtr = self.writer(output_path)?;
        wtr.write_record(&table.headers)
            .map_err(|e| output_error(output_path, e))?;
        for row in &table.rows {
            wtr.write_record(row).map_err(|e| output_error(output_path, e))?;
        }
        wtr.flush()?;
        tracing::info!(path = %output_path.display(), rows = table.len(), "windows written");
        Ok(())
    }

    fn write_correlations(
        &self,
        results: &[CorrelationResult],
        output_path: &Path,
    ) -> Result<(), SentipriceError> {
        let mut wtr = self.writer(output_path)?;
        wtr.write_record(CORRELATION_HEADERS)
            .map_err(|e| output_error(output_path, e))?;
        for r in results {
            wtr.write_record([
                r.variant.to_string(),
                r.label(),
                r.metric.to_string(),
                format!("{:.6}", r.r),
                format!("{:.6}", r.p_value),
                r.n.to_string(),
                r.significant.to_string(),
            ])
            .map_err(|e| output_error(output_path, e))?;
        }
        wtr.flush()?;
        tracing::info!(path = %output_path.display(), rows = results.len(), "correlations written");
        Ok(())
    }
}
