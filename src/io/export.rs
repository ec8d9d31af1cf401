//! CSV export for published readings.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::telemetry::{Reading, format_timestamp};

/// Column header for CSV telemetry export.
const HEADER: &str = "timestamp,der_id,type,project_id,is_online,\
                       current_output,power_meter_measurement,current_soc,\
                       baseline,contract_threshold,nameplate_capacity,connection_start_at";

fn record(r: &Reading) -> [String; 12] {
    [
        format_timestamp(&r.timestamp),
        r.der_id.clone(),
        r.der_type.as_str().to_string(),
        r.project_id.clone(),
        r.is_online.to_string(),
        format!("{:.2}", r.current_output),
        format!("{:.2}", r.power_meter_measurement),
        format!("{:.2}", r.current_soc),
        format!("{:.2}", r.baseline),
        format!("{:.2}", r.contract_threshold),
        format!("{:.2}", r.nameplate_capacity),
        r.connection_start_at
            .as_ref()
            .map(format_timestamp)
            .unwrap_or_default(),
    ]
}

/// Streams readings to CSV as they are produced.
pub struct TelemetryCsvWriter {
    wtr: csv::Writer<Box<dyn Write + Send>>,
}

impl TelemetryCsvWriter {
    /// Wraps `writer` and emits the header row.
    pub fn new(writer: Box<dyn Write + Send>) -> csv::Result<Self> {
        let mut wtr = csv::WriterBuilder::new().from_writer(writer);
        wtr.write_record(HEADER.split(',').map(str::trim))?;
        Ok(Self { wtr })
    }

    /// Creates (or truncates) the file at `path`.
    pub fn create(path: &Path) -> csv::Result<Self> {
        let file = File::create(path)?;
        Self::new(Box::new(io::BufWriter::new(file)))
    }

    /// Appends one reading.
    pub fn append(&mut self, reading: &Reading) -> csv::Result<()> {
        self.wtr.write_record(&record(reading))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.wtr.flush()
    }
}
