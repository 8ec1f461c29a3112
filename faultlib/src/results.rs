use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use chrono::NaiveDateTime;
use log::info;
use crate::config::PolicyKind;
use crate::error::{Error, Result};
use crate::simulator::SimulationResult;

/// The strftime pattern used to name result files
pub const FILE_NAME_FORMAT: &str = "faults_%m-%d-%Y_%H:%M:%S.csv";

/// Receives the averaged results of a simulation for persistence
pub trait ResultsSink {
    fn write_results(&mut self, result: &SimulationResult) -> Result<()>;
}

/// Writes the results table as comma separated text
///
/// The header is `wss,LRU,FIFO,Clock`, followed by one row per working set size
pub fn write_table<W: Write>(result: &SimulationResult, mut writer: W) -> std::io::Result<()> {
    let header = std::iter::once("wss")
        .chain(PolicyKind::ALL.iter().map(|kind| kind.column_name()))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{header}")?;
    for row in result.rows() {
        write!(writer, "{}", row.wss)?;
        for kind in PolicyKind::ALL {
            write!(writer, ",{}", row.get(kind))?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

/// The file name for a run started at `started`
pub fn file_name_for(started: &NaiveDateTime) -> String {
    started.format(FILE_NAME_FORMAT).to_string()
}

/// Writes results to a CSV file named after the time the run started
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    /// # Arguments
    ///
    /// * `directory`: Where the file is created. Must already exist
    /// * `started`: The local time the run started at
    ///
    /// returns: CsvFileSink
    pub fn new(directory: &Path, started: &NaiveDateTime) -> Self {
        Self {
            path: directory.join(file_name_for(started)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultsSink for CsvFileSink {
    fn write_results(&mut self, result: &SimulationResult) -> Result<()> {
        let file = File::create(&self.path).map_err(|e| Error::io(&self.path, e))?;
        write_table(result, BufWriter::new(file)).map_err(|e| Error::io(&self.path, e))?;
        info!("Wrote results to {}", self.path.display());
        Ok(())
    }
}
