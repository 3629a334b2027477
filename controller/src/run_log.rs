use std::{
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
};

use plugger_common::{ControlError, CycleRecord};
use tracing::info;

/// Append-only CSV record of completed cycles.
///
/// Every call opens the file, writes, flushes and closes it again, so a crash can lose at
/// most the row being written.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the header when the sink is missing or empty; existing rows are left alone.
    pub fn ensure_initialized(&self) -> Result<(), ControlError> {
        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(err) if err.kind() == io::ErrorKind::NotFound => true,
            Err(err) => return Err(self.persistence(err)),
        };

        if needs_header {
            self.write_row(&CycleRecord::HEADER)?;
            info!("initialised run log {}", self.path.display());
        }
        Ok(())
    }

    pub fn append(&self, record: &CycleRecord) -> Result<(), ControlError> {
        self.write_row(&record.to_row())
    }

    fn write_row<T: AsRef<[u8]>>(&self, fields: &[T]) -> Result<(), ControlError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| self.persistence(err))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record(fields)
            .map_err(|err| self.persistence(err.into()))?;

        writer.flush().map_err(|err| self.persistence(err))?;

        let file = writer.into_inner().map_err(|err| {
            self.persistence(io::Error::new(err.error().kind(), err.error().to_string()))
        })?;
        file.sync_data().map_err(|err| self.persistence(err))
    }

    fn persistence(&self, source: io::Error) -> ControlError {
        ControlError::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}
