//! Log file sink that is attached after startup
//!
//! The subscriber is installed before the output root is known to be valid.
//! Until [`DeferredLogFile::attach`] is called, events written to this sink
//! are dropped and nothing is created on disk.

use crate::Result;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
pub struct DeferredLogFile {
    file: Arc<Mutex<Option<File>>>,
}

impl DeferredLogFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` for appending, creating its parent directory
    pub fn attach(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        *self.lock() = Some(file);
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct DeferredLogWriter {
    file: Arc<Mutex<Option<File>>>,
}

impl Write for DeferredLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for DeferredLogFile {
    type Writer = DeferredLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DeferredLogWriter {
            file: Arc::clone(&self.file),
        }
    }
}
