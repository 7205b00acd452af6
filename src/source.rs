//! Where document bytes come from.
//!
//! [`RootElement::from_file`](crate::model::RootElement::from_file) reads
//! through a [`FileSource`]; anything else (an HTTP client, an archive) plugs
//! in by implementing [`ByteSource`], or by passing a closure.

use std::io::Read;
use std::path::Path;

use crate::config::Config;
use crate::error::{AtomError, Result};

/// Opens a location and returns its bytes.
pub trait ByteSource {
    fn open(&self, location: &str) -> Result<Vec<u8>>;
}

impl<F> ByteSource for F
where
    F: Fn(&str) -> Result<Vec<u8>>,
{
    fn open(&self, location: &str) -> Result<Vec<u8>> {
        self(location)
    }
}

/// Reads documents from the local filesystem, refusing oversized files.
#[derive(Debug, Clone)]
pub struct FileSource {
    max_bytes: u64,
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl FileSource {
    pub fn new(config: &Config) -> Self {
        FileSource {
            max_bytes: config.max_document_bytes,
        }
    }

    pub fn read(&self, path: &Path) -> Result<Vec<u8>> {
        // Check the size before reading to avoid loading huge files
        let size = std::fs::metadata(path)?.len();
        if size > self.max_bytes {
            return Err(AtomError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }

        let mut bytes = Vec::with_capacity(size as usize);
        // The file may grow between metadata and read
        std::fs::File::open(path)?
            .take(self.max_bytes + 1)
            .read_to_end(&mut bytes)?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(AtomError::TooLarge {
                size: bytes.len() as u64,
                max: self.max_bytes,
            });
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read document file");
        Ok(bytes)
    }
}

impl ByteSource for FileSource {
    fn open(&self, location: &str) -> Result<Vec<u8>> {
        self.read(Path::new(location))
    }
}
