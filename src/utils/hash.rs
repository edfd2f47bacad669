//! Hash calculation utilities.

use crate::core::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Buffer size for reading files (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Hash calculator for files.
pub struct HashCalculator;

impl HashCalculator {
    /// Calculate SHA256 hash of a file.
    ///
    /// This is the content identity VirusTotal keys its reports by.
    pub fn sha256_file(path: &Path) -> Result<String> {
        let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .map_err(|e| Error::file_read(path, e))?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Calculate SHA256 hash of bytes.
    pub fn sha256_bytes(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }
}
