//! Digest construction for package fingerprints.
//!
//! Every fingerprint is a SHA-256 stream of newline-terminated tag lines,
//! raw file contents and byte counts, rendered as lowercase hex.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Incremental builder for a fingerprint digest.
#[derive(Default)]
pub struct DigestBuilder {
    hasher: Sha256,
}

impl DigestBuilder {
    /// Create a new, empty digest builder.
    pub fn new() -> Self {
        DigestBuilder {
            hasher: Sha256::new(),
        }
    }

    /// Add a newline-terminated line.
    pub fn line(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.hasher.update(line.as_ref().as_bytes());
        self.hasher.update(b"\n");
        self
    }

    /// Stream a file into the digest.
    ///
    /// The file contributes its relative name, its raw bytes and its byte
    /// count, so a rename and a content change are both observable.
    pub fn update_file(&mut self, dir: &Path, name: &str) -> io::Result<u64> {
        let file = File::open(dir.join(name))?;

        self.line(format!("file {}", name));

        let mut reader = BufReader::new(file);
        let mut buffer = [0u8; 8192];
        let mut total = 0u64;

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            self.hasher.update(&buffer[..bytes_read]);
            total += bytes_read as u64;
        }

        self.line(format!("{} bytes", total));
        Ok(total)
    }

    /// Finalize and return the digest as a lowercase hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}
