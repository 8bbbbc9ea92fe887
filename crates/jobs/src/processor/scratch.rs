//! Scratch files holding submitted code while a tool analyses it.

use std::io::{self, Write};
use std::path::Path;

use tempfile::TempPath;

/// A uniquely named `.py` file in the system temp directory.
///
/// Dropping it removes the file; [`ScratchArtifact::remove`] does the same
/// but reports failures.
#[derive(Debug)]
pub struct ScratchArtifact {
    path: TempPath,
}

impl ScratchArtifact {
    /// Write `code` byte for byte into a fresh scratch file.
    pub fn write(code: &str) -> io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("quack-")
            .suffix(".py")
            .tempfile()?;
        file.write_all(code.as_bytes())?;
        file.flush()?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(self) -> io::Result<()> {
        self.path.close()
    }
}
