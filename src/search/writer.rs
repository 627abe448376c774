//! Writing a serialized index to disk.

use super::Artifact;
use crate::log;
use anyhow::{Result, bail};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Outcome of [`write_artifact`]: every file was attempted.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub errors: Vec<(PathBuf, io::Error)>,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fail with every collected error when any write failed.
    pub fn into_result(self) -> Result<Vec<PathBuf>> {
        if self.errors.is_empty() {
            return Ok(self.written);
        }
        let details = self
            .errors
            .iter()
            .map(|(path, err)| format!("  {}: {err}", path.display()))
            .collect::<Vec<_>>()
            .join("\n");
        bail!(
            "{} of {} index files could not be written:\n{details}",
            self.errors.len(),
            self.errors.len() + self.written.len()
        )
    }
}

/// Replace `dir` with the files of `artifact`.
///
/// The previous index is removed first. A failing file is logged and
/// recorded, the remaining files are still written.
pub fn write_artifact(artifact: &Artifact, dir: &Path) -> WriteReport {
    let mut report = WriteReport::default();

    if let Err(err) = fs::remove_dir_all(dir)
        && err.kind() != io::ErrorKind::NotFound
    {
        log!("warn"; "failed to remove old index {}: {err}", dir.display());
    }

    for (relative, bytes) in &artifact.files {
        let path = dir.join(relative);
        match write_file(&path, bytes) {
            Ok(()) => report.written.push(path),
            Err(err) => {
                log!("error"; "failed to write {}: {err}", path.display());
                report.errors.push((path, err));
            }
        }
    }

    report
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}
