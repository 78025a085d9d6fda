use std::io::Write;
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use crate::error::Error;

/// Write `contents` to `path` through a temporary file in the same
/// directory, then move it over the target. On failure the target is left
/// untouched.
pub fn write_atomic(path: impl AsRef<Path>, contents: &str) -> Result<(), Error> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    debug!(temp = file.path().display().to_string(); "Persisting output");
    file.persist(path)?;
    Ok(())
}
