use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, SignerError};

/// Read `path`, mapping a missing file to `None`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(SignerError::io(path, err)),
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// `mode` sets Unix permissions on the file before it becomes visible.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T, mode: Option<u32>) -> Result<()> {
    stage_json(path, value, mode)?.commit()
}

/// A fully written temp file waiting to be renamed over its target.
///
/// Dropping it without [`commit`](Self::commit) removes the temp file and
/// leaves the target untouched.
pub(crate) struct StagedWrite {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

/// Write `value` next to `path` without replacing `path` yet.
pub(crate) fn stage_json<T: Serialize>(
    path: &Path,
    value: &T,
    mode: Option<u32>,
) -> Result<StagedWrite> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    let staged = StagedWrite {
        tmp: path.with_extension("json.tmp"),
        target: path.to_path_buf(),
        committed: false,
    };
    let mut file = open_new(&staged.tmp, mode)?;
    file.write_all(&bytes)
        .and_then(|_| file.sync_all())
        .map_err(|err| SignerError::io(&staged.tmp, err))?;
    Ok(staged)
}

impl StagedWrite {
    pub(crate) fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp, &self.target).map_err(|err| SignerError::io(&self.target, err))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

#[cfg(unix)]
fn open_new(path: &Path, mode: Option<u32>) -> Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if let Some(mode) = mode {
        options.mode(mode);
    }
    let file = options.open(path).map_err(|err| SignerError::io(path, err))?;
    // `mode` only applies on creation; a stale temp file keeps its old bits.
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|err| SignerError::io(path, err))?;
    }
    Ok(file)
}

#[cfg(not(unix))]
fn open_new(path: &Path, _mode: Option<u32>) -> Result<fs::File> {
    fs::File::create(path).map_err(|err| SignerError::io(path, err))
}
