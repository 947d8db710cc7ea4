use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;

use crate::error::{Result, TranscodeError};

// A symlinked output is followed so the file it points at gets replaced and
// the link itself survives. Dangling links and missing files resolve to
// themselves.
fn resolve_target(output: &Path) -> PathBuf {
    fs::canonicalize(output).unwrap_or_else(|_| output.to_path_buf())
}

/// Write through a temporary file next to `output` and rename it into place
/// only if `write` succeeds. A failed run leaves `output` as it was.
///
/// The replacement keeps the permissions of the file it replaces; a new file
/// gets the usual 0666-minus-umask mode rather than the private temp-file
/// mode.
pub(crate) fn write_atomically<T>(
    output: &Path,
    write: impl FnOnce(&mut dyn Write) -> Result<T>,
) -> Result<T> {
    let not_writable = |source: std::io::Error| TranscodeError::OutputNotWritable {
        path: output.to_path_buf(),
        source,
    };
    let target = resolve_target(output);
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let existing = fs::metadata(&target).ok().map(|meta| meta.permissions());

    let mut builder = Builder::new();
    builder.prefix(".hexbin");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // the mode passed to open(2) is still filtered by the umask
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir).map_err(not_writable)?;
    if let Some(perms) = existing {
        tmp.as_file().set_permissions(perms).map_err(not_writable)?;
    }

    let value = {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let value = write(&mut writer)?;
        writer.flush().map_err(not_writable)?;
        value
    };
    tmp.persist(&target).map_err(|err| not_writable(err.error))?;
    Ok(value)
}
