use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::{Result, TranscodeError};
use crate::output::write_atomically;
use crate::utils::bin_to_hex_tokens;

pub const DEFAULT_BYTES_PER_LINE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
    pub per_line: usize,
    pub upper: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        DumpOptions {
            per_line: DEFAULT_BYTES_PER_LINE,
            upper: false,
        }
    }
}

/// Render `bytes` as a dump the transcoder reads back unchanged: every token
/// is followed by one space, so each line ends in an empty marker token.
pub fn dump_bytes(bytes: &[u8], opts: &DumpOptions) -> String {
    let per_line = opts.per_line.max(1);
    let mut out = String::with_capacity(bytes.len() * 3 + bytes.len() / per_line + 1);
    for chunk in bytes.chunks(per_line) {
        for token in bin_to_hex_tokens(chunk, opts.upper) {
            out.push_str(&token);
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

pub fn dump_file(input: &Path, output: &Path, opts: &DumpOptions) -> Result<usize> {
    let bytes =
        fs::read(input).map_err(|source| TranscodeError::read_input(input.to_path_buf(), source))?;
    let text = dump_bytes(&bytes, opts);
    write_atomically(output, |writer| {
        writer
            .write_all(text.as_bytes())
            .map_err(|source| TranscodeError::OutputNotWritable {
                path: output.to_path_buf(),
                source,
            })
    })?;
    info!(bytes = bytes.len(), "dumped {} to {}", input.display(), output.display());
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Normalization;
    use crate::transcode::transcode_str;

    #[test]
    fn test_dump_layout() {
        let opts = DumpOptions { per_line: 2, upper: true };
        assert_eq!(dump_bytes(&[0x1f, 0x2a, 0xff], &opts), "1F 2A \nFF \n");
        assert_eq!(dump_bytes(&[], &opts), "");
        let opts = DumpOptions { per_line: 0, upper: false };
        assert_eq!(dump_bytes(&[0x0a, 0x0b], &opts), "0a \n0b \n");
    }

    #[test]
    fn test_dump_reads_back() {
        let bytes: Vec<u8> = (0..=255u8).chain([0x0a, 0x00, 0x20]).collect();
        let text = dump_bytes(&bytes, &DumpOptions::default());
        assert_eq!(transcode_str(&text, &Normalization::legacy()).unwrap(), bytes);
        assert_eq!(transcode_str(&text, &Normalization::Collapse).unwrap(), bytes);
    }

    #[test]
    fn test_dump_file() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("binary");
        let txt = dir.path().join("raw_nbt.txt");
        fs::write(&bin, [0x0a, 0x00, 0x00]).unwrap();
        assert_eq!(dump_file(&bin, &txt, &DumpOptions::default()).unwrap(), 3);
        assert_eq!(fs::read_to_string(&txt).unwrap(), "0a 00 00 \n");
    }

    #[test]
    fn test_dump_file_keeps_existing_dump_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("raw_nbt.txt");
        fs::write(&txt, "ff \n").unwrap();
        let err = dump_file(&dir.path().join("missing"), &txt, &DumpOptions::default()).unwrap_err();
        assert!(matches!(err, TranscodeError::InputNotFound { .. }));
        assert_eq!(fs::read_to_string(&txt).unwrap(), "ff \n");

        let err = dump_file(&txt, &dir.path().join("no_dir").join("out.txt"), &DumpOptions::default())
            .unwrap_err();
        assert!(matches!(err, TranscodeError::OutputNotWritable { .. }));
    }
}
