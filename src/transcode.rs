use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, TranscodeError};
use crate::normalize::Normalization;
use crate::output::write_atomically;
use crate::utils::parse_hex_token;

/// Summary of one transcoding run.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeReport {
    /// Lines seen, including the empty line after a final newline.
    pub lines: usize,
    /// Bytes produced.
    pub bytes: usize,
    /// Trailing markers that carried text rather than being empty.
    pub annotations: usize,
}

// Every dump line ends with a marker token that is never data: either the
// empty token left by a trailing space or a free-form annotation. Returns
// whether that marker had any text in it.
fn decode_line_into(line: &str, line_no: usize, out: &mut Vec<u8>) -> Result<bool> {
    let (data, marker) = match line.rsplit_once(' ') {
        Some((data, marker)) => (Some(data), marker),
        None => (None, line),
    };
    if let Some(data) = data {
        for (idx, token) in data.split(' ').enumerate() {
            let byte = parse_hex_token(token)
                .map_err(|err| TranscodeError::from_token(err, line_no, idx + 1, token))?;
            out.push(byte);
        }
    }
    Ok(!marker.trim().is_empty())
}

/// Decode one already-normalized line. `line_no` is only used in errors.
pub fn parse_line(line: &str, line_no: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    decode_line_into(line, line_no, &mut out)?;
    Ok(out)
}

pub fn transcode_str_with_report(
    text: &str,
    normalization: &Normalization,
) -> Result<(Vec<u8>, TranscodeReport)> {
    let normalized = normalization.apply(text);
    let mut bin = Vec::new();
    let mut report = TranscodeReport::default();
    for (idx, line) in normalized.split('\n').enumerate() {
        let before = bin.len();
        if decode_line_into(line, idx + 1, &mut bin)? {
            report.annotations += 1;
        }
        debug!(line = idx + 1, bytes = bin.len() - before, "decoded line");
        report.lines += 1;
    }
    report.bytes = bin.len();
    Ok((bin, report))
}

pub fn transcode_str(text: &str, normalization: &Normalization) -> Result<Vec<u8>> {
    transcode_str_with_report(text, normalization).map(|(bin, _)| bin)
}

fn stream_lines<R: BufRead, W: Write + ?Sized>(
    mut reader: R,
    writer: &mut W,
    normalization: &Normalization,
    input: &Path,
    output: &Path,
) -> Result<TranscodeReport> {
    let mut report = TranscodeReport::default();
    let mut raw = Vec::new();
    let mut bin = Vec::new();
    // an empty input, or one ending in '\n', still has a final empty line
    let mut pending_empty_line = true;
    loop {
        raw.clear();
        let n = reader
            .read_until(b'\n', &mut raw)
            .map_err(|source| TranscodeError::read_input(input.to_path_buf(), source))?;
        if n == 0 {
            break;
        }
        let line_no = report.lines + 1;
        pending_empty_line = raw.last() == Some(&b'\n');
        if pending_empty_line {
            raw.pop();
        }
        let line = std::str::from_utf8(&raw)
            .map_err(|_| TranscodeError::InvalidUtf8 { line: line_no })?;

        bin.clear();
        if decode_line_into(&normalization.apply(line), line_no, &mut bin)? {
            report.annotations += 1;
        }
        writer
            .write_all(&bin)
            .map_err(|source| TranscodeError::OutputNotWritable {
                path: output.to_path_buf(),
                source,
            })?;
        debug!(line = line_no, bytes = bin.len(), "streamed line");
        report.lines += 1;
        report.bytes += bin.len();
    }
    if pending_empty_line {
        report.lines += 1;
    }
    Ok(report)
}

/// Decode `reader` one line at a time, writing bytes to `writer` as each line
/// is parsed. Output is identical to [`transcode_str`]; on error, whatever was
/// already written stays in `writer`.
pub fn transcode_reader<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    normalization: &Normalization,
) -> Result<TranscodeReport> {
    stream_lines(reader, writer, normalization, Path::new("<reader>"), Path::new("<writer>"))
}

fn utf8_error_line(data: &[u8], valid_up_to: usize) -> usize {
    data[..valid_up_to].iter().filter(|b| **b == b'\n').count() + 1
}

/// Convert the dump at `config.input` into `config.output`.
pub fn transcode_file(config: &Config) -> Result<TranscodeReport> {
    let input = config.input.as_path();
    let output = config.output.as_path();
    info!(input = %input.display(), output = %output.display(), streaming = config.streaming, "transcoding");

    let report = if config.streaming {
        let file = File::open(input)
            .map_err(|source| TranscodeError::read_input(input.to_path_buf(), source))?;
        write_atomically(output, |writer| {
            stream_lines(BufReader::new(file), writer, &config.normalization, input, output)
        })?
    } else {
        let data = fs::read(input)
            .map_err(|source| TranscodeError::read_input(input.to_path_buf(), source))?;
        let text = std::str::from_utf8(&data).map_err(|err| TranscodeError::InvalidUtf8 {
            line: utf8_error_line(&data, err.valid_up_to()),
        })?;
        let (bin, report) = transcode_str_with_report(text, &config.normalization)?;
        write_atomically(output, |writer| {
            writer
                .write_all(&bin)
                .map_err(|source| TranscodeError::OutputNotWritable {
                    path: output.to_path_buf(),
                    source,
                })
        })?;
        report
    };

    info!(lines = report.lines, bytes = report.bytes, "wrote {}", output.display());
    Ok(report)
}

#[test]
fn test_single_line_trailing_space() {
    let bin = transcode_str("1f 2a FF \n", &Normalization::legacy()).unwrap();
    assert_eq!(bin, vec![0x1f, 0x2a, 0xff]);
}

#[test]
fn test_annotation_markers_dropped() {
    let (bin, report) = transcode_str_with_report("00 01 x\n02 03 y", &Normalization::legacy()).unwrap();
    assert_eq!(bin, vec![0x00, 0x01, 0x02, 0x03]);
    assert_eq!(report, TranscodeReport { lines: 2, bytes: 4, annotations: 2 });
}

#[test]
fn test_marker_only_lines_contribute_nothing() {
    assert_eq!(parse_line("", 1).unwrap(), Vec::<u8>::new());
    assert_eq!(parse_line("ff", 1).unwrap(), Vec::<u8>::new());
    let (bin, report) = transcode_str_with_report("\n\n0a \n", &Normalization::Collapse).unwrap();
    assert_eq!(bin, vec![0x0a]);
    assert_eq!(report.lines, 4);
    assert_eq!(report.annotations, 0);
}

#[test]
fn test_output_length_matches_token_count() {
    let text = "de ad be ef  header\n00 11 22 33 44 55 66 77 88 99 aa bb cc dd ee ff \nCA FE end";
    let bin = transcode_str(text, &Normalization::Collapse).unwrap();
    assert_eq!(bin.len(), 4 + 16 + 2);
    assert_eq!(&bin[..4], &[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(bin[4..20].to_vec(), (0..16u8).map(|n| n * 0x11).collect::<Vec<_>>());
    assert_eq!(&bin[20..], &[0xca, 0xfe]);

    // only the last token is a marker; a multi-word annotation is not
    assert!(transcode_str("de ad # header", &Normalization::Collapse).is_err());
}

#[test]
fn test_bad_tokens() {
    let err = transcode_str("00 01 \n02 zz 03 \n", &Normalization::legacy()).unwrap_err();
    assert!(matches!(
        err,
        TranscodeError::MalformedToken { line: 2, column: 2, ref token } if token == "zz"
    ));

    let err = transcode_str("100 x", &Normalization::legacy()).unwrap_err();
    assert!(matches!(err, TranscodeError::ByteOverflow { line: 1, column: 1, .. }));
}

#[test]
fn test_signed_and_underscored_tokens() {
    let bin = transcode_str("+1f -0 f_f 0x_2a x", &Normalization::Collapse).unwrap();
    assert_eq!(bin, vec![0x1f, 0x00, 0xff, 0x2a]);
    let err = transcode_str("01 -1 x", &Normalization::Collapse).unwrap_err();
    assert!(matches!(err, TranscodeError::ByteOverflow { line: 1, column: 2, .. }));
}

#[test]
fn test_legacy_normalization_limit() {
    let text = format!("01{}02 \n", " ".repeat(128));
    let err = transcode_str(&text, &Normalization::legacy()).unwrap_err();
    assert!(matches!(err, TranscodeError::MalformedToken { line: 1, column: 2, ref token } if token.is_empty()));
    assert_eq!(transcode_str(&text, &Normalization::Collapse).unwrap(), vec![0x01, 0x02]);
}

#[test]
fn test_crlf_input() {
    let bin = transcode_str("0a 0b \r\n0c x\r\n", &Normalization::Collapse).unwrap();
    assert_eq!(bin, vec![0x0a, 0x0b, 0x0c]);
}

#[test]
fn test_stream_matches_buffered() {
    let text = "1f   2a FF \n\n00 01 x\n02  03 y";
    for norm in [Normalization::legacy(), Normalization::Collapse] {
        let (expected, expected_report) = transcode_str_with_report(text, &norm).unwrap();
        let mut out = Vec::new();
        let report = transcode_reader(text.as_bytes(), &mut out, &norm).unwrap();
        assert_eq!(out, expected);
        assert_eq!(report, expected_report);
    }
}

#[test]
fn test_stream_line_count_with_final_newline() {
    let mut out = Vec::new();
    let report = transcode_reader("01 \n".as_bytes(), &mut out, &Normalization::Collapse).unwrap();
    assert_eq!(report, TranscodeReport { lines: 2, bytes: 1, annotations: 0 });

    let report = transcode_reader("".as_bytes(), &mut Vec::new(), &Normalization::Collapse).unwrap();
    assert_eq!(report.lines, 1);
}

#[test]
fn test_stream_invalid_utf8() {
    let data: &[u8] = b"01 \n\xff\xfe \n";
    let err = transcode_reader(data, &mut Vec::new(), &Normalization::Collapse).unwrap_err();
    assert!(matches!(err, TranscodeError::InvalidUtf8 { line: 2 }));
}
