use std::path::PathBuf;

use thiserror::Error;

/// Why a single hex token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("not a base-16 numeral")]
    Malformed,
    #[error("value does not fit in one byte")]
    Overflow,
}

/// Everything that can abort a transcoding run.
///
/// Line and column numbers are 1-based; the column counts tokens, not
/// characters.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("input file {} not found", path.display())]
    InputNotFound { path: PathBuf },

    #[error("failed to read input {}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input line {line} is not valid UTF-8")]
    InvalidUtf8 { line: usize },

    #[error("line {line}, token {column}: {token:?} is not a hex byte")]
    MalformedToken {
        line: usize,
        column: usize,
        token: String,
    },

    #[error("line {line}, token {column}: {token:?} does not fit in one byte")]
    ByteOverflow {
        line: usize,
        column: usize,
        token: String,
    },

    #[error("cannot write output {}", path.display())]
    OutputNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read config file {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TranscodeError {
    pub(crate) fn from_token(err: TokenError, line: usize, column: usize, token: &str) -> Self {
        let token = token.to_string();
        match err {
            TokenError::Malformed => TranscodeError::MalformedToken { line, column, token },
            TokenError::Overflow => TranscodeError::ByteOverflow { line, column, token },
        }
    }

    /// Map an open/read failure on the input, splitting out the not-found case.
    pub(crate) fn read_input(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            TranscodeError::InputNotFound { path }
        } else {
            TranscodeError::ReadInput { path, source }
        }
    }
}

pub type Result<T> = std::result::Result<T, TranscodeError>;

#[test]
fn test_token_error_mapping() {
    let err = TranscodeError::from_token(TokenError::Overflow, 3, 2, "1ff");
    assert!(matches!(err, TranscodeError::ByteOverflow { line: 3, column: 2, .. }));
    assert_eq!(err.to_string(), "line 3, token 2: \"1ff\" does not fit in one byte");

    let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
    let err = TranscodeError::read_input(PathBuf::from("raw_nbt.txt"), missing);
    assert_eq!(err.to_string(), "input file raw_nbt.txt not found");
}
