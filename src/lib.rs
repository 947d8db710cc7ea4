//! Convert whitespace-separated hex dumps into raw binary files.
//!
//! Each dump line holds hex byte tokens separated by spaces and ends with one
//! marker token that is never data (usually the empty token after a trailing
//! space). [`transcode_file`] turns such a dump into the bytes it describes;
//! [`dump_bytes`] writes bytes back out in the same layout.

pub mod config;
pub mod dump;
pub mod error;
pub mod normalize;
mod output;
pub mod transcode;
pub mod utils;

pub use config::Config;
pub use dump::{dump_bytes, dump_file, DumpOptions};
pub use error::{Result, TokenError, TranscodeError};
pub use normalize::{collapse_spaces, collapse_spaces_fixed, Normalization};
pub use transcode::{
    parse_line, transcode_file, transcode_reader, transcode_str, transcode_str_with_report,
    TranscodeReport,
};
