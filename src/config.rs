use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TranscodeError};
use crate::normalize::Normalization;

pub const DEFAULT_INPUT: &str = "raw_nbt.txt";
pub const DEFAULT_OUTPUT: &str = "binary";

fn default_input() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT)
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

/// Settings for one `convert` run. Every field is optional in the JSON form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    pub normalization: Normalization,
    /// Read and decode one line at a time instead of buffering the whole dump.
    pub streaming: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: default_input(),
            output: default_output(),
            normalization: Normalization::default(),
            streaming: false,
        }
    }
}

impl Config {
    pub fn from_json_str(path: &Path, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| TranscodeError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .map_err(|source| TranscodeError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json_str(path, &json)
    }
}

#[test]
fn test_config_defaults() {
    let cfg = Config::from_json_str(Path::new("cfg.json"), "{}").unwrap();
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.input, PathBuf::from("raw_nbt.txt"));
    assert_eq!(cfg.output, PathBuf::from("binary"));
    assert_eq!(cfg.normalization, Normalization::Collapse);
    assert!(!cfg.streaming);
}

#[test]
fn test_config_overrides() {
    let json = r#"{
        "input": "dumps/level.txt",
        "output": "level.dat",
        "normalization": { "mode": "legacy" },
        "streaming": true
    }"#;
    let cfg = Config::from_json_str(Path::new("cfg.json"), json).unwrap();
    assert_eq!(cfg.input, PathBuf::from("dumps/level.txt"));
    assert_eq!(cfg.output, PathBuf::from("level.dat"));
    assert_eq!(cfg.normalization, Normalization::legacy());
    assert!(cfg.streaming);
}

#[test]
fn test_config_rejects_unknown_keys() {
    let err = Config::from_json_str(Path::new("cfg.json"), r#"{"inptu": "x"}"#).unwrap_err();
    assert!(matches!(err, TranscodeError::Config { .. }));
}

#[test]
fn test_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hexbin.json");
    fs::write(&path, r#"{"streaming": true}"#).unwrap();
    let cfg = Config::from_json_file(&path).unwrap();
    assert!(cfg.streaming);

    let err = Config::from_json_file(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, TranscodeError::ConfigRead { .. }));
    assert!(err.to_string().starts_with("cannot read config file "));
}
