use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use hexbin::dump::DEFAULT_BYTES_PER_LINE;
use hexbin::normalize::LEGACY_PASSES;
use hexbin::{dump_file, transcode_file, Config, DumpOptions, Normalization};

#[derive(Parser, Debug)]
#[command(name = "hexbin", version, about = "Turn hex dumps into binary files and back")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a hex dump into a binary file
    Convert(ConvertArgs),
    /// Write a binary file out as a hex dump
    Dump(DumpArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum NormalizationMode {
    /// Six pairwise space-squeezing passes, as older dumps expect
    Legacy,
    /// Collapse every run of spaces and tabs to one space
    Collapse,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Dump to read [default: raw_nbt.txt]
    #[arg(long)]
    input: Option<PathBuf>,

    /// Binary file to write, replaced on success [default: binary]
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON file with defaults for every other flag
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    normalization: Option<NormalizationMode>,

    /// Pass count for legacy normalization (implies --normalization legacy)
    #[arg(long)]
    passes: Option<u32>,

    /// Decode line by line instead of loading the whole dump
    #[arg(long)]
    stream: bool,

    /// Print a JSON summary of the run on stdout
    #[arg(long)]
    report: bool,
}

impl ConvertArgs {
    fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        match (self.normalization, self.passes) {
            (Some(NormalizationMode::Collapse), Some(_)) => {
                bail!("--passes only applies to --normalization legacy")
            }
            (Some(NormalizationMode::Collapse), None) => config.normalization = Normalization::Collapse,
            (Some(NormalizationMode::Legacy), passes) | (None, passes @ Some(_)) => {
                config.normalization = Normalization::Legacy {
                    passes: passes.unwrap_or(LEGACY_PASSES),
                }
            }
            (None, None) => {}
        }
        config.streaming |= self.stream;
        Ok(config)
    }
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Binary file to read
    #[arg(long, default_value = "binary")]
    input: PathBuf,

    /// Dump file to write
    #[arg(long, default_value = "raw_nbt.txt")]
    output: PathBuf,

    /// Bytes per dump line
    #[arg(long, default_value_t = DEFAULT_BYTES_PER_LINE)]
    per_line: usize,

    /// Uppercase hex digits
    #[arg(long)]
    upper: bool,
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert(args) => {
            let config = args.to_config()?;
            let report = transcode_file(&config)
                .with_context(|| format!("converting {}", config.input.display()))?;
            if args.report {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Commands::Dump(args) => {
            let opts = DumpOptions {
                per_line: args.per_line,
                upper: args.upper,
            };
            dump_file(&args.input, &args.output, &opts)
                .with_context(|| format!("dumping {}", args.input.display()))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hexbin=info")),
        )
        .init();

    run(Cli::parse())
}
