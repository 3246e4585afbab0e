mod convert;
mod inspect;

use std::io::stderr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a DAQ sample log to a GPS timestamped CSV file.
    ///
    /// The first packet of the VectorNav binary output log provides the GPS time of
    /// the first sample. Following samples are stamped using the sample rate from
    /// the config file. Timestamps are nanoseconds since the GPS epoch.
    Convert {
        /// DAQ sample log of little-endian f64 values interleaved by channel
        daq: PathBuf,

        /// VectorNav binary output log
        vectornav: PathBuf,

        /// YAML config file providing daq.rate and daq.chan_num
        config: PathBuf,

        /// Output file path. Defaults to the DAQ path with its 3 character extension
        /// replaced by CSV.
        #[arg(short, long, value_name = "path")]
        output: Option<PathBuf>,

        /// Overwrite output file if it already exists
        #[arg(long, action)]
        clobber: bool,
    },
    /// Show the first packet of a VectorNav binary output log
    Inspect {
        /// VectorNav binary output log
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: inspect::Format,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("DAQSTAMP_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Convert {
            daq,
            vectornav,
            config,
            output,
            clobber,
        } => convert::convert(daq, vectornav, config, output.as_deref(), *clobber),
        Commands::Inspect { input, format } => inspect::inspect(input, format),
    }
}
