use clap::Parser;
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable detailed debug logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Query FOFA and Quake for every target in a CSV or text file
    Scan {
        /// Input file; the first column holds IPs, ranges, C-segments or domains
        input: PathBuf,

        /// Output directory
        #[arg(short = 'o', long, default_value = "./results")]
        out: PathBuf,

        /// Worker pool size (default: max(CPU count, 4))
        #[arg(short = 'w', long)]
        workers: Option<usize>,

        /// Minimum seconds between two calls to the same API
        #[arg(long)]
        delay: Option<f64>,

        /// Retries per query after the first attempt
        #[arg(short = 'r', long)]
        retries: Option<u32>,

        /// Seconds to wait between attempts
        #[arg(long)]
        retry_delay: Option<f64>,

        /// Failed attempts after which an API is disabled for the run
        #[arg(long)]
        max_failures: Option<u32>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Results requested per query
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Classify targets and write the classification report only
    Classify {
        /// Input file; the first column holds IPs, ranges, C-segments or domains
        input: PathBuf,

        /// Output directory
        #[arg(short = 'o', long, default_value = "./results")]
        out: PathBuf,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
