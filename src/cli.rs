//! Command-line interface definitions.
//!
//! Numeric settings are parsed as signed integers so that out-of-range values
//! reach `ScanConfig` validation and fail with its error messages rather than
//! clap's.

use crate::core::config::{TestFailurePolicy, DEFAULT_SEPARATOR};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Probe lists of hostnames over HTTP and classify what answers.
#[derive(Parser, Debug)]
#[command(name = "site-scanner")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Turn a hosts file into a target list:\n",
    "    $ site-scanner prepare hosts.txt\n\n",
    "  Scan it with 20 threads and a 10 second timeout:\n",
    "    $ site-scanner scan -f hosts-prepared.txt -d 20 -t 10\n\n",
    "Results go to <input-stem>-sites-analysed.txt next to each input.",
))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scan one or more target lists.
    Scan(ScanArgs),

    /// Convert hosts files into target lists (`<stem>-prepared<ext>`).
    Prepare(PrepareArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    /// Input files, one hostname per line.
    #[arg(short, long = "files", value_name = "FILE", num_args = 1.., required = true)]
    pub files: Vec<PathBuf>,

    /// Total threads: one result writer plus N-1 workers [default: 50].
    #[arg(short = 'd', long, value_name = "N", allow_negative_numbers = true)]
    pub threads: Option<i64>,

    /// Attempts per target when requests time out [default: 3].
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    pub retries: Option<i64>,

    /// Request timeout in seconds [default: 5].
    #[arg(short, long, value_name = "SECS", allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// Field separator for result lines.
    #[arg(short, long, value_name = "CHAR", default_value_t = DEFAULT_SEPARATOR)]
    pub separator: char,

    /// How a malfunctioning test function is treated (pass or inaccessible).
    #[arg(long, value_name = "POLICY", default_value_t = TestFailurePolicy::Pass)]
    pub on_test_error: TestFailurePolicy,

    /// Flush the output file after every result line.
    #[arg(long)]
    pub flush: bool,

    /// User-Agent sent with every request.
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct PrepareArgs {
    /// Hosts files to convert.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
