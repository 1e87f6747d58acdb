use clap::Parser;
use std::path::PathBuf;

/// Resolve organization names to coordinates through a text-search geocoding API
///
/// Every option can also be given through the environment (or a `.env` file
/// in the working directory).
#[derive(Parser, Debug)]
#[command(name = "geolocate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolves organization names to coordinates with caching and rate limiting", long_about = None)]
pub struct Args {
    /// Input file: CSV with a name column, or plain text with one name per line
    #[arg(value_name = "INPUT", env = "FILE_PATH")]
    pub input: PathBuf,

    /// API key sent with every request
    #[arg(long = "api-key", env = "GEOCODING_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Text-search endpoint URL
    #[arg(long = "url", env = "URL")]
    pub url: String,

    /// JSON file holding previously resolved coordinates
    #[arg(long = "cache-path", env = "CACHE_PATH")]
    pub cache_path: PathBuf,

    /// Maximum requests started per second
    #[arg(long = "qps", env = "QPS", default_value_t = 30)]
    pub qps: usize,

    /// Maximum requests in flight at once (defaults to the QPS value)
    #[arg(long = "max-in-flight", env = "MAX_IN_FLIGHT")]
    pub max_in_flight: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", env = "TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// CSV column holding the names
    #[arg(long = "column", env = "NAME_COLUMN", default_value = "University Name")]
    pub column: String,

    /// Where to write the resolved coordinates (CSV)
    #[arg(short = 'o', long = "output", env = "OUTPUT_PATH", default_value = "outputs/coordinates.csv")]
    pub output: PathBuf,

    /// Also write the full name -> coordinate mapping (null when unresolved) as JSON
    #[arg(long = "json")]
    pub json: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.unwrap_or(self.qps)
    }
}

/// Parses command-line arguments
pub fn parse_args() -> Args {
    Args::parse()
}
