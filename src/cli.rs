use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "musedb",
    version,
    about = "Museum and library catalog harvesting into a shared sqlite store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Harvest(HarvestArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SourceKind {
    Books,
    Cleveland,
    Harvard,
    Met,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Cleveland => "cleveland",
            Self::Harvard => "harvard",
            Self::Met => "met",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct HarvestArgs {
    /// Catalog to pull one page from.
    #[arg(long, value_enum)]
    pub source: SourceKind,

    #[arg(long, default_value = ".cache/musedb")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = "Museums.db")]
    pub db_path: PathBuf,

    /// Records requested per page; defaults to the source's per-call cap.
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Newly accepted rows per run before the batch stops early.
    #[arg(long, default_value_t = 25)]
    pub quota: usize,

    #[arg(long, default_value_t = 1800)]
    pub min_year: i64,

    /// Inclusive ceiling; defaults to the source's own bound where it has one.
    #[arg(long)]
    pub max_year: Option<i64>,

    /// Seed for the page-offset RNG; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Reject records with no title instead of storing a NULL-titled row.
    #[arg(long, default_value_t = false)]
    pub skip_untitled: bool,

    /// API key for sources that require one (harvard).
    #[arg(long, env = "MUSEDB_API_KEY")]
    pub api_key: Option<String>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/musedb")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = "Museums.db")]
    pub db_path: PathBuf,
}
