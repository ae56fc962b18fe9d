use std::path::PathBuf;

use crate::cli::HarvestArgs;

/// Everything one harvest run needs, captured up front so the pipeline has
/// no ambient state (no module-level db path, no implicit RNG seed).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub db_path: PathBuf,
    pub cache_root: PathBuf,
    pub page_size: Option<usize>,
    pub quota: usize,
    pub min_year: i64,
    pub max_year: Option<i64>,
    pub seed: Option<u64>,
    pub skip_untitled: bool,
    pub api_key: Option<String>,
}

impl RunConfig {
    pub fn from_args(args: &HarvestArgs) -> Self {
        Self {
            db_path: args.db_path.clone(),
            cache_root: args.cache_root.clone(),
            page_size: args.page_size,
            quota: args.quota,
            min_year: args.min_year,
            max_year: args.max_year,
            seed: args.seed,
            skip_untitled: args.skip_untitled,
            api_key: args.api_key.clone(),
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            db_path: PathBuf::from(":memory:"),
            cache_root: PathBuf::from(".cache/musedb"),
            page_size: None,
            quota: 25,
            min_year: 1800,
            max_year: None,
            seed: Some(7),
            skip_untitled: false,
            api_key: None,
        }
    }
}
