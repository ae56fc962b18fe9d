use anyhow::{Context, Result};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rusqlite::Connection;
use tracing::info;

use crate::cli::HarvestArgs;
use super::store;
use crate::config::RunConfig;
use crate::http::{Fetch, HttpFetcher};
use crate::model::{HarvestCounts, HarvestRunManifest, InsertOutcome, Normalized, Reject};
use crate::normalize::YearPolicy;
use crate::sources::{self, SourceAdapter};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: HarvestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("harvest-{}", utc_compact_string(started_ts));

    let config = RunConfig::from_args(&args);
    let adapter = sources::adapter_for(args.source)?;

    let manifest_dir = config.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("harvest_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(
        source = args.source.as_str(),
        run_id = %run_id,
        db = %config.db_path.display(),
        "starting harvest"
    );

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let fetcher = HttpFetcher::new()?;

    let mut connection = Connection::open(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    store::configure_connection(&connection)?;

    let counts = harvest_into(&mut connection, adapter.as_ref(), &fetcher, &config, &mut rng)?;

    let policy = effective_year_policy(adapter.as_ref(), &config);
    let manifest = HarvestRunManifest {
        manifest_version: 1,
        run_id,
        source: args.source.as_str().to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        db_path: config.db_path.display().to_string(),
        page_size: config
            .page_size
            .unwrap_or_else(|| adapter.default_page_size()),
        quota: config.quota,
        year_floor: policy.floor,
        year_ceiling: policy.ceiling,
        counts: counts.clone(),
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote harvest run manifest");

    info!(
        accepted = counts.accepted,
        ignored = counts.ignored_duplicates,
        rejected = counts.rejected_total(),
        works_before = counts.works_before,
        works_after = counts.works_after,
        "harvest completed"
    );

    Ok(())
}

/// One batch: ensure schema, fetch one page, then normalize/resolve/insert
/// record by record until the page ends or the accepted tally hits the
/// quota. All writes land in a single transaction committed at the end; a
/// fetch failure therefore leaves the store untouched.
pub(super) fn harvest_into(
    connection: &mut Connection,
    adapter: &dyn SourceAdapter,
    fetch: &dyn Fetch,
    config: &RunConfig,
    rng: &mut StdRng,
) -> Result<HarvestCounts> {
    let spec = adapter.table_spec();
    store::ensure_schema(connection, spec)?;

    let mut counts = HarvestCounts::default();
    counts.works_before = store::count_works(connection, spec)?;
    info!(
        table = spec.work_table,
        count = counts.works_before,
        "current work count"
    );

    let raw_records = adapter
        .fetch_page(fetch, rng, config)
        .with_context(|| format!("failed to fetch a page from {}", adapter.kind().as_str()))?;
    counts.fetched = raw_records.len();
    info!(fetched = counts.fetched, "fetched one page");

    let policy = effective_year_policy(adapter, config);

    let tx = connection.transaction()?;
    for raw in raw_records {
        if counts.accepted >= config.quota {
            break;
        }
        counts.examined += 1;

        let Some(raw) = adapter.hydrate(fetch, raw) else {
            counts.hydration_failures += 1;
            continue;
        };

        let record = match adapter.normalize(&raw) {
            Normalized::Record(record) => record,
            Normalized::Reject(reject) => {
                counts.tally_reject(&reject);
                info!(reason = %reject, "skipped record");
                continue;
            }
        };

        if let Err(reject) = policy.check(record.creation_year) {
            counts.tally_reject(&reject);
            info!(reason = %reject, "skipped record");
            continue;
        }

        if record.title.is_none() && config.skip_untitled {
            let reject = Reject::Untitled;
            counts.tally_reject(&reject);
            info!(reason = %reject, "skipped record");
            continue;
        }

        let mut fk_ids = Vec::with_capacity(spec.dimensions.len());
        for dimension in spec.dimensions {
            let fk_id = match record.dimension_name(dimension.kind) {
                Some(name) => Some(store::resolve_dimension(&tx, dimension, name)?),
                None => None,
            };
            fk_ids.push(fk_id);
        }

        match store::insert_work(&tx, spec, &record, &fk_ids)? {
            InsertOutcome::Accepted(id) => {
                counts.accepted += 1;
                info!(
                    id,
                    title = record.title.as_deref().unwrap_or("<untitled>"),
                    "added work"
                );
            }
            InsertOutcome::Ignored => {
                counts.ignored_duplicates += 1;
                info!(
                    title = record.title.as_deref().unwrap_or("<untitled>"),
                    "title already in database"
                );
            }
        }
    }
    tx.commit()?;

    counts.works_after = store::count_works(connection, spec)?;
    info!(
        table = spec.work_table,
        count = counts.works_after,
        "work count after run"
    );

    Ok(counts)
}

/// The adapter declares the source's own bounds; the config may tighten or
/// override them for a run.
pub(super) fn effective_year_policy(adapter: &dyn SourceAdapter, config: &RunConfig) -> YearPolicy {
    let base = adapter.year_policy();
    YearPolicy {
        floor: config.min_year,
        ceiling: config.max_year.or(base.ceiling),
        reject_missing: base.reject_missing,
    }
}
