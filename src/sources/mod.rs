pub mod books;
pub mod cleveland;
pub mod harvard;
pub mod met;

use anyhow::Result;
use rand::rngs::StdRng;
use serde_json::Value;

use crate::cli::SourceKind;
use crate::config::RunConfig;
use crate::http::Fetch;
use crate::model::{DimensionKind, Normalized};
use crate::normalize::YearPolicy;

/// One dimension table hanging off a work table: where the names live and
/// which work-table column carries the foreign key.
#[derive(Debug)]
pub struct DimensionSpec {
    pub kind: DimensionKind,
    pub table: &'static str,
    pub name_column: &'static str,
    pub fk_column: &'static str,
}

/// A source-specific scalar column on the work table (parsed from free text,
/// nullable).
#[derive(Debug)]
pub struct ScalarSpec {
    pub column: &'static str,
    pub decl: &'static str,
}

/// Column layout for one source. The shared columns (`id_key`, unique
/// `title`, `creation_year`) are implied; everything else is listed here.
#[derive(Debug)]
pub struct TableSpec {
    pub work_table: &'static str,
    pub dimensions: &'static [DimensionSpec],
    pub scalars: &'static [ScalarSpec],
}

/// One external catalog: its query parameters, response shape, and
/// normalization rules. The pipeline in `commands::harvest` drives any
/// implementation the same way.
pub trait SourceAdapter {
    fn kind(&self) -> SourceKind;

    fn table_spec(&self) -> &'static TableSpec;

    fn year_policy(&self) -> YearPolicy;

    /// The source's per-call page cap, used when the config does not
    /// override it.
    fn default_page_size(&self) -> usize;

    /// Pull one page of raw records. A non-success response is fatal to the
    /// run; the adapter never retries and never partially returns.
    fn fetch_page(
        &self,
        fetch: &dyn Fetch,
        rng: &mut StdRng,
        config: &RunConfig,
    ) -> Result<Vec<Value>>;

    /// Per-candidate follow-up fetch for sources whose page holds opaque
    /// identifiers. Identity for sources whose records arrive complete.
    /// `None` drops that single candidate without aborting the batch.
    fn hydrate(&self, _fetch: &dyn Fetch, raw: Value) -> Option<Value> {
        Some(raw)
    }

    fn normalize(&self, raw: &Value) -> Normalized;
}

pub fn adapter_for(kind: SourceKind) -> Result<Box<dyn SourceAdapter>> {
    Ok(match kind {
        SourceKind::Books => Box::new(books::BooksAdapter::new()),
        SourceKind::Cleveland => Box::new(cleveland::ClevelandAdapter::new()?),
        SourceKind::Harvard => Box::new(harvard::HarvardAdapter::new()?),
        SourceKind::Met => Box::new(met::MetAdapter::new()?),
    })
}
