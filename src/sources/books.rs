use anyhow::{Context, Result};
use rand::Rng;
use rand::rngs::StdRng;
use serde_json::Value;

use crate::cli::SourceKind;
use crate::config::RunConfig;
use crate::http::Fetch;
use crate::model::{DimensionKind, Normalized, WorkRecord};
use crate::normalize::{YearPolicy, int_field, non_empty_str};
use crate::sources::{DimensionSpec, SourceAdapter, TableSpec};

/// Open Library subject listing, pre-filtered to fiction published in the
/// admissible window.
const SUBJECT_URL: &str = "https://openlibrary.org/subjects/fiction.json?published_in=1800-2024";

const MAX_OFFSET: u64 = 1000;

static TABLE: TableSpec = TableSpec {
    work_table: "Open_Library",
    dimensions: &[DimensionSpec {
        kind: DimensionKind::Author,
        table: "Open_Library_Authors",
        name_column: "author",
        fk_column: "author_id",
    }],
    scalars: &[],
};

pub struct BooksAdapter;

impl BooksAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SourceAdapter for BooksAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Books
    }

    fn table_spec(&self) -> &'static TableSpec {
        &TABLE
    }

    fn year_policy(&self) -> YearPolicy {
        YearPolicy {
            floor: 1800,
            ceiling: None,
            reject_missing: false,
        }
    }

    fn default_page_size(&self) -> usize {
        100
    }

    fn fetch_page(
        &self,
        fetch: &dyn Fetch,
        rng: &mut StdRng,
        config: &RunConfig,
    ) -> Result<Vec<Value>> {
        let limit = config.page_size.unwrap_or_else(|| self.default_page_size());
        let offset = rng.gen_range(0..=MAX_OFFSET);

        let body = fetch.get_json(
            SUBJECT_URL,
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )?;

        let works = body
            .get("works")
            .and_then(Value::as_array)
            .context("subject response has no works list")?;

        Ok(works.clone())
    }

    fn normalize(&self, raw: &Value) -> Normalized {
        let title = non_empty_str(raw, "title").map(|title| title.trim().to_string());
        let creation_year = int_field(raw, "first_publish_year");

        let mut dimensions = Vec::new();
        let author = raw
            .get("authors")
            .and_then(Value::as_array)
            .and_then(|authors| authors.first())
            .and_then(|author| author.get("name"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty());
        if let Some(name) = author {
            dimensions.push((DimensionKind::Author, name.to_string()));
        }

        Normalized::Record(WorkRecord {
            title,
            creation_year,
            dimensions,
            scalars: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn normalize(raw: Value) -> Normalized {
        BooksAdapter::new().normalize(&raw)
    }

    #[test]
    fn normalize_takes_title_year_and_first_author() {
        let raw = json!({
            "title": "  Pride and Prejudice ",
            "first_publish_year": 1813,
            "authors": [{"name": "Jane Austen"}, {"name": "Someone Else"}],
        });

        let Normalized::Record(record) = normalize(raw) else {
            panic!("expected a record");
        };
        assert_eq!(record.title.as_deref(), Some("Pride and Prejudice"));
        assert_eq!(record.creation_year, Some(1813));
        assert_eq!(record.dimension_name(DimensionKind::Author), Some("Jane Austen"));
    }

    #[test]
    fn normalize_allows_missing_year_and_author() {
        let raw = json!({"title": "Anonymous Work", "authors": []});

        let Normalized::Record(record) = normalize(raw) else {
            panic!("expected a record");
        };
        assert_eq!(record.creation_year, None);
        assert!(record.dimensions.is_empty());
    }

    #[test]
    fn missing_year_is_not_rejected_by_policy() {
        assert_eq!(BooksAdapter::new().year_policy().check(None), Ok(()));
    }
}
