use anyhow::{Context, Result};
use rand::Rng;
use rand::rngs::StdRng;
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use crate::cli::SourceKind;
use crate::config::RunConfig;
use crate::http::Fetch;
use crate::model::{Normalized, Reject, WorkRecord};
use crate::normalize::{YearPolicy, first_float, first_match_trimmed, int_field, non_empty_str};
use crate::sources::{ScalarSpec, SourceAdapter, TableSpec};

const OBJECT_URL: &str = "https://api.harvardartmuseums.org/object";

const MAX_PAGE: u64 = 100;

static TABLE: TableSpec = TableSpec {
    work_table: "Harvard",
    dimensions: &[],
    scalars: &[ScalarSpec {
        column: "height_cm",
        decl: "REAL",
    }],
};

pub struct HarvardAdapter {
    title_pattern: Regex,
    height_pattern: Regex,
}

impl HarvardAdapter {
    pub fn new() -> Result<Self> {
        let title_pattern =
            Regex::new(r"[^(]+").context("failed to compile harvard title pattern")?;
        // First numeric token of the free-text dimensions string; the API
        // lists height first.
        let height_pattern =
            Regex::new(r"\d+[.]?\d+").context("failed to compile harvard height pattern")?;

        Ok(Self {
            title_pattern,
            height_pattern,
        })
    }
}

impl SourceAdapter for HarvardAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Harvard
    }

    fn table_spec(&self) -> &'static TableSpec {
        &TABLE
    }

    fn year_policy(&self) -> YearPolicy {
        YearPolicy {
            floor: 1800,
            ceiling: None,
            reject_missing: true,
        }
    }

    fn default_page_size(&self) -> usize {
        25
    }

    fn fetch_page(
        &self,
        fetch: &dyn Fetch,
        rng: &mut StdRng,
        config: &RunConfig,
    ) -> Result<Vec<Value>> {
        let api_key = config
            .api_key
            .as_deref()
            .context("harvard requires an api key (--api-key or MUSEDB_API_KEY)")?;
        let size = config.page_size.unwrap_or_else(|| self.default_page_size());
        let page = rng.gen_range(0..=MAX_PAGE);

        let body = fetch.get_json(
            OBJECT_URL,
            &[
                ("apikey", api_key.to_string()),
                ("size", size.to_string()),
                ("classification", "Paintings".to_string()),
                ("page", page.to_string()),
            ],
        )?;

        let records = body
            .get("records")
            .and_then(Value::as_array)
            .context("object response has no records list")?;

        Ok(records.clone())
    }

    fn normalize(&self, raw: &Value) -> Normalized {
        let title = match non_empty_str(raw, "title") {
            Some(raw_title) => match first_match_trimmed(&self.title_pattern, raw_title) {
                Some(title) => Some(title),
                None => return Normalized::Reject(Reject::MalformedField { field: "title" }),
            },
            None => None,
        };

        let creation_year = int_field(raw, "dateend");

        let height_cm = non_empty_str(raw, "dimensions")
            .and_then(|text| first_float(&self.height_pattern, text));
        let height = match height_cm {
            Some(height) => SqlValue::Real(height),
            None => SqlValue::Null,
        };

        Normalized::Record(WorkRecord {
            title,
            creation_year,
            dimensions: Vec::new(),
            scalars: vec![("height_cm", height)],
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn normalize(raw: Value) -> Normalized {
        HarvardAdapter::new().unwrap().normalize(&raw)
    }

    #[test]
    fn normalize_extracts_title_year_and_height() {
        let raw = json!({
            "title": "Sunrise (study, 1872)",
            "dateend": 1872,
            "dimensions": "image: 48.2 x 63.1 cm (19 x 24 13/16 in.)",
        });

        let Normalized::Record(record) = normalize(raw) else {
            panic!("expected a record");
        };
        assert_eq!(record.title.as_deref(), Some("Sunrise"));
        assert_eq!(record.creation_year, Some(1872));
        assert_eq!(record.scalars[0], ("height_cm", SqlValue::Real(48.2)));
    }

    #[test]
    fn unparsable_height_is_null_not_a_reject() {
        let raw = json!({"title": "Portrait", "dateend": 1850, "dimensions": "unframed"});

        let Normalized::Record(record) = normalize(raw) else {
            panic!("expected a record");
        };
        assert_eq!(record.scalars[0], ("height_cm", SqlValue::Null));
    }

    #[test]
    fn missing_year_is_rejected_by_policy() {
        assert_eq!(
            HarvardAdapter::new().unwrap().year_policy().check(None),
            Err(Reject::MissingYear)
        );
    }
}
