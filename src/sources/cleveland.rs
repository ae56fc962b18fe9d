use anyhow::{Context, Result};
use rand::Rng;
use rand::rngs::StdRng;
use regex::Regex;
use serde_json::Value;

use crate::cli::SourceKind;
use crate::config::RunConfig;
use crate::http::Fetch;
use crate::model::{DimensionKind, Normalized, Reject, WorkRecord};
use crate::normalize::{YearPolicy, first_match_trimmed, int_field, non_empty_str};
use crate::sources::{DimensionSpec, SourceAdapter, TableSpec};

const ARTWORKS_URL: &str = "https://openaccess-api.clevelandart.org/api/artworks";

/// Known catalog size for post-1800 paintings; the random skip stays inside
/// it so a page is never empty.
const CATALOG_SPAN: i64 = 823;

static TABLE: TableSpec = TableSpec {
    work_table: "Cleveland",
    dimensions: &[
        DimensionSpec {
            kind: DimensionKind::Artist,
            table: "Cleveland_Artists",
            name_column: "artist",
            fk_column: "artist_id",
        },
        DimensionSpec {
            kind: DimensionKind::Department,
            table: "Cleveland_Departments",
            name_column: "department",
            fk_column: "department_id",
        },
    ],
    scalars: &[],
};

pub struct ClevelandAdapter {
    title_pattern: Regex,
    creator_pattern: Regex,
}

impl ClevelandAdapter {
    pub fn new() -> Result<Self> {
        // Title keeps everything up to a trailing parenthetical; creator
        // descriptions carry nationality/date qualifiers after the name.
        let title_pattern = Regex::new(r#"[,\.\w\d\s'"-]+"#)
            .context("failed to compile cleveland title pattern")?;
        let creator_pattern =
            Regex::new(r"[\.\w\s-]+").context("failed to compile cleveland creator pattern")?;

        Ok(Self {
            title_pattern,
            creator_pattern,
        })
    }
}

impl SourceAdapter for ClevelandAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Cleveland
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
        25
    }

    fn fetch_page(
        &self,
        fetch: &dyn Fetch,
        rng: &mut StdRng,
        config: &RunConfig,
    ) -> Result<Vec<Value>> {
        let limit = config.page_size.unwrap_or_else(|| self.default_page_size());
        let span = (CATALOG_SPAN - limit as i64).max(0) as u64;
        let skip = rng.gen_range(0..=span);

        let body = fetch.get_json(
            ARTWORKS_URL,
            &[
                ("type", "Painting".to_string()),
                ("created_after", "1800".to_string()),
                ("limit", limit.to_string()),
                ("skip", skip.to_string()),
            ],
        )?;

        let records = body
            .get("data")
            .and_then(Value::as_array)
            .context("artworks response has no data list")?;

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

        let creation_year = int_field(raw, "creation_date_latest");

        let mut dimensions = Vec::new();
        let first_creator = raw
            .get("creators")
            .and_then(Value::as_array)
            .and_then(|creators| creators.first());
        if let Some(creator) = first_creator {
            let description = creator.get("description").and_then(Value::as_str);
            match description.and_then(|text| first_match_trimmed(&self.creator_pattern, text)) {
                Some(name) => dimensions.push((DimensionKind::Artist, name)),
                None => return Normalized::Reject(Reject::MalformedField { field: "creators" }),
            }
        }

        if let Some(department) = non_empty_str(raw, "department") {
            dimensions.push((DimensionKind::Department, department.trim().to_string()));
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
        ClevelandAdapter::new().unwrap().normalize(&raw)
    }

    #[test]
    fn normalize_strips_parenthetical_and_creator_qualifier() {
        let raw = json!({
            "title": "Water Lilies (Agapanthus)",
            "creation_date_latest": 1926,
            "creators": [{"description": "Claude Monet (French, 1840-1926)"}],
            "department": "Modern European Painting and Sculpture",
        });

        let Normalized::Record(record) = normalize(raw) else {
            panic!("expected a record");
        };
        assert_eq!(record.title.as_deref(), Some("Water Lilies"));
        assert_eq!(record.creation_year, Some(1926));
        assert_eq!(
            record.dimension_name(DimensionKind::Artist),
            Some("Claude Monet")
        );
        assert_eq!(
            record.dimension_name(DimensionKind::Department),
            Some("Modern European Painting and Sculpture")
        );
    }

    #[test]
    fn normalize_allows_missing_creator_and_department() {
        let raw = json!({"title": "Untitled Landscape", "creation_date_latest": 1890, "creators": []});

        let Normalized::Record(record) = normalize(raw) else {
            panic!("expected a record");
        };
        assert!(record.dimensions.is_empty());
    }

    #[test]
    fn unextractable_title_is_a_reject_not_a_fault() {
        let raw = json!({"title": "(((", "creation_date_latest": 1900});

        let Normalized::Reject(reject) = normalize(raw) else {
            panic!("expected a reject");
        };
        assert_eq!(reject, Reject::MalformedField { field: "title" });
    }

    #[test]
    fn creator_without_description_is_a_reject() {
        let raw = json!({
            "title": "Portrait",
            "creation_date_latest": 1900,
            "creators": [{"role": "artist"}],
        });

        let Normalized::Reject(reject) = normalize(raw) else {
            panic!("expected a reject");
        };
        assert_eq!(reject, Reject::MalformedField { field: "creators" });
    }
}
