use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use tracing::warn;

use crate::cli::SourceKind;
use crate::config::RunConfig;
use crate::http::Fetch;
use crate::model::{Normalized, Reject, WorkRecord};
use crate::normalize::{YearPolicy, first_match_trimmed, int_field, non_empty_str};
use crate::sources::{ScalarSpec, SourceAdapter, TableSpec};

const SEARCH_URL: &str = "https://collectionapi.metmuseum.org/public/collection/v1/search";
const OBJECTS_URL: &str = "https://collectionapi.metmuseum.org/public/collection/v1/objects";

/// The search endpoint matches loosely on medium; only these classifications
/// count as paintings.
const ACCEPTABLE_CLASSIFICATIONS: [&str; 3] =
    ["Paintings", "Paintings-Decorative", "Bark-Paintings"];

static TABLE: TableSpec = TableSpec {
    work_table: "Met",
    dimensions: &[],
    scalars: &[ScalarSpec {
        column: "gender_id",
        decl: "INTEGER",
    }],
};

pub struct MetAdapter {
    title_pattern: Regex,
}

impl MetAdapter {
    pub fn new() -> Result<Self> {
        let title_pattern = Regex::new(r"[^(]+").context("failed to compile met title pattern")?;

        Ok(Self { title_pattern })
    }
}

impl SourceAdapter for MetAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Met
    }

    fn table_spec(&self) -> &'static TableSpec {
        &TABLE
    }

    fn year_policy(&self) -> YearPolicy {
        YearPolicy {
            floor: 1800,
            ceiling: Some(2024),
            reject_missing: true,
        }
    }

    fn default_page_size(&self) -> usize {
        100
    }

    /// The search endpoint returns opaque object ids; a random sample of
    /// them becomes the page, and each candidate is completed by `hydrate`.
    fn fetch_page(
        &self,
        fetch: &dyn Fetch,
        rng: &mut StdRng,
        config: &RunConfig,
    ) -> Result<Vec<Value>> {
        let limit = config.page_size.unwrap_or_else(|| self.default_page_size());

        let body = fetch.get_json(
            SEARCH_URL,
            &[("medium", "Paintings".to_string()), ("q", "*".to_string())],
        )?;

        let object_ids = body
            .get("objectIDs")
            .and_then(Value::as_array)
            .context("search response has no objectIDs list")?;

        if object_ids.len() > limit {
            Ok(object_ids.choose_multiple(rng, limit).cloned().collect())
        } else {
            Ok(object_ids.iter().take(limit).cloned().collect())
        }
    }

    fn hydrate(&self, fetch: &dyn Fetch, raw: Value) -> Option<Value> {
        let Some(object_id) = raw.as_i64() else {
            warn!(candidate = %raw, "non-numeric object id; dropping candidate");
            return None;
        };

        match fetch.get_json(&format!("{OBJECTS_URL}/{object_id}"), &[]) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(object_id, error = %err, "follow-up fetch failed; dropping candidate");
                None
            }
        }
    }

    fn normalize(&self, raw: &Value) -> Normalized {
        // Classification gate comes before any other field is examined.
        let classification = raw
            .get("classification")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !ACCEPTABLE_CLASSIFICATIONS.contains(&classification) {
            return Normalized::Reject(Reject::DisallowedClassification {
                classification: classification.to_string(),
            });
        }

        let title = match non_empty_str(raw, "title") {
            Some(raw_title) => match first_match_trimmed(&self.title_pattern, raw_title) {
                Some(title) => Some(title),
                None => return Normalized::Reject(Reject::MalformedField { field: "title" }),
            },
            None => None,
        };

        let creation_year = int_field(raw, "objectEndDate");

        // The objects endpoint reports an empty artistGender for male
        // artists; only a non-empty value marks female.
        let gender_id = if non_empty_str(raw, "artistGender").is_some() {
            1
        } else {
            0
        };

        Normalized::Record(WorkRecord {
            title,
            creation_year,
            dimensions: Vec::new(),
            scalars: vec![("gender_id", SqlValue::Integer(gender_id))],
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn normalize(raw: Value) -> Normalized {
        MetAdapter::new().unwrap().normalize(&raw)
    }

    #[test]
    fn classification_gate_runs_first() {
        let raw = json!({"classification": "Ceramics", "title": "Vase", "objectEndDate": 1900});

        let Normalized::Reject(reject) = normalize(raw) else {
            panic!("expected a reject");
        };
        assert_eq!(
            reject,
            Reject::DisallowedClassification {
                classification: "Ceramics".to_string()
            }
        );
    }

    #[test]
    fn missing_classification_is_disallowed() {
        let raw = json!({"title": "Vase", "objectEndDate": 1900});

        assert!(matches!(
            normalize(raw),
            Normalized::Reject(Reject::DisallowedClassification { .. })
        ));
    }

    #[test]
    fn normalize_extracts_title_year_and_gender() {
        let raw = json!({
            "classification": "Paintings",
            "title": "The Gulf Stream (1899)",
            "objectEndDate": 1899,
            "artistGender": "",
        });

        let Normalized::Record(record) = normalize(raw) else {
            panic!("expected a record");
        };
        assert_eq!(record.title.as_deref(), Some("The Gulf Stream"));
        assert_eq!(record.creation_year, Some(1899));
        assert_eq!(record.scalars[0], ("gender_id", SqlValue::Integer(0)));
    }

    #[test]
    fn non_empty_artist_gender_maps_to_one() {
        let raw = json!({
            "classification": "Paintings",
            "title": "Self-Portrait",
            "objectEndDate": 1890,
            "artistGender": "Female",
        });

        let Normalized::Record(record) = normalize(raw) else {
            panic!("expected a record");
        };
        assert_eq!(record.scalars[0], ("gender_id", SqlValue::Integer(1)));
    }

    #[test]
    fn year_policy_carries_the_met_ceiling() {
        let policy = MetAdapter::new().unwrap().year_policy();
        assert_eq!(policy.check(Some(2024)), Ok(()));
        assert_eq!(
            policy.check(Some(2025)),
            Err(Reject::YearAboveCeiling { year: 2025 })
        );
    }
}
