//! Sample-based profiling of datastore records.
//!
//! Each field gets a semantic type inferred from its values plus summary
//! statistics. Profiling is one pass over an already bounded sample.

use std::collections::HashMap;

use datagov_il_ckan::models::{DatastoreField, Record};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Internal row identifier added by the CKAN datastore
pub const ROW_ID_FIELD: &str = "_id";

/// Substrings that mark a value as a coordinate
const COORDINATE_HINTS: &[&str] = &["lat", "latitude", "lng", "lon", "longitude", "coord"];

/// At least 4 in 5 non-null values must parse for a numeric type
const NUMERIC_SHARE: (usize, usize) = (4, 5);

/// Number of most frequent values reported for string fields
const TOP_VALUES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Number,
    Coordinate,
    String,
    Null,
    Unknown,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Number)
    }
}

/// One entry of the most-frequent-values list
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FieldStats {
    pub count: usize,
    pub null_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_count: Option<usize>,
    /// Serialized as an object of value to count, most frequent first
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_top_values"
    )]
    pub top_values: Option<Vec<ValueCount>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub stats: FieldStats,
    pub missingness: f64,
}

/// Profile report for one datastore resource
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetProfile {
    pub resource_id: String,
    pub sample_size: usize,
    pub total_fields: usize,
    pub fields: Vec<FieldProfile>,
}

/// Profile every field declared in `fields` over at most `sample_size`
/// records. The datastore row id is skipped.
pub fn profile_records(
    fields: &[DatastoreField],
    records: &[Record],
    sample_size: usize,
) -> Vec<FieldProfile> {
    let sample = &records[..records.len().min(sample_size)];

    fields
        .iter()
        .map(DatastoreField::key)
        .filter(|name| *name != ROW_ID_FIELD)
        .map(|name| {
            let values: Vec<&Value> = sample
                .iter()
                .map(|record| record.get(name).unwrap_or(&Value::Null))
                .collect();
            profile_field(name, &values)
        })
        .collect()
}

/// Profile one column of values
pub fn profile_field(name: &str, values: &[&Value]) -> FieldProfile {
    let field_type = infer_field_type(values);
    let stats = calculate_stats(values, field_type);
    let missingness = if stats.count == 0 {
        0.0
    } else {
        stats.null_count as f64 / stats.count as f64
    };

    FieldProfile {
        name: name.to_string(),
        field_type,
        stats,
        missingness,
    }
}

/// Infer the semantic type of a column from sample values
pub fn infer_field_type(values: &[&Value]) -> FieldType {
    if values.is_empty() {
        return FieldType::Unknown;
    }

    let non_null: Vec<&Value> = values.iter().copied().filter(|v| !v.is_null()).collect();
    let Some(first) = non_null.first() else {
        return FieldType::Null;
    };

    let numeric = numeric_values(&non_null);
    let (parts, whole) = NUMERIC_SHARE;
    if !numeric.is_empty() && numeric.len() * whole >= non_null.len() * parts {
        if numeric.iter().all(|v| v.fract() == 0.0) {
            return FieldType::Integer;
        }
        return FieldType::Number;
    }

    let sample = display_value(first).to_lowercase();
    if COORDINATE_HINTS.iter().any(|hint| sample.contains(hint)) {
        return FieldType::Coordinate;
    }

    FieldType::String
}

/// Count, null count, and type-specific statistics.
///
/// Values that fail to parse drop out of min/max/mean but still count
/// towards `count`.
pub fn calculate_stats(values: &[&Value], field_type: FieldType) -> FieldStats {
    let non_null: Vec<&Value> = values.iter().copied().filter(|v| !v.is_null()).collect();
    let mut stats = FieldStats {
        count: values.len(),
        null_count: values.len() - non_null.len(),
        ..FieldStats::default()
    };
    if non_null.is_empty() {
        return stats;
    }

    match field_type {
        FieldType::Integer | FieldType::Number => {
            let numeric = numeric_values(&non_null);
            if !numeric.is_empty() {
                let min = numeric.iter().copied().fold(f64::INFINITY, f64::min);
                let max = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = numeric.iter().sum::<f64>() / numeric.len() as f64;
                stats.min = Some(min);
                stats.max = Some(max);
                stats.mean = Some(mean);
            }
        }
        FieldType::String => {
            let counts = count_occurrences(&non_null);
            stats.unique_count = Some(counts.len());
            stats.top_values = Some(top_values(counts));
        }
        FieldType::Coordinate | FieldType::Null | FieldType::Unknown => {}
    }

    stats
}

/// Parse a value as a number: JSON numbers as-is, booleans as 1 or 0,
/// strings after trimming
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn numeric_values(non_null: &[&Value]) -> Vec<f64> {
    non_null
        .iter()
        .filter(|v| v.as_str() != Some(""))
        .filter_map(|v| parse_number(v))
        .collect()
}

/// String form of a value: strings without quotes, everything else as JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Occurrence counts in first-seen order
fn count_occurrences(values: &[&Value]) -> Vec<ValueCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();

    for value in values {
        let key = display_value(value);
        match index.get(&key) {
            Some(&position) => counts[position].count += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push(ValueCount {
                    value: key,
                    count: 1,
                });
            }
        }
    }

    counts
}

fn top_values(mut counts: Vec<ValueCount>) -> Vec<ValueCount> {
    // stable: ties keep first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_VALUES);
    counts
}

fn serialize_top_values<S>(top: &Option<Vec<ValueCount>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let top = top.as_deref().unwrap_or_default();
    let mut map = serializer.serialize_map(Some(top.len()))?;
    for entry in top {
        map.serialize_entry(&entry.value, &entry.count)?;
    }
    map.end()
}
