use datagov_il::ckan::models::{DatastoreField, Record};
use datagov_il::profile::{FieldType, infer_field_type, profile_field, profile_records};
use serde_json::{Value, json};

fn column(values: Value) -> Vec<Value> {
    values.as_array().cloned().unwrap_or_default()
}

fn refs(values: &[Value]) -> Vec<&Value> {
    values.iter().collect()
}

fn field(id: &str) -> DatastoreField {
    DatastoreField {
        id: Some(id.to_string()),
        name: None,
        field_type: Some("text".to_string()),
    }
}

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn test_integer_field_stats() {
    let values = column(json!([20, 25, 30, 35, 40]));
    let profile = profile_field("age", &refs(&values));

    assert_eq!(profile.field_type, FieldType::Integer);
    assert_eq!(profile.stats.count, 5);
    assert_eq!(profile.stats.null_count, 0);
    assert_eq!(profile.stats.min, Some(20.0));
    assert_eq!(profile.stats.max, Some(40.0));
    assert_eq!(profile.stats.mean, Some(30.0));
    assert_eq!(profile.missingness, 0.0);
}

#[test]
fn test_string_field_stats() {
    let values = column(json!(["Tel Aviv", "Jerusalem", "Haifa"]));
    let profile = profile_field("city", &refs(&values));

    assert_eq!(profile.field_type, FieldType::String);
    assert_eq!(profile.stats.unique_count, Some(3));
    assert!(profile.stats.min.is_none());
    assert_eq!(profile.stats.top_values.as_ref().map(Vec::len), Some(3));
}

#[test]
fn test_numeric_strings_with_fractions_are_numbers() {
    let values = column(json!(["1.5", "2.25", " 3 "]));
    let profile = profile_field("price", &refs(&values));

    assert_eq!(profile.field_type, FieldType::Number);
    assert_eq!(profile.stats.min, Some(1.5));
    assert_eq!(profile.stats.max, Some(3.0));
}

#[test]
fn test_eighty_percent_threshold_keeps_count_asymmetry() {
    let values = column(json!([10, 20, 30, 40, "n/a"]));
    let profile = profile_field("score", &refs(&values));

    assert_eq!(profile.field_type, FieldType::Integer);
    // the unparsable value still counts, but not in the mean
    assert_eq!(profile.stats.count, 5);
    assert_eq!(profile.stats.mean, Some(25.0));
}

#[test]
fn test_below_threshold_is_string() {
    let values = column(json!([1, 2, 3, "a", "b"]));
    assert_eq!(infer_field_type(&refs(&values)), FieldType::String);
}

#[test]
fn test_null_and_unknown_types() {
    let nulls = column(json!([null, null]));
    let profile = profile_field("empty", &refs(&nulls));
    assert_eq!(profile.field_type, FieldType::Null);
    assert_eq!(profile.stats.null_count, 2);
    assert_eq!(profile.missingness, 1.0);

    assert_eq!(infer_field_type(&[]), FieldType::Unknown);
    assert_eq!(profile_field("none", &[]).missingness, 0.0);
}

#[test]
fn test_coordinate_hint_in_first_value() {
    let values = column(json!(["Lat 32.08 / Lon 34.78", "somewhere"]));
    assert_eq!(infer_field_type(&refs(&values)), FieldType::Coordinate);
}

#[test]
fn test_missingness_counts_nulls() {
    let values = column(json!([1, null, 3, null]));
    let profile = profile_field("partial", &refs(&values));

    assert_eq!(profile.field_type, FieldType::Integer);
    assert_eq!(profile.stats.null_count, 2);
    assert_eq!(profile.missingness, 0.5);
    assert_eq!(profile.stats.mean, Some(2.0));
}

#[test]
fn test_top_values_sorted_by_frequency_then_first_seen() {
    let values = column(json!(["b", "a", "c", "a", "d", "e", "f", "b"]));
    let profile = profile_field("letters", &refs(&values));
    let top = profile.stats.top_values.expect("string stats");

    let names: Vec<&str> = top.iter().map(|v| v.value.as_str()).collect();
    assert_eq!(names, vec!["b", "a", "c", "d", "e"]);
    assert_eq!(top[0].count, 2);
    assert_eq!(profile.stats.unique_count, Some(6));
}

#[test]
fn test_profile_records_skips_row_id_and_respects_sample() {
    let fields = vec![field("_id"), field("city"), field("population")];
    let records = vec![
        record(json!({"_id": 1, "city": "Haifa", "population": 285000})),
        record(json!({"_id": 2, "city": "Eilat", "population": 52000})),
        record(json!({"_id": 3, "city": "Acre", "population": 51000})),
    ];

    let profiles = profile_records(&fields, &records, 2);

    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].name, "city");
    assert_eq!(profiles[0].stats.count, 2);
    assert_eq!(profiles[1].field_type, FieldType::Integer);
    assert_eq!(profiles[1].stats.max, Some(285000.0));
}

#[test]
fn test_profile_serializes_type_names() {
    let values = column(json!([1, 2]));
    let json = serde_json::to_value(profile_field("n", &refs(&values))).unwrap();

    assert_eq!(json["type"], "integer");
    assert_eq!(json["stats"]["count"], 2);
    assert!(json["stats"].get("unique_count").is_none());
}

#[test]
fn test_boolean_column_is_integer() {
    let values = column(json!([true, false, true, null]));
    assert_eq!(infer_field_type(&refs(&values)), FieldType::Integer);

    let profile = profile_field("active", &refs(&values));
    assert_eq!(profile.stats.min, Some(0.0));
    assert_eq!(profile.stats.max, Some(1.0));
    assert_eq!(profile.stats.mean, Some(2.0 / 3.0));
    assert!(profile.stats.top_values.is_none());
}

#[test]
fn test_top_values_serialize_as_ordered_object() {
    let values = column(json!(["b", "a", "c", "a", "b", "b"]));
    let json = serde_json::to_value(profile_field("letters", &refs(&values))).unwrap();

    let top = json["stats"]["top_values"].as_object().expect("object of counts");
    let entries: Vec<(&str, u64)> = top
        .iter()
        .map(|(value, count)| (value.as_str(), count.as_u64().unwrap_or_default()))
        .collect();
    assert_eq!(entries, vec![("b", 3), ("a", 2), ("c", 1)]);
}
