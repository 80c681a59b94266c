//! Composite operations of `DataGovClient` against a mock CKAN portal.

use std::time::Duration;

use datagov_il::ckan::RetryPolicy;
use datagov_il::{ChartRequest, DataGovClient, DataGovError, DataGovIlConfig};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_client(server: &MockServer) -> DataGovClient {
    let config = DataGovIlConfig::new()
        .with_base_url(server.uri())
        .expect("mock server URI should be valid")
        .with_retry_policy(RetryPolicy::immediate(0));
    DataGovClient::with_config(config)
}

fn success(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"success": true, "result": result}))
}

async fn requests_to(server: &MockServer, action: &str) -> usize {
    let wanted = format!("/action/{}", action);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == wanted)
        .count()
}

async fn mount_datastore(server: &MockServer, records: Value) {
    Mock::given(method("GET"))
        .and(path("/action/datastore_search"))
        .respond_with(success(json!({
            "resource_id": "res-1",
            "fields": [
                {"id": "_id", "type": "int"},
                {"id": "city", "type": "text"},
                {"id": "population", "type": "numeric"},
                {"id": "lat", "type": "numeric"},
                {"id": "lon", "type": "numeric"}
            ],
            "records": records,
            "total": 3
        })))
        .mount(server)
        .await;
}

fn city_records() -> Value {
    json!([
        {"_id": 1, "city": "Tel Aviv", "population": 460000, "lat": 32.0853, "lon": 34.7818},
        {"_id": 2, "city": "Jerusalem", "population": 980000, "lat": 31.7683, "lon": 35.2137},
        {"_id": 3, "city": "Haifa", "population": 285000, "lat": 32.7940, "lon": 34.9896}
    ])
}

#[tokio::test]
async fn test_fetch_data_reads_first_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/action/package_show"))
        .and(query_param("id", "city-stats"))
        .respond_with(success(json!({
            "id": "pkg-1",
            "name": "city-stats",
            "resources": [{"id": "res-1", "format": "CSV"}, {"id": "res-2"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/action/datastore_search"))
        .and(query_param("resource_id", "res-1"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "5"))
        .respond_with(success(json!({
            "records": [{"a": 1}, {"a": 2}],
            "fields": [{"id": "a", "type": "int"}],
            "total": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let fetched = client
        .fetch_data("city-stats", 2, 5)
        .await
        .expect("fetch should succeed");

    assert_eq!(fetched.resource_id, "res-1");
    assert_eq!(fetched.records.len(), 2);
    assert_eq!(fetched.records[1]["a"], 2);

    let payload = serde_json::to_value(&fetched).unwrap();
    assert_eq!(payload["resource_id"], "res-1");
    assert!(payload["records"].is_array());
}

#[tokio::test]
async fn test_fetch_data_without_resources_skips_datastore() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/action/package_show"))
        .respond_with(success(json!({"id": "pkg-1", "name": "empty", "resources": []})))
        .mount(&server)
        .await;
    mount_datastore(&server, city_records()).await;

    let client = create_test_client(&server);
    let err = client.fetch_data("empty", 100, 0).await.unwrap_err();

    assert!(matches!(err, DataGovError::NoResources { ref dataset } if dataset == "empty"));
    assert_eq!(err.to_string(), "No resources found in dataset 'empty'");
    assert!(err.is_data_error());
    assert_eq!(requests_to(&server, "datastore_search").await, 0);
}

#[tokio::test]
async fn test_fetch_data_with_null_resources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/action/package_show"))
        .respond_with(success(json!({"id": "pkg-1", "name": "bare", "resources": null})))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = client.fetch_data("bare", 100, 0).await.unwrap_err();

    assert!(matches!(err, DataGovError::NoResources { .. }));
}

#[tokio::test]
async fn test_blank_dataset_name_makes_no_request() {
    let server = MockServer::start().await;
    let client = create_test_client(&server);

    let err = client.fetch_data("   ", 100, 0).await.unwrap_err();

    assert!(matches!(err, DataGovError::ValidationError { .. }));
    assert!(err.to_string().contains("dataset_name"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_missing_dataset_propagates_gateway_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/action/package_show"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = client.fetch_data("nope", 100, 0).await.unwrap_err();

    assert!(matches!(err, DataGovError::Gateway(_)));
    assert_eq!(err.status_code(), Some(404));
    assert!(!err.is_data_error());
}

#[tokio::test]
async fn test_dataset_profile_skips_row_id() {
    let server = MockServer::start().await;
    mount_datastore(&server, city_records()).await;

    let client = create_test_client(&server);
    let profile = client
        .dataset_profile("res-1", 100)
        .await
        .expect("profile should succeed");

    assert_eq!(profile.resource_id, "res-1");
    assert_eq!(profile.sample_size, 3);
    assert_eq!(profile.total_fields, 4);
    assert!(profile.fields.iter().all(|field| field.name != "_id"));

    let population = profile
        .fields
        .iter()
        .find(|field| field.name == "population")
        .expect("population should be profiled");
    assert_eq!(population.stats.min, Some(285000.0));
    assert_eq!(population.stats.max, Some(980000.0));

    let payload = serde_json::to_value(&profile).unwrap();
    assert_eq!(payload["fields"][0]["name"], "city");
    assert_eq!(payload["fields"][0]["type"], "string");
}

#[tokio::test]
async fn test_dataset_profile_sends_sample_size_as_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/action/datastore_search"))
        .and(query_param("resource_id", "res-1"))
        .and(query_param("limit", "2"))
        .respond_with(success(json!({
            "fields": [{"id": "v", "type": "int"}],
            "records": [{"v": 1}, {"v": 2}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let profile = client.dataset_profile("res-1", 2).await.unwrap();

    assert_eq!(profile.sample_size, 2);
}

#[tokio::test]
async fn test_dataset_profile_of_empty_resource() {
    let server = MockServer::start().await;
    mount_datastore(&server, json!([])).await;

    let client = create_test_client(&server);
    let err = client.dataset_profile("res-1", 100).await.unwrap_err();

    assert!(matches!(err, DataGovError::NoRecords));
    assert_eq!(err.to_string(), "No records found in resource");
}

#[tokio::test]
async fn test_chart_generator_builds_spec_and_html() {
    let server = MockServer::start().await;
    mount_datastore(&server, city_records()).await;

    let client = create_test_client(&server);
    let artifact = client
        .chart_generator(&ChartRequest {
            resource_id: "res-1",
            chart_type: "bar",
            x_field: "city",
            y_field: Some("population"),
            title: None,
            limit: 1000,
        })
        .await
        .expect("chart should build");

    let spec = serde_json::to_value(&artifact.vega_lite_spec).unwrap();
    assert_eq!(spec["mark"], "bar");
    assert_eq!(spec["title"], "Bar Chart");
    assert_eq!(spec["encoding"]["x"]["field"], "city");
    assert_eq!(spec["encoding"]["y"]["field"], "population");
    assert_eq!(spec["data"]["values"].as_array().map(Vec::len), Some(3));
    assert!(artifact.html.contains("vegaEmbed"));
}

#[tokio::test]
async fn test_invalid_chart_type_makes_no_request() {
    let server = MockServer::start().await;
    mount_datastore(&server, city_records()).await;

    let client = create_test_client(&server);
    let err = client
        .chart_generator(&ChartRequest {
            resource_id: "res-1",
            chart_type: "invalid",
            x_field: "city",
            y_field: None,
            title: None,
            limit: 1000,
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Unsupported chart type: invalid");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_map_generator_builds_features() {
    let server = MockServer::start().await;
    mount_datastore(&server, city_records()).await;

    let client = create_test_client(&server);
    let map = client
        .map_generator("res-1", "lat", "lon", 500)
        .await
        .expect("map should build");

    assert_eq!(map.point_count, 3);
    assert_eq!(map.geojson.features.len(), 3);
    assert!(map.center.lat > 31.0 && map.center.lat < 33.0);
    assert!(map.center.lon > 34.0 && map.center.lon < 36.0);
    assert!(map.html.contains("L.geoJSON"));

    let properties = &map.geojson.features[0].properties;
    assert!(!properties.contains_key("lat"));
    assert!(!properties.contains_key("lon"));
    assert_eq!(properties["city"], "Tel Aviv");
}

#[tokio::test]
async fn test_map_generator_without_coordinates() {
    let server = MockServer::start().await;
    mount_datastore(
        &server,
        json!([{"city": "Nowhere", "lat": "n/a", "lon": "n/a"}]),
    )
    .await;

    let client = create_test_client(&server);
    let err = client
        .map_generator("res-1", "lat", "lon", 500)
        .await
        .unwrap_err();

    assert!(matches!(err, DataGovError::NoValidCoordinates));
}

#[tokio::test]
async fn test_application_error_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/action/datastore_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"message": "Resource not found", "__type": "Not Found Error"}
        })))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let err = client.dataset_profile("missing", 10).await.unwrap_err();

    assert_eq!(err.to_string(), "CKAN API error: Resource not found");
    assert_eq!(err.status_code(), None);
}

#[tokio::test]
async fn test_deadline_expires() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/action/datastore_search"))
        .respond_with(success(json!({"records": []})).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = DataGovIlConfig::new()
        .with_base_url(server.uri())
        .unwrap()
        .with_retry_policy(RetryPolicy::immediate(0))
        .with_tool_timeout(Duration::from_millis(200));
    let client = DataGovClient::with_config(config);

    let err = client
        .with_deadline(client.dataset_profile("res-1", 10))
        .await
        .unwrap_err();

    assert!(matches!(err, DataGovError::Timeout { .. }));
}

#[tokio::test]
async fn test_deadline_passes_through_result() {
    let value = datagov_il::deadline(Duration::from_secs(1), async { Ok::<_, DataGovError>(42) })
        .await
        .unwrap();
    assert_eq!(value, 42);
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let server = MockServer::start().await;
    mount_datastore(&server, city_records()).await;

    let client = create_test_client(&server);
    assert!(!client.shutdown());

    client.dataset_profile("res-1", 10).await.unwrap();
    assert!(client.connections().is_active());
    assert!(client.shutdown());
    assert!(!client.shutdown());
    assert!(!client.connections().is_active());
}

#[tokio::test]
async fn test_missing_chart_type_is_validation_error() {
    let server = MockServer::start().await;
    let client = create_test_client(&server);

    for chart_type in ["", "   "] {
        let err = client
            .chart_generator(&ChartRequest {
                resource_id: "res-1",
                chart_type,
                x_field: "city",
                y_field: None,
                title: None,
                limit: 100,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DataGovError::ValidationError { .. }));
        assert!(err.to_string().contains("missing required parameter 'chart_type'"));
    }
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_invalid_chart_type_wins_over_missing_fields() {
    let server = MockServer::start().await;
    let client = create_test_client(&server);

    let err = client
        .chart_generator(&ChartRequest {
            resource_id: "",
            chart_type: "invalid",
            x_field: "",
            y_field: None,
            title: None,
            limit: 100,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DataGovError::UnsupportedChartType(_)));
}
