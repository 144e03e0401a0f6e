use fastbill_etl::core::ConfigProvider;
use fastbill_etl::{EtlError, FastbillSource, Resource, TomlConfig};
use fastbill_etl::utils::error::ErrorCategory;
use httpmock::prelude::*;
use serde_json::{json, Value};

const BASIC_AUTH: &str = "Basic YmlsbGluZ0BleGFtcGxlLmNvbTphYmMxMjM=";

fn config_for(server: &MockServer, page_size: usize, extra: &str) -> TomlConfig {
    let toml_content = format!(
        r#"
[credentials]
username = "billing@example.com"
api_key = "abc123"

[source]
base_url = "{}"
page_size = {}
retry_delay_ms = 0
{}

[load]
output_path = "./unused"
"#,
        server.url("/api.php"),
        page_size,
        extra
    );
    TomlConfig::from_toml_str(&toml_content).unwrap()
}

fn rows(key_field: &str, range: std::ops::Range<usize>) -> Vec<Value> {
    range
        .map(|i| json!({ key_field: i.to_string(), "NAME": format!("row {}", i) }))
        .collect()
}

fn page_response(service: &str, offset: u64, key: &str, items: Vec<Value>) -> Value {
    json!({
        "REQUEST": { "SERVICE": service, "FILTER": {}, "OFFSET": offset },
        "RESPONSE": { key: items }
    })
}

#[tokio::test]
async fn test_short_page_is_read_once() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api.php")
            .json_body_partial(r#"{"SERVICE":"customer.get","OFFSET":0}"#);
        then.status(200).json_body(page_response(
            "customer.get",
            0,
            "CUSTOMERS",
            rows("CUSTOMER_ID", 0..3),
        ));
    });

    let config = config_for(&server, 100, "");
    let source = FastbillSource::new(&config).unwrap();
    let batch = source.read_stream(Resource::Customers).await.unwrap();

    api_mock.assert_hits(1);
    assert_eq!(batch.stream, "customers");
    assert_eq!(batch.primary_key, "CUSTOMER_ID");
    assert_eq!(batch.records.len(), 3);
    assert_eq!(batch.pages, 1);
}

#[tokio::test]
async fn test_full_page_requests_next_offset_once() {
    let server = MockServer::start();
    let first_page = server.mock(|when, then| {
        when.method(POST)
            .path("/api.php")
            .json_body_partial(r#"{"SERVICE":"invoice.get","OFFSET":0}"#);
        then.status(200)
            .json_body(page_response("invoice.get", 0, "INVOICES", rows("INVOICE_ID", 0..2)));
    });
    let second_page = server.mock(|when, then| {
        when.method(POST)
            .path("/api.php")
            .json_body_partial(r#"{"SERVICE":"invoice.get","OFFSET":2}"#);
        then.status(200)
            .json_body(page_response("invoice.get", 2, "INVOICES", rows("INVOICE_ID", 2..3)));
    });

    let config = config_for(&server, 2, "");
    let source = FastbillSource::new(&config).unwrap();
    let batch = source.read_stream(Resource::Invoices).await.unwrap();

    first_page.assert_hits(1);
    second_page.assert_hits(1);
    assert_eq!(batch.pages, 2);
    let ids: Vec<_> = batch
        .records
        .iter()
        .map(|r| r.data["INVOICE_ID"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["0", "1", "2"]);
}

#[tokio::test]
async fn test_each_resource_reads_its_own_key() {
    for resource in Resource::ALL {
        let server = MockServer::start();
        let service = resource.service();

        // every collection key is present; only the declared one may be read
        let mut response_body = serde_json::Map::new();
        for key in ["CUSTOMERS", "INVOICES", "ARTICLES", "REVENUES"] {
            let count = if key == resource.response_key() { 2 } else { 5 };
            response_body.insert(key.to_string(), Value::Array(rows("ID", 0..count)));
        }
        let body = json!({
            "REQUEST": { "SERVICE": service, "OFFSET": 0 },
            "RESPONSE": response_body
        });

        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api.php")
                .json_body_partial(format!(r#"{{"SERVICE":"{}"}}"#, service));
            then.status(200).json_body(body);
        });

        let config = config_for(&server, 100, "");
        let source = FastbillSource::new(&config).unwrap();
        let batch = source.read_stream(resource).await.unwrap();

        api_mock.assert_hits(1);
        assert_eq!(batch.records.len(), 2, "{} read the wrong key", resource);
        assert_eq!(batch.primary_key, resource.primary_key());
    }
}

#[tokio::test]
async fn test_requests_carry_basic_auth_and_json_content_type() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api.php")
            .header("authorization", BASIC_AUTH)
            .header("content-type", "application/json")
            .json_body(json!({ "SERVICE": "article.get", "FILTER": {}, "OFFSET": 0 }));
        then.status(200)
            .json_body(page_response("article.get", 0, "ARTICLES", rows("ARTICLE_ID", 0..1)));
    });

    let config = config_for(&server, 100, "");
    let source = FastbillSource::new(&config).unwrap();
    let batch = source.read_stream(Resource::Products).await.unwrap();

    api_mock.assert();
    assert_eq!(batch.records.len(), 1);
}

#[tokio::test]
async fn test_max_records_stops_pagination() {
    let server = MockServer::start();
    let first_page = server.mock(|when, then| {
        when.method(POST)
            .path("/api.php")
            .json_body_partial(r#"{"OFFSET":0}"#);
        then.status(200)
            .json_body(page_response("revenue.get", 0, "REVENUES", rows("INVOICE_ID", 0..5)));
    });
    let later_pages = server.mock(|when, then| {
        when.method(POST)
            .path("/api.php")
            .json_body_partial(r#"{"OFFSET":5}"#);
        then.status(200)
            .json_body(page_response("revenue.get", 5, "REVENUES", rows("INVOICE_ID", 5..10)));
    });

    let config = config_for(&server, 5, "max_records = 3");
    let source = FastbillSource::new(&config).unwrap();
    let batch = source.read_stream(Resource::Revenues).await.unwrap();

    first_page.assert_hits(1);
    later_pages.assert_hits(0);
    assert_eq!(batch.records.len(), 3);
}

#[tokio::test]
async fn test_check_connection_succeeds() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api.php")
            .json_body_partial(r#"{"SERVICE":"customer.get"}"#);
        then.status(200)
            .json_body(page_response("customer.get", 0, "CUSTOMERS", vec![]));
    });

    let config = config_for(&server, 100, "");
    let status = FastbillSource::check_connection(&config).await;

    api_mock.assert_hits(1);
    assert!(status.succeeded);
    assert_eq!(status.message, None);
}

#[tokio::test]
async fn test_check_connection_reports_rejected_credentials() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/api.php");
        then.status(401).body("Unauthorized");
    });

    let config = config_for(&server, 100, "retry_attempts = 2");
    let status = FastbillSource::check_connection(&config).await;

    // 401 is not transient, so no retries
    api_mock.assert_hits(1);
    assert!(!status.succeeded);
    let message = status.message.unwrap();
    assert!(message.starts_with("Unable to connect to Fastbill API with the provided credentials - "));
    assert!(message.contains("401"));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/api.php");
        then.status(503);
    });

    let config = config_for(&server, 100, "retry_attempts = 2");
    assert_eq!(config.retry_attempts(), 2);

    let source = FastbillSource::new(&config).unwrap();
    let err = source.read_stream(Resource::Customers).await.unwrap_err();

    api_mock.assert_hits(3);
    assert!(matches!(err, EtlError::HttpStatusError { status: 503, .. }));
}

#[tokio::test]
async fn test_api_level_errors_fail_the_stream() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/api.php");
        then.status(200).json_body(json!({
            "REQUEST": { "SERVICE": "recurring.get", "OFFSET": 0 },
            "RESPONSE": { "ERRORS": ["Service not allowed"] }
        }));
    });

    let config = config_for(&server, 100, "");
    let source = FastbillSource::new(&config).unwrap();
    let err = source
        .read_stream(Resource::RecurringInvoices)
        .await
        .unwrap_err();

    api_mock.assert_hits(1);
    assert!(matches!(err, EtlError::ApiResponseError { .. }));
    assert!(err.to_string().contains("Service not allowed"));
}

#[tokio::test]
async fn test_non_json_body_is_a_data_error() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/api.php");
        then.status(200).body("not json");
    });

    let config = config_for(&server, 100, "");
    let source = FastbillSource::new(&config).unwrap();
    let err = source.read_stream(Resource::Products).await.unwrap_err();

    api_mock.assert_hits(1);
    assert!(matches!(err, EtlError::ApiError(_)));
    assert!(!err.is_transient());
    assert_eq!(err.category(), ErrorCategory::Data);
    assert!(err.user_friendly_message().starts_with("Could not process"));
}
