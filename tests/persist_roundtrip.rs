use intake::agent::GeminiClient;
use intake::clock::FixedClock;
use intake::config::AgentConfig;
use intake::{AnalyticsRequest, RequestStore, Validator};
use chrono::{Local, TimeZone};
use secrecy::SecretString;
use serde_json::{json, Value};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GeminiClient {
    let settings = AgentConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        max_retries: 0,
        ..AgentConfig::default()
    };
    GeminiClient::new(settings, SecretString::from("test-key".to_string())).unwrap()
}

fn minimal_record() -> Value {
    let info = Validator::default()
        .validate("Ann", "Analyst", "Finance", "next week")
        .data()
        .cloned()
        .expect("valid basic info");

    json!({
        "basic_info": info,
        "request_type": "reports",
        "requirements": {
            "purpose": "Monthly churn by region",
            "metrics": ["churn_rate", "net_revenue_retention"]
        },
        "session_id": "session_xyz"
    })
}

#[tokio::test]
async fn saved_file_reproduces_input_plus_summary_and_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Ann needs a churn report."}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = RequestStore::open(dir.path());
    let input = minimal_record();
    let request: AnalyticsRequest = serde_json::from_value(input.clone()).unwrap();

    let outcome = store.persist(&client_for(&server), request).await;
    assert!(outcome.is_success(), "{}", outcome.message());

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(outcome.file_path().unwrap()).unwrap())
            .unwrap();
    for (key, value) in input.as_object().unwrap() {
        assert_eq!(&written[key], value, "key `{}` changed", key);
    }
    assert_eq!(written["request_summary"], "Ann needs a churn report.");
    assert_eq!(written["metadata"]["status"], "pending_review");
    let created_at = written["metadata"]["created_at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());

    let file_name = outcome.file_path().unwrap().file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("analytics_request_"));
    assert_eq!(file_name.len(), "analytics_request_20250101_000000.json".len());
}

#[tokio::test]
async fn unreachable_service_still_saves_with_error_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "API key not valid"}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock(Local.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap());
    let store = RequestStore::with_clock(dir.path(), clock);
    let request: AnalyticsRequest = serde_json::from_value(minimal_record()).unwrap();

    let outcome = store.persist(&client_for(&server), request).await;
    assert_eq!(
        outcome.file_path().unwrap(),
        dir.path().join("analytics_request_20250701_120000.json")
    );

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(outcome.file_path().unwrap()).unwrap())
            .unwrap();
    assert_eq!(written["request_summary"]["status"], "error");
    assert_eq!(
        written["request_summary"]["message"],
        "Failed to generate summary: LLM service returned 401: API key not valid"
    );
}

#[tokio::test]
async fn same_second_saves_keep_the_last_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "recap"}]}}]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock(Local.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap());
    let store = RequestStore::with_clock(dir.path(), clock);
    let client = client_for(&server);

    let mut first = minimal_record();
    first["requirements"]["purpose"] = json!("first payload");
    let mut second = minimal_record();
    second["requirements"]["purpose"] = json!("second payload");

    let a = store
        .persist(&client, serde_json::from_value(first).unwrap())
        .await;
    let b = store
        .persist(&client, serde_json::from_value(second).unwrap())
        .await;
    assert_eq!(a.file_path(), b.file_path());

    let stored = store.load(b.file_path().unwrap()).unwrap();
    assert_eq!(
        stored.requirements["purpose"],
        intake::request::RequirementValue::from("second payload")
    );
}

#[tokio::test]
async fn record_with_naive_timestamp_saves_and_loads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Q2 sales review."}]}}]
        })))
        .mount(&server)
        .await;

    let input = json!({
        "basic_info": {
            "name": "Sarah Johnson",
            "role": "Regional Sales Manager",
            "department": "Sales - West Coast",
            "timeline": "End of this week",
            "collected_at": "2025-07-14T16:05:09.123456"
        },
        "request_type": "reports",
        "requirements": {"purpose": "Q2 sales performance analysis"}
    });
    let request: AnalyticsRequest = serde_json::from_value(input).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = RequestStore::open(dir.path());
    let outcome = store.persist(&client_for(&server), request).await;
    assert!(outcome.is_success(), "{}", outcome.message());

    let stored = store.load(outcome.file_path().unwrap()).unwrap();
    assert_eq!(stored.basic_info.name, "Sarah Johnson");
    assert_eq!(
        stored.basic_info.collected_at.naive_local().to_string(),
        "2025-07-14 16:05:09.123456"
    );
}
