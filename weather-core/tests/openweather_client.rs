//! Integration tests for OpenWeatherClient against a mock HTTP server.

use std::time::Duration;

use weather_core::{ApiKey, FetchError, OpenWeatherClient, WeatherFetcher};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn riyadh_payload() -> serde_json::Value {
    serde_json::json!({
        "name": "Riyadh",
        "dt": 1704164645,
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky"}],
        "main": {"temp": 24.3, "humidity": 30, "pressure": 1015},
        "wind": {"speed": 3.6, "deg": 40}
    })
}

fn client_for(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::new(format!("{}/data/2.5/weather", server.uri())).unwrap()
}

#[tokio::test]
async fn test_fetch_success_normalizes_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Riyadh"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(riyadh_payload()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let record = client_for(&mock_server)
        .fetch("Riyadh", &ApiKey::new("test-key"))
        .await
        .unwrap();

    assert_eq!(record.city_name, "Riyadh");
    assert_eq!(record.weather_main, Some(serde_json::json!("Clear")));
    assert_eq!(record.weather_desc, Some(serde_json::json!("clear sky")));
    assert_eq!(record.humidity, Some(serde_json::json!(30)));
    assert_eq!(record.raw, riyadh_payload());
    // Stamped locally, not taken from the provider's `dt`.
    assert_ne!(record.observed_at.timestamp(), 1704164645);
}

#[tokio::test]
async fn test_city_with_space_is_sent_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("q", "New York"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": {"temp": 5}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let record = client_for(&mock_server)
        .fetch("New York", &ApiKey::new("k"))
        .await
        .unwrap();

    assert_eq!(record.city_name, "New York");
    assert!(record.wind_speed_ms.is_none());
    assert!(record.weather_main.is_none());
}

#[tokio::test]
async fn test_unauthorized_is_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key."
        })))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .fetch("Riyadh", &ApiKey::new("bad"))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Http { status: 401, .. }));
    assert_eq!(err.to_string(), "HTTP 401: Unauthorized");
}

#[tokio::test]
async fn test_not_found_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .fetch("Nowhereville", &ApiKey::new("k"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "HTTP 404: Not Found");
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .fetch("Riyadh", &ApiKey::new("k"))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Parse(_)));
}

#[tokio::test]
async fn test_non_utf8_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'{', 0xff, 0xfe, b'}']))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .fetch("Riyadh", &ApiKey::new("k"))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Parse(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(riyadh_payload())
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_timeout(
        format!("{}/data/2.5/weather", mock_server.uri()),
        Duration::from_millis(100),
    )
    .unwrap();

    let err = client.fetch("Cairo", &ApiKey::new("k")).await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout(_)), "unexpected error: {err:?}");
    assert!(err.to_string().contains("timeout"));
}
