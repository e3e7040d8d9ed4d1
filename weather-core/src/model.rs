use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One normalized observation for one city, as written to storage.
///
/// Everything except `city_name`, `observed_at` and `raw` is optional: the
/// provider may omit any of it and that is not an error. Present values are
/// kept exactly as the provider sent them, whatever their JSON type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city_name: String,
    #[serde(with = "utc_seconds")]
    pub observed_at: DateTime<Utc>,
    pub weather_main: Option<Value>,
    pub weather_desc: Option<Value>,
    pub temp_c: Option<Value>,
    pub humidity: Option<Value>,
    pub pressure_hpa: Option<Value>,
    pub wind_speed_ms: Option<Value>,
    pub raw: Value,
}

impl WeatherRecord {
    /// Normalize a provider payload.
    ///
    /// `observed_at` is truncated to whole seconds. A missing or `null` field is absent.
    pub fn from_payload(city: &str, payload: Value, observed_at: DateTime<Utc>) -> Self {
        let empty = Map::new();

        let condition = payload
            .get("weather")
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let main = payload.get("main").and_then(Value::as_object).unwrap_or(&empty);
        let wind = payload.get("wind").and_then(Value::as_object).unwrap_or(&empty);

        Self {
            city_name: city.to_string(),
            observed_at: observed_at.with_nanosecond(0).unwrap_or(observed_at),
            weather_main: field(condition, "main"),
            weather_desc: field(condition, "description"),
            temp_c: field(main, "temp"),
            humidity: field(main, "humidity"),
            pressure_hpa: field(main, "pressure"),
            wind_speed_ms: field(wind, "speed"),
            raw: payload,
        }
    }
}

fn field(map: &Map<String, Value>, key: &str) -> Option<Value> {
    map.get(key).filter(|v| !v.is_null()).cloned()
}

/// A city that was fetched and written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenEntry {
    pub city: String,
    pub s3_key: String,
}

/// A city that failed, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub city: String,
    pub error: String,
}

/// Summary of one invocation. Returned to the caller, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub written: Vec<WrittenEntry>,
    pub errors: Vec<ErrorEntry>,
    pub bucket: String,
    pub count_success: usize,
    pub count_errors: usize,
}

impl InvocationResult {
    pub fn new(bucket: String, written: Vec<WrittenEntry>, errors: Vec<ErrorEntry>) -> Self {
        Self {
            count_success: written.len(),
            count_errors: errors.len(),
            written,
            errors,
            bucket,
        }
    }
}

/// `YYYY-MM-DDTHH:MM:SSZ` on the wire.
mod utc_seconds {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
