use chrono::{DateTime, Utc};

/// Storage key for one observation:
/// `{base_path}/city={city}/dt={YYYY-MM-DD}/hour={HH}/{YYYYMMDDTHHMMSSZ}.json`.
///
/// Spaces in the city become underscores; nothing else is escaped. Two writes
/// for the same city within one second map to the same key.
///
/// Slashes around `base_path` are dropped and an empty base means no prefix,
/// so the key never starts with `/` or contains an empty segment there.
pub fn build_key(base_path: &str, city: &str, at: DateTime<Utc>) -> String {
    let safe_city = city.replace(' ', "_");
    let leaf = format!(
        "city={safe_city}/dt={}/hour={}/{}.json",
        at.format("%Y-%m-%d"),
        at.format("%H"),
        at.format("%Y%m%dT%H%M%SZ"),
    );

    match base_path.trim_matches('/') {
        "" => leaf,
        base => format!("{base}/{leaf}"),
    }
}
