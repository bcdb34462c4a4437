//! Provider response parsing.

use serde::Deserialize;
use time::OffsetDateTime;

use nimbus_types::WeatherObservation;

use crate::error::{Error, Result};

/// Top-level provider payload.
///
/// `main` and `weather` are required; a missing `name` becomes an empty
/// city string, matching what the provider omits for some zip lookups.
#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    name: String,
    main: Main,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct Main {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

/// Parse a provider response body into an observation.
///
/// Malformed JSON, a missing `main` or `weather`, a non-array `weather`,
/// and an empty `weather` array all fail; callers treat every failure the
/// same way. `retrieved_at` is stamped with the current UTC time.
pub(crate) fn parse_observation(
    body: &str,
    zip_code: Option<&str>,
) -> Result<WeatherObservation> {
    let payload: Payload = serde_json::from_str(body)?;

    let condition = payload
        .weather
        .into_iter()
        .next()
        .ok_or(Error::IncompletePayload)?;

    Ok(WeatherObservation {
        city: payload.name,
        zip_code: zip_code.map(str::to_string),
        temperature_c: payload.main.temp,
        description: condition.description,
        retrieved_at: OffsetDateTime::now_utc(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let body = r#"{"name":"TestCity","main":{"temp":10},"weather":[{"description":"clear sky"}]}"#;
        let obs = parse_observation(body, None).unwrap();

        assert_eq!(obs.city, "TestCity");
        assert_eq!(obs.temperature_c, 10.0);
        assert_eq!(obs.description, "clear sky");
        assert!(obs.zip_code.is_none());
    }

    #[test]
    fn test_parse_carries_zip_code() {
        let body = r#"{"name":"ZipCity","main":{"temp":15},"weather":[{"description":"cloudy"}]}"#;
        let obs = parse_observation(body, Some("12345")).unwrap();

        assert_eq!(obs.city, "ZipCity");
        assert_eq!(obs.zip_code.as_deref(), Some("12345"));
    }

    #[test]
    fn test_parse_missing_name_yields_empty_city() {
        let body = r#"{"main":{"temp":7.5},"weather":[{"description":"mist"}]}"#;
        let obs = parse_observation(body, None).unwrap();
        assert_eq!(obs.city, "");
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let body = r#"{"name":"X","main":{"temp":1,"humidity":80},"weather":[{"id":500,"description":"rain"}],"wind":{"speed":3}}"#;
        let obs = parse_observation(body, None).unwrap();
        assert_eq!(obs.description, "rain");
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(parse_observation("not json at all", None).is_err());
        assert!(parse_observation(r#"{"name":"#, None).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_main() {
        let body = r#"{"name":"X","weather":[{"description":"rain"}]}"#;
        assert!(parse_observation(body, None).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_weather() {
        let body = r#"{"name":"X","main":{"temp":1}}"#;
        assert!(parse_observation(body, None).is_err());
    }

    #[test]
    fn test_parse_rejects_non_array_weather() {
        let body = r#"{"name":"X","main":{"temp":1},"weather":{"description":"rain"}}"#;
        assert!(parse_observation(body, None).is_err());
    }

    #[test]
    fn test_parse_rejects_empty_weather_array() {
        let body = r#"{"name":"X","main":{"temp":1},"weather":[]}"#;
        let err = parse_observation(body, None).unwrap_err();
        assert!(matches!(err, Error::IncompletePayload));
    }

    #[test]
    fn test_parse_rejects_non_numeric_temp() {
        let body = r#"{"name":"X","main":{"temp":"warm"},"weather":[{"description":"rain"}]}"#;
        assert!(parse_observation(body, None).is_err());
    }
}
