//! Current temperature from wttr.in's JSON format.

use serde::Deserialize;

use super::ProviderError;

#[derive(Debug, Deserialize)]
struct Report {
    current_condition: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(rename = "temp_C")]
    temp_c: String,
}

/// Fetch the current temperature at `location` in degrees Celsius.
pub async fn current_temperature(
    client: &reqwest::Client,
    base: &str,
    location: &str,
) -> Result<f64, ProviderError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(ProviderError::NotFound("no location given".into()));
    }

    let url = format!("{}/{}", base.trim_end_matches('/'), location);
    log::debug!("providers: weather lookup {url}");

    let resp = client
        .get(&url)
        .query(&[("format", "j1"), ("m", "")])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(format!("location {location:?}")));
    }
    let body = resp.error_for_status()?.text().await?;
    parse_temperature(&body)
}

/// Pull `current_condition[0].temp_C` out of a `format=j1` response.
pub fn parse_temperature(body: &str) -> Result<f64, ProviderError> {
    let report: Report =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let condition = report
        .current_condition
        .first()
        .ok_or_else(|| ProviderError::Parse("no current_condition entry".into()))?;

    condition
        .temp_c
        .trim()
        .parse::<f64>()
        .map_err(|e| ProviderError::Parse(format!("temp_C {:?}: {e}", condition.temp_c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "current_condition": [{
            "FeelsLikeC": "16",
            "temp_C": "18",
            "temp_F": "64",
            "weatherDesc": [{"value": "Partly cloudy"}]
        }],
        "nearest_area": [{"areaName": [{"value": "Paris"}]}]
    }"#;

    #[test]
    fn reads_celsius() {
        assert_eq!(parse_temperature(SAMPLE).unwrap(), 18.0);
    }

    #[test]
    fn negative_temperatures() {
        let body = r#"{"current_condition":[{"temp_C":"-7"}]}"#;
        assert_eq!(parse_temperature(body).unwrap(), -7.0);
    }

    #[test]
    fn empty_condition_list_is_parse_error() {
        let body = r#"{"current_condition":[]}"#;
        assert!(matches!(parse_temperature(body), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn non_numeric_temperature_is_parse_error() {
        let body = r#"{"current_condition":[{"temp_C":"warm"}]}"#;
        assert!(matches!(parse_temperature(body), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn html_error_page_is_parse_error() {
        assert!(matches!(
            parse_temperature("<html>Unknown location</html>"),
            Err(ProviderError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn blank_location_fails_before_any_request() {
        let client = reqwest::Client::new();
        let err = current_temperature(&client, "http://127.0.0.1:9", "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
