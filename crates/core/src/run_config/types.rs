//! Run configuration artifact shared with the stage scripts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RunConfigError;

/// Instruction handed to the analysis stage when none is given.
pub const DEFAULT_REQUIRE: &str = "请分析此文档，提取关键内容并进行总结。";

fn default_require() -> String {
    DEFAULT_REQUIRE.to_string()
}

/// The on-disk record every stage reads.
///
/// Field names follow the JSON the stage scripts expect. Fields written by
/// stages that this type does not know about are kept in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfiguration {
    pub target_url: String,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
    #[serde(default = "default_require")]
    pub require: String,
    /// Item titles discovered by the preprocessing stage.
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request to create a fresh run configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRunConfiguration {
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub require: Option<String>,
}

impl NewRunConfiguration {
    /// Validate and build the record. Target URL and dates must be non-empty.
    pub fn into_configuration(self) -> Result<RunConfiguration, RunConfigError> {
        let target_url = required(self.target_url, "targetUrl")?;
        let start_date = required(self.start_date, "startDate")?;
        let end_date = required(self.end_date, "endDate")?;
        let require = self
            .require
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(default_require);

        Ok(RunConfiguration {
            target_url,
            start_date,
            end_date,
            require,
            titles: Vec::new(),
            extra: Map::new(),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, RunConfigError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RunConfigError::MissingField(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> NewRunConfiguration {
        NewRunConfiguration {
            target_url: Some("  https://example.com/docs ".to_string()),
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-31".to_string()),
            require: None,
        }
    }

    #[test]
    fn test_defaults_require_and_trims_url() {
        let config = request().into_configuration().unwrap();
        assert_eq!(config.target_url, "https://example.com/docs");
        assert_eq!(config.require, DEFAULT_REQUIRE);
        assert!(config.titles.is_empty());
    }

    #[test]
    fn test_blank_require_falls_back_to_default() {
        let mut req = request();
        req.require = Some("   ".to_string());
        assert_eq!(req.into_configuration().unwrap().require, DEFAULT_REQUIRE);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut req = request();
        req.start_date = None;
        assert!(matches!(
            req.into_configuration(),
            Err(RunConfigError::MissingField("startDate"))
        ));

        let mut req = request();
        req.target_url = Some("   ".to_string());
        assert!(matches!(
            req.into_configuration(),
            Err(RunConfigError::MissingField("targetUrl"))
        ));
    }

    #[test]
    fn test_wire_field_names() {
        let config = request().into_configuration().unwrap();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["target_url"], "https://example.com/docs");
        assert_eq!(value["startDate"], "2024-01-01");
        assert_eq!(value["endDate"], "2024-01-31");
        assert_eq!(value["titles"], json!([]));
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "target_url": "https://example.com",
            "startDate": "2024-01-01",
            "endDate": "2024-01-31",
            "titles": ["Q1 report"],
            "companyName": "Example Ltd"
        });
        let config: RunConfiguration = serde_json::from_value(raw).unwrap();
        assert_eq!(config.require, DEFAULT_REQUIRE);
        assert_eq!(config.extra["companyName"], "Example Ltd");

        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["companyName"], "Example Ltd");
    }

    #[test]
    fn test_request_uses_camel_case() {
        let req: NewRunConfiguration = serde_json::from_value(json!({
            "targetUrl": "https://example.com",
            "startDate": "2024-01-01",
            "endDate": "2024-01-31",
            "require": "Summarize"
        }))
        .unwrap();
        assert_eq!(req.into_configuration().unwrap().require, "Summarize");
    }
}
