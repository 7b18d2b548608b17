//! Client configuration and wire-format selection.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Oldest API version this client speaks.
pub const MIN_API_VERSION: u32 = 11;

/// First API version with JSON bodies and the ACL/config endpoints.
pub const JSON_API_VERSION: u32 = 14;

pub const DEFAULT_API_VERSION: u32 = 21;

/// Body encoding for project resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    pub fn mime(self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Xml => "application/xml",
        }
    }

    /// Picks a format from a `Content-Type` value, ignoring parameters such as
    /// `charset`. Returns `None` for anything that is neither JSON nor XML.
    pub fn from_content_type(value: &str) -> Option<Format> {
        let essence = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        if essence.ends_with("json") {
            Some(Format::Json)
        } else if essence.ends_with("xml") {
            Some(Format::Xml)
        } else {
            None
        }
    }

    fn parse(value: &str) -> Result<Format, Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            other => Err(Error::Option(format!("unknown format {other:?}, expected json or xml"))),
        }
    }
}

fn default_api_version() -> u32 {
    DEFAULT_API_VERSION
}

/// Where the server lives and which API dialect to speak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: u32,
    /// Forces a format. When unset the API version decides.
    #[serde(default)]
    pub format: Option<Format>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_version: DEFAULT_API_VERSION,
            format: None,
        }
    }

    pub fn with_api_version(mut self, api_version: u32) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Reads `RUNDECK_URL`, `RUNDECK_API_VERSION` and `RUNDECK_FORMAT`.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a caller-supplied lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("RUNDECK_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::Option("RUNDECK_URL is not set".to_string()))?;
        let mut config = ClientConfig::new(base_url.trim());

        if let Some(raw) = lookup("RUNDECK_API_VERSION") {
            config.api_version = raw
                .trim()
                .parse()
                .map_err(|_| Error::Option(format!("RUNDECK_API_VERSION {raw:?} is not a number")))?;
        }
        if let Some(raw) = lookup("RUNDECK_FORMAT") {
            config.format = Some(Format::parse(&raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Effective format: the forced one, else JSON from API 14 on.
    pub fn format(&self) -> Format {
        match self.format {
            Some(format) => format,
            None if self.api_version >= JSON_API_VERSION => Format::Json,
            None => Format::Xml,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(Error::Option("base URL is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Option(format!("base URL {url:?} must start with http:// or https://")));
        }
        if self.api_version < MIN_API_VERSION {
            return Err(Error::Option(format!(
                "API version {} is not supported (minimum {MIN_API_VERSION})",
                self.api_version
            )));
        }
        if self.format == Some(Format::Json) && self.api_version < JSON_API_VERSION {
            return Err(Error::Option(format!(
                "JSON requires API version {JSON_API_VERSION} or later, got {}",
                self.api_version
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn format_follows_api_version() {
        assert_eq!(ClientConfig::new("http://rd").format(), Format::Json);
        assert_eq!(ClientConfig::new("http://rd").with_api_version(12).format(), Format::Xml);
        assert_eq!(
            ClientConfig::new("http://rd").with_format(Format::Xml).format(),
            Format::Xml
        );
    }

    #[test]
    fn content_type_ignores_parameters() {
        assert_eq!(Format::from_content_type("application/json;charset=utf-8"), Some(Format::Json));
        assert_eq!(Format::from_content_type("text/xml"), Some(Format::Xml));
        assert_eq!(Format::from_content_type("application/yaml"), None);
    }

    #[test]
    fn validate_rejects_bad_settings() {
        assert!(matches!(ClientConfig::new("").validate(), Err(Error::Option(_))));
        assert!(matches!(ClientConfig::new("rundeck:4440").validate(), Err(Error::Option(_))));
        assert!(matches!(
            ClientConfig::new("http://rd").with_api_version(10).validate(),
            Err(Error::Option(_))
        ));
        assert!(matches!(
            ClientConfig::new("http://rd")
                .with_api_version(12)
                .with_format(Format::Json)
                .validate(),
            Err(Error::Option(_))
        ));
        assert!(ClientConfig::new("https://rd").with_api_version(11).validate().is_ok());
    }

    #[test]
    fn from_lookup_reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("RUNDECK_URL", "http://rundeck:4440"),
            ("RUNDECK_API_VERSION", "18"),
            ("RUNDECK_FORMAT", "XML"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://rundeck:4440");
        assert_eq!(config.api_version, 18);
        assert_eq!(config.format(), Format::Xml);
    }

    #[test]
    fn from_lookup_applies_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[("RUNDECK_URL", "http://rd")])).unwrap();
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.format, None);
    }

    #[test]
    fn from_lookup_requires_url() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Option(_)));
    }

    #[test]
    fn from_lookup_rejects_garbage_version() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("RUNDECK_URL", "http://rd"),
            ("RUNDECK_API_VERSION", "twenty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Option(_)));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"base_url":"http://rd"}"#).unwrap();
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"http://rd","api_version":13,"format":"xml"}"#).unwrap();
        assert_eq!(config.format, Some(Format::Xml));
    }
}
