//! Stateless HTTP request builder and response parser for the Rundeck API.
//!
//! # Design
//! `RundeckClient` holds only the base URL, API version and body format, and
//! carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. `BlockingClient` glues the two halves to a
//! `Transport`.

use serde::de::DeserializeOwned;
use urlencoding::encode;

use crate::config::{ClientConfig, Format, DEFAULT_API_VERSION, JSON_API_VERSION};
use crate::error::{Error, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AclPolicies, Project, ProjectConfig};
use crate::validation::classify_validation_failure;
use crate::wire;

const YAML: &str = "application/yaml";
const JSON: &str = "application/json";
const POLICY_SUFFIX: &str = ".aclpolicy";

/// Longest body preview written to the log on an unexpected status.
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Synchronous, stateless client for the Rundeck API.
#[derive(Debug, Clone)]
pub struct RundeckClient {
    base_url: String,
    api_version: u32,
    format: Format,
}

impl RundeckClient {
    /// Client for the default API version, speaking JSON.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION,
            format: Format::Json,
        }
    }

    /// Client for a validated configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            api_version: config.api_version,
            format: config.format(),
        })
    }

    /// Version number placed in every request path.
    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    /// Format requested for project bodies.
    pub fn format(&self) -> Format {
        self.format
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}/{path}", self.base_url, self.api_version)
    }

    fn require_json_api(&self, endpoint: &str) -> Result<(), Error> {
        if self.api_version < JSON_API_VERSION {
            return Err(Error::Option(format!(
                "{endpoint} requires API version {JSON_API_VERSION} or later, client uses {}",
                self.api_version
            )));
        }
        Ok(())
    }

    fn request(&self, method: HttpMethod, path: &str, accept: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(path),
            headers: vec![("accept".to_string(), accept.to_string())],
            body: None,
        }
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn build_list_projects(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "projects", self.format.mime())
    }

    pub fn build_get_project(&self, name: &str) -> Result<HttpRequest, Error> {
        let name = identifier("project", name)?;
        Ok(self.request(HttpMethod::Get, &format!("project/{}", encode(name)), self.format.mime()))
    }

    pub fn build_create_project(&self, name: &str, properties: &ProjectConfig) -> Result<HttpRequest, Error> {
        let name = identifier("project", name)?;
        let body = match self.format {
            Format::Json => serde_json::to_vec(&wire::ProjectCreation {
                name,
                config: properties,
            })
            .map_err(|e| Error::Encode(e.to_string()))?,
            Format::Xml => quick_xml::se::to_string_with_root(
                "project",
                &wire::XmlProjectCreation {
                    name,
                    config: wire::XmlConfig::from_map(properties),
                },
            )
            .map_err(|e| Error::Encode(e.to_string()))?
            .into_bytes(),
        };
        let mut req = self.request(HttpMethod::Post, "projects", self.format.mime());
        req.headers.push(("content-type".to_string(), self.format.mime().to_string()));
        req.body = Some(body);
        Ok(req)
    }

    pub fn build_delete_project(&self, name: &str) -> Result<HttpRequest, Error> {
        let name = identifier("project", name)?;
        Ok(self.request(HttpMethod::Delete, &format!("project/{}", encode(name)), self.format.mime()))
    }

    pub fn build_get_project_config(&self, name: &str) -> Result<HttpRequest, Error> {
        self.require_json_api("project configuration")?;
        let name = identifier("project", name)?;
        Ok(self.request(HttpMethod::Get, &format!("project/{}/config", encode(name)), JSON))
    }

    pub fn build_update_project_config(&self, name: &str, config: &ProjectConfig) -> Result<HttpRequest, Error> {
        self.require_json_api("project configuration")?;
        let name = identifier("project", name)?;
        let body = serde_json::to_vec(config).map_err(|e| Error::Encode(e.to_string()))?;
        let mut req = self.request(HttpMethod::Put, &format!("project/{}/config", encode(name)), JSON);
        req.headers.push(("content-type".to_string(), JSON.to_string()));
        req.body = Some(body);
        Ok(req)
    }

    pub fn parse_list_projects(&self, response: HttpResponse) -> Result<Vec<Project>, Error> {
        check_status(&response, 200)?;
        match self.response_format(&response) {
            Format::Json => {
                let list: wire::ProjectList = decode_json(&response.body)?;
                let entries = list.into_entries().map_err(Error::Decode)?;
                Ok(entries.into_iter().map(Project::from).collect())
            }
            Format::Xml => {
                let list: wire::XmlProjectList = decode_xml(&response.body)?;
                Ok(list.projects.into_iter().map(Project::from).collect())
            }
        }
    }

    pub fn parse_get_project(&self, response: HttpResponse) -> Result<Project, Error> {
        check_status(&response, 200)?;
        self.decode_project(&response)
    }

    pub fn parse_create_project(&self, response: HttpResponse) -> Result<Project, Error> {
        check_status(&response, 201)?;
        self.decode_project(&response)
    }

    pub fn parse_delete_project(&self, response: HttpResponse) -> Result<(), Error> {
        check_status(&response, 204)?;
        Ok(())
    }

    pub fn parse_get_project_config(&self, response: HttpResponse) -> Result<ProjectConfig, Error> {
        check_status(&response, 200)?;
        decode_json(&response.body)
    }

    pub fn parse_update_project_config(&self, response: HttpResponse) -> Result<ProjectConfig, Error> {
        check_status(&response, 200)?;
        decode_json(&response.body)
    }

    /// Content negotiation: a JSON or XML `Content-Type` wins, otherwise the
    /// format that was requested.
    fn response_format(&self, response: &HttpResponse) -> Format {
        response
            .header("content-type")
            .and_then(Format::from_content_type)
            .unwrap_or(self.format)
    }

    fn decode_project(&self, response: &HttpResponse) -> Result<Project, Error> {
        match self.response_format(response) {
            Format::Json => decode_json::<wire::ProjectInfo>(&response.body).map(Project::from),
            Format::Xml => decode_xml::<wire::XmlProject>(&response.body).map(Project::from),
        }
    }

    // -----------------------------------------------------------------------
    // System ACL policies
    // -----------------------------------------------------------------------

    pub fn build_list_acl_policies(&self) -> Result<HttpRequest, Error> {
        self.require_json_api("system ACL")?;
        Ok(self.request(HttpMethod::Get, "system/acl/", JSON))
    }

    pub fn build_get_acl_policy(&self, name: &str) -> Result<HttpRequest, Error> {
        let path = self.policy_path(name)?;
        Ok(self.request(HttpMethod::Get, &path, YAML))
    }

    pub fn build_create_acl_policy(&self, name: &str, contents: &[u8]) -> Result<HttpRequest, Error> {
        self.policy_upload(HttpMethod::Post, name, contents)
    }

    pub fn build_update_acl_policy(&self, name: &str, contents: &[u8]) -> Result<HttpRequest, Error> {
        self.policy_upload(HttpMethod::Put, name, contents)
    }

    pub fn build_delete_acl_policy(&self, name: &str) -> Result<HttpRequest, Error> {
        let path = self.policy_path(name)?;
        Ok(self.request(HttpMethod::Delete, &path, JSON))
    }

    pub fn parse_list_acl_policies(&self, response: HttpResponse) -> Result<AclPolicies, Error> {
        check_status(&response, 200)?;
        decode_json::<wire::AclResponse>(&response.body).map(AclPolicies::from)
    }

    /// Returns the policy document exactly as the server sent it.
    pub fn parse_get_acl_policy(&self, response: HttpResponse) -> Result<Vec<u8>, Error> {
        check_status(&response, 200)?;
        Ok(response.body)
    }

    pub fn parse_create_acl_policy(&self, response: HttpResponse) -> Result<(), Error> {
        parse_policy_upload(&response)
    }

    pub fn parse_update_acl_policy(&self, response: HttpResponse) -> Result<(), Error> {
        parse_policy_upload(&response)
    }

    pub fn parse_delete_acl_policy(&self, response: HttpResponse) -> Result<(), Error> {
        check_status(&response, 204)?;
        Ok(())
    }

    fn policy_path(&self, name: &str) -> Result<String, Error> {
        self.require_json_api("system ACL")?;
        let name = identifier("ACL policy", name.strip_suffix(POLICY_SUFFIX).unwrap_or(name))?;
        Ok(format!("system/acl/{}{POLICY_SUFFIX}", encode(name)))
    }

    fn policy_upload(&self, method: HttpMethod, name: &str, contents: &[u8]) -> Result<HttpRequest, Error> {
        let path = self.policy_path(name)?;
        let mut req = self.request(method, &path, JSON);
        req.headers.push(("content-type".to_string(), YAML.to_string()));
        req.body = Some(contents.to_vec());
        Ok(req)
    }
}

/// Validates a path identifier: non-empty, untrimmed, and a single path
/// segment. Callers percent-encode it before placing it in a URL.
fn identifier<'a>(kind: &str, value: &'a str) -> Result<&'a str, Error> {
    if value.is_empty() {
        return Err(Error::Option(format!("{kind} name is empty")));
    }
    if value.trim() != value {
        return Err(Error::Option(format!(
            "{kind} name {value:?} has leading or trailing whitespace"
        )));
    }
    if value.contains('/') {
        return Err(Error::Option(format!("{kind} name {value:?} must not contain '/'")));
    }
    Ok(value)
}

/// Rejected uploads are reported as a validation error when the body says
/// which policies failed, and as the raw transport error otherwise.
fn parse_policy_upload(response: &HttpResponse) -> Result<(), Error> {
    match check_status(response, 201) {
        Ok(()) => Ok(()),
        Err(err) => Err(classify_validation_failure(&response.body).unwrap_or(Error::Transport(err))),
    }
}

fn check_status(response: &HttpResponse, expected: u16) -> Result<(), TransportError> {
    if response.status == expected {
        return Ok(());
    }
    let body = response.body_text();
    tracing::warn!(
        status = response.status,
        expected,
        body = %preview_for_log(&body),
        "unexpected response status"
    );
    Err(TransportError::UnexpectedStatus {
        status: response.status,
        expected,
        body,
    })
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|e| Error::Decode(e.to_string()))
}

fn decode_xml<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    let text = std::str::from_utf8(body).map_err(|e| Error::Decode(e.to_string()))?;
    quick_xml::de::from_str(text).map_err(|e| Error::Decode(e.to_string()))
}

/// Truncates and strips control characters so a hostile body cannot flood or
/// garble the log.
fn preview_for_log(body: &str) -> String {
    let char_count = body.chars().count();
    let mut preview: String = body
        .chars()
        .take(MAX_LOG_BODY_LENGTH)
        .filter(|c| !c.is_control())
        .collect();
    if char_count > MAX_LOG_BODY_LENGTH {
        preview.push_str(&format!("... [truncated, {} bytes total]", body.len()));
    }
    preview
}
