//! Wire schemas for request and response bodies.
//!
//! Nothing here leaves the crate. Each response schema converts into its
//! domain type through an explicit `From` impl so a renamed field fails to
//! compile instead of silently dropping data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{AclPolicies, AclPolicyResource, Project, ProjectConfig};

// ---------------------------------------------------------------------------
// JSON (API 14+)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectInfo {
    #[serde(default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: Option<BTreeMap<String, String>>,
}

impl From<ProjectInfo> for Project {
    fn from(info: ProjectInfo) -> Self {
        Project {
            url: info.url,
            name: info.name,
            description: info.description.unwrap_or_default(),
            properties: info.config.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectListEntry {
    #[serde(default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<ProjectListEntry> for Project {
    fn from(entry: ProjectListEntry) -> Self {
        Project {
            url: entry.url,
            name: entry.name,
            description: entry.description.unwrap_or_default(),
            properties: ProjectConfig::new(),
        }
    }
}

/// `GET /projects` answers with a bare array. An empty listing may also come
/// back as a counted object, `{"count":0}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProjectList {
    Entries(Vec<ProjectListEntry>),
    Counted {
        count: usize,
        #[serde(default)]
        projects: Vec<ProjectListEntry>,
    },
}

impl ProjectList {
    /// Entries in server order. A counted listing must hold exactly `count`
    /// entries.
    pub fn into_entries(self) -> Result<Vec<ProjectListEntry>, String> {
        match self {
            ProjectList::Entries(entries) => Ok(entries),
            ProjectList::Counted { count, projects } if count == projects.len() => Ok(projects),
            ProjectList::Counted { count, projects } => Err(format!(
                "project listing announces {count} entries but holds {}",
                projects.len()
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProjectCreation<'a> {
    pub name: &'a str,
    pub config: &'a ProjectConfig,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AclResponse {
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub resources: Vec<AclResource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AclResource {
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub href: String,
}

impl From<AclResponse> for AclPolicies {
    fn from(response: AclResponse) -> Self {
        AclPolicies {
            path: response.path,
            kind: response.kind,
            href: response.href,
            resources: response.resources.into_iter().map(AclPolicyResource::from).collect(),
        }
    }
}

impl From<AclResource> for AclPolicyResource {
    fn from(resource: AclResource) -> Self {
        AclPolicyResource {
            path: resource.path,
            kind: resource.kind,
            name: resource.name,
            href: resource.href,
        }
    }
}

/// Body of a 4xx answer to an ACL policy upload.
#[derive(Debug, Deserialize)]
pub(crate) struct FailedAclValidation {
    pub policies: Vec<PolicyFailure>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PolicyFailure {
    pub policy: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// XML (API 11+)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct XmlProject {
    #[serde(rename = "@url", default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: XmlConfig,
}

impl From<XmlProject> for Project {
    fn from(project: XmlProject) -> Self {
        Project {
            url: project.url,
            name: project.name,
            description: project.description,
            properties: project.config.into_map(),
        }
    }
}

/// `<projects count="N">` with zero or more `<project>` children.
#[derive(Debug, Deserialize)]
pub(crate) struct XmlProjectList {
    #[serde(rename = "project", default)]
    pub projects: Vec<XmlProject>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct XmlConfig {
    #[serde(rename = "property", default)]
    pub properties: Vec<XmlProperty>,
}

impl XmlConfig {
    pub fn from_map(config: &ProjectConfig) -> Self {
        XmlConfig {
            properties: config
                .iter()
                .map(|(key, value)| XmlProperty {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }

    pub fn into_map(self) -> ProjectConfig {
        self.properties
            .into_iter()
            .map(|property| (property.key, property.value))
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct XmlProperty {
    #[serde(rename = "@key")]
    pub key: String,
    #[serde(rename = "@value", default)]
    pub value: String,
}

/// Serialized under a `<project>` root.
#[derive(Debug, Serialize)]
pub(crate) struct XmlProjectCreation<'a> {
    pub name: &'a str,
    pub config: XmlConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_info_fills_missing_fields() {
        let info: ProjectInfo = serde_json::from_str(r#"{"name":"ops","description":null}"#).unwrap();
        let project = Project::from(info);
        assert_eq!(project.name, "ops");
        assert_eq!(project.url, "");
        assert_eq!(project.description, "");
        assert!(project.properties.is_empty());
    }

    #[test]
    fn counted_project_list_shapes() {
        let list: ProjectList = serde_json::from_str(r#"{"count":0}"#).unwrap();
        assert!(list.into_entries().unwrap().is_empty());

        let list: ProjectList =
            serde_json::from_str(r#"{"count":1,"projects":[{"name":"ops"}]}"#).unwrap();
        assert_eq!(list.into_entries().unwrap()[0].name, "ops");

        let list: ProjectList = serde_json::from_str(r#"{"count":2}"#).unwrap();
        assert!(list.into_entries().is_err());

        assert!(serde_json::from_str::<ProjectList>(r#"{"total":0}"#).is_err());
    }

    #[test]
    fn xml_project_reads_attributes_and_properties() {
        let xml = r#"<project url="http://rd/api/21/project/ops">
            <name>ops</name>
            <description>Operations</description>
            <config>
                <property key="project.name" value="ops"/>
                <property key="resources.source.1.type" value="local"/>
            </config>
        </project>"#;
        let project = Project::from(quick_xml::de::from_str::<XmlProject>(xml).unwrap());
        assert_eq!(project.url, "http://rd/api/21/project/ops");
        assert_eq!(project.description, "Operations");
        assert_eq!(project.properties.len(), 2);
        assert_eq!(project.properties["resources.source.1.type"], "local");
    }

    #[test]
    fn xml_creation_writes_property_attributes() {
        let mut config = ProjectConfig::new();
        config.insert("a.b".to_string(), "c".to_string());
        let body = quick_xml::se::to_string_with_root(
            "project",
            &XmlProjectCreation {
                name: "ops",
                config: XmlConfig::from_map(&config),
            },
        )
        .unwrap();
        assert!(body.starts_with("<project>"), "{body}");
        assert!(body.contains("<name>ops</name>"), "{body}");
        assert!(body.contains(r#"<property key="a.b" value="c"/>"#), "{body}");
    }
}
