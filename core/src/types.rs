//! Domain types returned to callers.
//!
//! # Design
//! These are decoupled from the wire schemas in `wire`: the same `Project`
//! comes out of the JSON and the XML decoders, and fields the server omits
//! are filled with empty values so callers never see a half-built entity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Flat project configuration, key → value.
pub type ProjectConfig = BTreeMap<String, String>;

/// A Rundeck project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub url: String,
    pub name: String,
    pub description: String,
    /// Empty for entries coming from the project list.
    pub properties: ProjectConfig,
}

/// The system ACL policy directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AclPolicies {
    pub path: String,
    pub kind: String,
    pub href: String,
    pub resources: Vec<AclPolicyResource>,
}

/// One `.aclpolicy` file in the system ACL directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AclPolicyResource {
    pub path: String,
    pub kind: String,
    pub name: String,
    pub href: String,
}
