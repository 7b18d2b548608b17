use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};

const POLICY_SUFFIX: &str = ".aclpolicy";

/// Request bodies past axum's 2 MB default are still accepted.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub url: String,
    pub name: String,
    pub description: String,
    pub config: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub url: String,
    pub name: String,
    pub description: String,
}

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

#[derive(Default)]
pub struct Store {
    projects: BTreeMap<String, BTreeMap<String, String>>,
    policies: BTreeMap<String, String>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/{version}/projects", get(list_projects).post(create_project))
        .route("/api/{version}/project/{name}", get(get_project).delete(delete_project))
        .route(
            "/api/{version}/project/{name}/config",
            get(get_project_config).put(update_project_config),
        )
        .route("/api/{version}/system/acl/", get(list_policies))
        .route(
            "/api/{version}/system/acl/{file}",
            get(get_policy)
                .post(create_policy)
                .put(update_policy)
                .delete(delete_policy),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": true, "message": message }))).into_response()
}

fn project_url(version: &str, name: &str) -> String {
    format!("/api/{version}/project/{name}")
}

fn project_info(version: &str, name: &str, config: &BTreeMap<String, String>) -> ProjectInfo {
    ProjectInfo {
        url: project_url(version, name),
        name: name.to_string(),
        description: config.get("project.description").cloned().unwrap_or_default(),
        config: config.clone(),
    }
}

// --- projects ---

async fn list_projects(State(db): State<Db>, Path(version): Path<String>) -> Json<Vec<ProjectSummary>> {
    let store = db.read().await;
    Json(
        store
            .projects
            .iter()
            .map(|(name, config)| ProjectSummary {
                url: project_url(&version, name),
                name: name.clone(),
                description: config.get("project.description").cloned().unwrap_or_default(),
            })
            .collect(),
    )
}

async fn create_project(
    State(db): State<Db>,
    Path(version): Path<String>,
    Json(input): Json<CreateProject>,
) -> Response {
    let mut store = db.write().await;
    if store.projects.contains_key(&input.name) {
        return error(StatusCode::CONFLICT, format!("project {} already exists", input.name));
    }
    let mut config = input.config;
    config.insert("project.name".to_string(), input.name.clone());
    let info = project_info(&version, &input.name, &config);
    store.projects.insert(input.name, config);
    (StatusCode::CREATED, Json(info)).into_response()
}

async fn get_project(State(db): State<Db>, Path((version, name)): Path<(String, String)>) -> Response {
    let store = db.read().await;
    match store.projects.get(&name) {
        Some(config) => Json(project_info(&version, &name, config)).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("project {name} does not exist")),
    }
}

async fn delete_project(State(db): State<Db>, Path((_version, name)): Path<(String, String)>) -> Response {
    let mut store = db.write().await;
    match store.projects.remove(&name) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, format!("project {name} does not exist")),
    }
}

async fn get_project_config(State(db): State<Db>, Path((_version, name)): Path<(String, String)>) -> Response {
    let store = db.read().await;
    match store.projects.get(&name) {
        Some(config) => Json(config.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("project {name} does not exist")),
    }
}

async fn update_project_config(
    State(db): State<Db>,
    Path((_version, name)): Path<(String, String)>,
    Json(config): Json<BTreeMap<String, String>>,
) -> Response {
    let mut store = db.write().await;
    match store.projects.get_mut(&name) {
        Some(stored) => {
            *stored = config;
            Json(stored.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, format!("project {name} does not exist")),
    }
}

// --- system ACL ---

/// Sections every policy document must declare.
const REQUIRED_SECTIONS: [&str; 3] = ["context", "for", "by"];

/// Reasons the document is rejected, empty when it is acceptable.
pub fn policy_errors(contents: &str) -> Vec<String> {
    REQUIRED_SECTIONS
        .iter()
        .filter(|section| {
            let key = format!("{section}:");
            !contents.lines().any(|line| line.trim_start().starts_with(&key))
        })
        .map(|section| format!("missing {section}"))
        .collect()
}

fn policy_name(file: &str) -> Option<&str> {
    file.strip_suffix(POLICY_SUFFIX).filter(|name| !name.is_empty())
}

fn validation_failure(name: &str, errors: Vec<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "valid": false,
            "policies": [{ "policy": name, "errors": errors }],
        })),
    )
        .into_response()
}

async fn list_policies(State(db): State<Db>, Path(version): Path<String>) -> Json<serde_json::Value> {
    let store = db.read().await;
    let base = format!("/api/{version}/system/acl/");
    let resources: Vec<serde_json::Value> = store
        .policies
        .keys()
        .map(|name| {
            let file = format!("{name}{POLICY_SUFFIX}");
            json!({ "path": file, "type": "file", "name": file, "href": format!("{base}{file}") })
        })
        .collect();
    Json(json!({ "path": "", "type": "directory", "href": base, "resources": resources }))
}

async fn get_policy(State(db): State<Db>, Path((_version, file)): Path<(String, String)>) -> Response {
    let store = db.read().await;
    match policy_name(&file).and_then(|name| store.policies.get(name)) {
        Some(contents) => ([(header::CONTENT_TYPE, "application/yaml")], contents.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("policy {file} does not exist")),
    }
}

async fn create_policy(
    State(db): State<Db>,
    Path((_version, file)): Path<(String, String)>,
    contents: String,
) -> Response {
    let Some(name) = policy_name(&file) else {
        return error(StatusCode::NOT_FOUND, format!("{file} is not a policy file"));
    };
    let mut store = db.write().await;
    if store.policies.contains_key(name) {
        return error(StatusCode::CONFLICT, format!("policy {file} already exists"));
    }
    let errors = policy_errors(&contents);
    if !errors.is_empty() {
        return validation_failure(name, errors);
    }
    store.policies.insert(name.to_string(), contents.clone());
    (StatusCode::CREATED, Json(json!({ "contents": contents }))).into_response()
}

async fn update_policy(
    State(db): State<Db>,
    Path((_version, file)): Path<(String, String)>,
    contents: String,
) -> Response {
    let Some(name) = policy_name(&file) else {
        return error(StatusCode::NOT_FOUND, format!("{file} is not a policy file"));
    };
    let mut store = db.write().await;
    if !store.policies.contains_key(name) {
        return error(StatusCode::NOT_FOUND, format!("policy {file} does not exist"));
    }
    let errors = policy_errors(&contents);
    if !errors.is_empty() {
        return validation_failure(name, errors);
    }
    store.policies.insert(name.to_string(), contents.clone());
    (StatusCode::CREATED, Json(json!({ "contents": contents }))).into_response()
}

async fn delete_policy(State(db): State<Db>, Path((_version, file)): Path<(String, String)>) -> Response {
    let mut store = db.write().await;
    match policy_name(&file).and_then(|name| store.policies.remove(name)) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, format!("policy {file} does not exist")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_policy_has_no_errors() {
        let doc = "description: admin\ncontext:\n  application: rundeck\nfor:\n  project:\n    - allow: read\nby:\n  group: admin\n";
        assert!(policy_errors(doc).is_empty());
    }

    #[test]
    fn missing_sections_are_reported_in_order() {
        assert_eq!(
            policy_errors("description: nope\n"),
            vec!["missing context", "missing for", "missing by"]
        );
        assert_eq!(policy_errors("context:\nby:\n"), vec!["missing for"]);
    }

    #[test]
    fn policy_name_requires_suffix() {
        assert_eq!(policy_name("admin.aclpolicy"), Some("admin"));
        assert_eq!(policy_name("admin.yaml"), None);
        assert_eq!(policy_name(".aclpolicy"), None);
    }

    #[test]
    fn project_info_uses_description_property() {
        let mut config = BTreeMap::new();
        config.insert("project.description".to_string(), "Ops".to_string());
        let info = project_info("21", "ops", &config);
        assert_eq!(info.url, "/api/21/project/ops");
        assert_eq!(info.description, "Ops");
    }
}
