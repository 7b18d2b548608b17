use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, ProjectInfo, ProjectSummary};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn yaml_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/yaml")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

const GOOD_POLICY: &str = "description: admin\ncontext:\n  application: rundeck\nfor:\n  project:\n    - allow: '*'\nby:\n  group: admin\n";

// --- projects ---

#[tokio::test]
async fn list_projects_empty() {
    let resp = app().oneshot(empty_request("GET", "/api/21/projects")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let projects: Vec<ProjectSummary> = body_json(resp).await;
    assert!(projects.is_empty());
}

#[tokio::test]
async fn create_project_returns_201() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/21/projects",
            r#"{"name":"ops","config":{"project.description":"Operations"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let info: ProjectInfo = body_json(resp).await;
    assert_eq!(info.name, "ops");
    assert_eq!(info.url, "/api/21/project/ops");
    assert_eq!(info.description, "Operations");
    assert_eq!(info.config["project.name"], "ops");
}

#[tokio::test]
async fn create_project_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/21/projects", r#"{"not_name":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_project_not_found() {
    let resp = app().oneshot(empty_request("GET", "/api/21/project/nope")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn delete_project_not_found() {
    let resp = app()
        .oneshot(empty_request("DELETE", "/api/21/project/nope"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_config_of_missing_project_returns_404() {
    let resp = app()
        .oneshot(json_request("PUT", "/api/21/project/nope/config", r#"{"a":"b"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- system ACL ---

#[tokio::test]
async fn create_incomplete_policy_returns_validation_body() {
    let resp = app()
        .oneshot(yaml_request(
            "POST",
            "/api/21/system/acl/bad.aclpolicy",
            "description: nope\nfor:\n  project: []\nby:\n  group: x\n",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["policies"][0]["policy"], "bad");
    assert_eq!(body["policies"][0]["errors"][0], "missing context");
}

#[tokio::test]
async fn policy_path_without_suffix_is_404() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/21/system/acl/admin.yaml"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_missing_policy_returns_404() {
    let resp = app()
        .oneshot(yaml_request("PUT", "/api/21/system/acl/ghost.aclpolicy", GOOD_POLICY))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full lifecycle ---

#[tokio::test]
async fn project_and_policy_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create project
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/21/projects", r#"{"name":"ops"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // duplicate create — 409
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/21/projects", r#"{"name":"ops"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // replace config
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            "/api/21/project/ops/config",
            r#"{"project.description":"Ops"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // get reflects the new description
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/api/21/project/ops"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let info: ProjectInfo = body_json(resp).await;
    assert_eq!(info.description, "Ops");

    // create policy
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(yaml_request("POST", "/api/21/system/acl/admin.aclpolicy", GOOD_POLICY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // fetch policy — raw YAML back
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/api/21/system/acl/admin.aclpolicy"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "application/yaml"
    );
    assert_eq!(body_bytes(resp).await, GOOD_POLICY.as_bytes());

    // list policies
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/api/21/system/acl/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let listing: serde_json::Value = body_json(resp).await;
    assert_eq!(listing["type"], "directory");
    assert_eq!(listing["resources"][0]["name"], "admin.aclpolicy");

    // delete policy and project
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", "/api/21/system/acl/admin.aclpolicy"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", "/api/21/project/ops"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // list after delete — empty
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/api/21/projects"))
        .await
        .unwrap();
    let projects: Vec<ProjectSummary> = body_json(resp).await;
    assert!(projects.is_empty());
}
