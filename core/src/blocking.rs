//! One blocking call per API operation.
//!
//! `BlockingClient` runs `build_*` → `Transport::execute` → `parse_*` and
//! nothing else. It keeps no state besides the client and the transport, so it
//! is as thread-safe as the transport it wraps.

use std::io::Read;

use crate::client::RundeckClient;
use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{AclPolicies, Project, ProjectConfig};

#[derive(Debug, Clone)]
pub struct BlockingClient<T> {
    client: RundeckClient,
    transport: T,
}

impl<T: Transport> BlockingClient<T> {
    pub fn new(client: RundeckClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &RundeckClient {
        &self.client
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let method = request.method.as_str();
        let path = request.path.clone();
        tracing::debug!("{method} {path}");
        let response = self.transport.execute(request)?;
        tracing::debug!(status = response.status, "{method} {path} answered");
        Ok(response)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, Error> {
        let response = self.send(self.client.build_list_projects())?;
        self.client.parse_list_projects(response)
    }

    pub fn get_project(&self, name: &str) -> Result<Project, Error> {
        let response = self.send(self.client.build_get_project(name)?)?;
        self.client.parse_get_project(response)
    }

    pub fn create_project(&self, name: &str, properties: &ProjectConfig) -> Result<Project, Error> {
        let response = self.send(self.client.build_create_project(name, properties)?)?;
        self.client.parse_create_project(response)
    }

    pub fn delete_project(&self, name: &str) -> Result<(), Error> {
        let response = self.send(self.client.build_delete_project(name)?)?;
        self.client.parse_delete_project(response)
    }

    pub fn get_project_config(&self, name: &str) -> Result<ProjectConfig, Error> {
        let response = self.send(self.client.build_get_project_config(name)?)?;
        self.client.parse_get_project_config(response)
    }

    /// Replaces the whole configuration and returns what the server stored.
    pub fn update_project_config(&self, name: &str, config: &ProjectConfig) -> Result<ProjectConfig, Error> {
        let response = self.send(self.client.build_update_project_config(name, config)?)?;
        self.client.parse_update_project_config(response)
    }

    pub fn list_acl_policies(&self) -> Result<AclPolicies, Error> {
        let response = self.send(self.client.build_list_acl_policies()?)?;
        self.client.parse_list_acl_policies(response)
    }

    /// Raw YAML policy document.
    pub fn get_acl_policy(&self, name: &str) -> Result<Vec<u8>, Error> {
        let response = self.send(self.client.build_get_acl_policy(name)?)?;
        self.client.parse_get_acl_policy(response)
    }

    pub fn create_acl_policy<R: Read>(&self, name: &str, contents: R) -> Result<(), Error> {
        let contents = read_contents(contents)?;
        let response = self.send(self.client.build_create_acl_policy(name, &contents)?)?;
        self.client.parse_create_acl_policy(response)
    }

    pub fn update_acl_policy<R: Read>(&self, name: &str, contents: R) -> Result<(), Error> {
        let contents = read_contents(contents)?;
        let response = self.send(self.client.build_update_acl_policy(name, &contents)?)?;
        self.client.parse_update_acl_policy(response)
    }

    pub fn delete_acl_policy(&self, name: &str) -> Result<(), Error> {
        let response = self.send(self.client.build_delete_acl_policy(name)?)?;
        self.client.parse_delete_acl_policy(response)
    }
}

fn read_contents<R: Read>(mut contents: R) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    contents
        .read_to_end(&mut buf)
        .map_err(|e| Error::Encode(format!("reading policy contents: {e}")))?;
    Ok(buf)
}
