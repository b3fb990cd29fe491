//! SSH key upload through the TeamCity admin UI
//!
//! The REST API has no endpoint for uploading SSH keys, so this drives the
//! same HTML forms the browser uses and scrapes the pages that come back.
//! The server assigns no id to an uploaded key; the caller gets the
//! project's internal id and builds an identity from it.

use crate::client::TeamCityClient;
use crate::error::{Result, TeamCityError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use std::sync::LazyLock;
use tcflow_core::SshKeyWorkflow;

const UPLOAD_PATH: &str = "/admin/sshKeys.html";
const MANAGER_PATH: &str = "/admin/editProject.html";
const ACTIONS_PATH: &str = "/admin/sshKeysActions.html";

const REJECTION_MARKER: &str = "parent.BS.SshKeysDialog.error";

static REJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"parent\.BS\.SshKeysDialog\.error\("([^\)]+)"\)"#)
        .expect("rejection pattern is valid")
});

static DELETE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"BS\.SshKeysDialog\.deleteKey\('([^']+)'").expect("delete key pattern is valid")
});

/// Admin pages are HTML, not REST resources
fn admin_request(client: &TeamCityClient, method: Method, path: &str) -> RequestBuilder {
    client.request(method, path).header(ACCEPT, "text/html")
}

/// Body of a successful admin page response
async fn page_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(TeamCityError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Error message of an upload response, if the dialog reported one
pub fn parse_rejection(body: &str) -> Option<String> {
    if !body.contains(REJECTION_MARKER) {
        return None;
    }
    let message = REJECTION
        .captures(body)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "TeamCity rejected the SSH key upload".to_string());
    Some(message)
}

/// Internal project id from the first key listed on the SSH manager page
pub fn parse_project_internal_id(body: &str) -> Option<String> {
    DELETE_KEY.captures(body).map(|caps| caps[1].to_string())
}

impl TeamCityClient {
    /// Upload a key and return the internal id of its project
    pub async fn upload_ssh_key(
        &self,
        project_id: &str,
        name: &str,
        payload: &[u8],
    ) -> Result<String> {
        let form = Form::new()
            .text("action", "createSshKey")
            .text("projectId", project_id.to_string())
            .text("fileName", name.to_string())
            .part(
                "file:fileToUpload",
                Part::bytes(payload.to_vec()).file_name(name.to_string()),
            );

        let response = admin_request(self, Method::POST, UPLOAD_PATH)
            .multipart(form)
            .send()
            .await?;
        tracing::debug!("SSH key upload returned {}", response.status());
        let body = page_body(response).await?;

        if let Some(message) = parse_rejection(&body) {
            return Err(TeamCityError::Rejected(message));
        }

        let response = admin_request(self, Method::GET, MANAGER_PATH)
            .query(&[("projectId", project_id), ("tab", "ssh-manager")])
            .send()
            .await?;
        let page = page_body(response).await?;

        parse_project_internal_id(&page).ok_or_else(|| {
            TeamCityError::Protocol(format!(
                "SSH manager page of project {} lists no keys after upload of '{}'",
                project_id, name
            ))
        })
    }

    /// Delete a key. Only a failure to reach the server is an error.
    pub async fn delete_ssh_key(&self, project_internal_id: &str, name: &str) -> Result<()> {
        let form = Form::new()
            .text("action", "deleteSshKey")
            .text("projectId", project_internal_id.to_string())
            .text("keyName", name.to_string());

        let response = admin_request(self, Method::POST, ACTIONS_PATH)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                "Deleting SSH key '{}' of project {} returned {}",
                name,
                project_internal_id,
                status
            );
        }
        Ok(())
    }
}

#[async_trait]
impl SshKeyWorkflow for TeamCityClient {
    async fn create(
        &self,
        project_id: &str,
        name: &str,
        payload: &[u8],
    ) -> tcflow_core::Result<String> {
        Ok(self.upload_ssh_key(project_id, name, payload).await?)
    }

    async fn delete(&self, project_internal_id: &str, name: &str) -> tcflow_core::Result<()> {
        Ok(self.delete_ssh_key(project_internal_id, name).await?)
    }
}
