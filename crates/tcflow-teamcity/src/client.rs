//! TeamCity REST API client
//!
//! Implements every [`Remote`] seam except the SSH key workflow, which lives
//! in [`crate::ssh_keys`] because it goes through the admin UI instead.

use crate::error::{Result, TeamCityError};
use crate::wire::{self, WireEntity};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tcflow_core::model::{BuildFeature, BuildTypeRef, ProjectRef, Trigger};
use tcflow_core::{Gateway, ParentLookup, Remote, SshKeyWorkflow};

/// How requests authenticate
#[derive(Clone)]
pub enum Auth {
    /// Access token, sent as a bearer token
    Token(String),
    /// HTTP basic auth
    Basic { username: String, password: String },
    /// Anonymous access through the guest account
    Guest,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Token(_) => f.write_str("Token(<redacted>)"),
            Auth::Basic { username, .. } => write!(f, "Basic({})", username),
            Auth::Guest => f.write_str("Guest"),
        }
    }
}

/// TeamCity server client
pub struct TeamCityClient {
    client: reqwest::Client,
    base_url: String,
    auth: Auth,
}

impl TeamCityClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(TeamCityError::InvalidConfig(format!(
                "server address must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("tcflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::debug!("TeamCity client for {} ({:?})", base_url, auth);
        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an authenticated request for a server-relative path
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.auth {
            Auth::Token(token) => builder.bearer_auth(token),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Auth::Guest => builder,
        }
    }

    fn rest_path(&self, path: &str) -> String {
        match self.auth {
            Auth::Guest => format!("/guestAuth/app/rest{}", path),
            _ => format!("/app/rest{}", path),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let response = self
            .request(Method::GET, &self.rest_path(path))
            .send()
            .await?;
        let response = check_status(response, what).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        what: &str,
    ) -> Result<T> {
        let response = self
            .request(Method::POST, &self.rest_path(path))
            .json(body)
            .send()
            .await?;
        let response = check_status(response, what).await?;
        Ok(response.json().await?)
    }

    async fn delete_path(&self, path: &str, what: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &self.rest_path(path))
            .send()
            .await?;
        check_status(response, what).await?;
        Ok(())
    }

    /// Look up a build configuration
    pub async fn build_type(&self, id: &str) -> Result<BuildTypeRef> {
        self.get_json(
            &format!("/buildTypes/id:{}", id),
            &format!("build configuration {}", id),
        )
        .await
    }

    /// Look up a project
    pub async fn project(&self, id: &str) -> Result<ProjectRef> {
        self.get_json(&format!("/projects/id:{}", id), &format!("project {}", id))
            .await
    }

    pub async fn create_trigger(&self, build_type_id: &str, trigger: &Trigger) -> Result<String> {
        let body = wire::encode_trigger(trigger)?;
        let created: WireEntity = self
            .post_json(
                &format!("/buildTypes/id:{}/triggers", build_type_id),
                &body,
                &format!("build configuration {}", build_type_id),
            )
            .await?;
        created_id(created, "trigger")
    }

    pub async fn trigger(&self, build_type_id: &str, id: &str) -> Result<Trigger> {
        let wire: WireEntity = self
            .get_json(
                &format!("/buildTypes/id:{}/triggers/{}", build_type_id, id),
                &format!("trigger {}", id),
            )
            .await?;
        Ok(wire::decode_trigger(build_type_id, wire))
    }

    pub async fn delete_trigger(&self, build_type_id: &str, id: &str) -> Result<()> {
        self.delete_path(
            &format!("/buildTypes/id:{}/triggers/{}", build_type_id, id),
            &format!("trigger {}", id),
        )
        .await
    }

    pub async fn create_feature(
        &self,
        build_type_id: &str,
        feature: &BuildFeature,
    ) -> Result<String> {
        let body = wire::encode_feature(feature)?;
        let created: WireEntity = self
            .post_json(
                &format!("/buildTypes/id:{}/features", build_type_id),
                &body,
                &format!("build configuration {}", build_type_id),
            )
            .await?;
        created_id(created, "build feature")
    }

    pub async fn feature(&self, build_type_id: &str, id: &str) -> Result<BuildFeature> {
        let wire: WireEntity = self
            .get_json(
                &format!("/buildTypes/id:{}/features/{}", build_type_id, id),
                &format!("build feature {}", id),
            )
            .await?;
        wire::decode_feature(build_type_id, wire)
    }

    pub async fn delete_feature(&self, build_type_id: &str, id: &str) -> Result<()> {
        self.delete_path(
            &format!("/buildTypes/id:{}/features/{}", build_type_id, id),
            &format!("build feature {}", id),
        )
        .await
    }
}

/// Map error statuses; 404 means the addressed object does not exist
async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(TeamCityError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TeamCityError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

fn created_id(created: WireEntity, what: &str) -> Result<String> {
    created
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| TeamCityError::Protocol(format!("created {} has no id", what)))
}

#[async_trait]
impl ParentLookup for TeamCityClient {
    async fn build_type(&self, id: &str) -> tcflow_core::Result<BuildTypeRef> {
        Ok(TeamCityClient::build_type(self, id).await?)
    }

    async fn project(&self, id: &str) -> tcflow_core::Result<ProjectRef> {
        Ok(TeamCityClient::project(self, id).await?)
    }
}

#[async_trait]
impl Gateway<Trigger> for TeamCityClient {
    async fn create(&self, build_type_id: &str, entity: &Trigger) -> tcflow_core::Result<String> {
        Ok(self.create_trigger(build_type_id, entity).await?)
    }

    async fn get_by_id(&self, build_type_id: &str, id: &str) -> tcflow_core::Result<Trigger> {
        Ok(self.trigger(build_type_id, id).await?)
    }

    async fn delete(&self, build_type_id: &str, id: &str) -> tcflow_core::Result<()> {
        Ok(self.delete_trigger(build_type_id, id).await?)
    }
}

#[async_trait]
impl Gateway<BuildFeature> for TeamCityClient {
    async fn create(
        &self,
        build_type_id: &str,
        entity: &BuildFeature,
    ) -> tcflow_core::Result<String> {
        Ok(self.create_feature(build_type_id, entity).await?)
    }

    async fn get_by_id(&self, build_type_id: &str, id: &str) -> tcflow_core::Result<BuildFeature> {
        Ok(self.feature(build_type_id, id).await?)
    }

    async fn delete(&self, build_type_id: &str, id: &str) -> tcflow_core::Result<()> {
        Ok(self.delete_feature(build_type_id, id).await?)
    }
}

impl Remote for TeamCityClient {
    fn parents(&self) -> &dyn ParentLookup {
        self
    }

    fn triggers(&self) -> &dyn Gateway<Trigger> {
        self
    }

    fn features(&self) -> &dyn Gateway<BuildFeature> {
        self
    }

    fn ssh_keys(&self) -> &dyn SshKeyWorkflow {
        self
    }
}
