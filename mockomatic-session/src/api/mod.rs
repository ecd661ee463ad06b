//! The session API collaborator.
//!
//! The engine never talks to the network itself; the store goes through a
//! [`SessionApi`] so tests can substitute an in-process server.

pub mod records;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MockomaticConfig;
use crate::error::{DraftError, Result};
use crate::state::schema::Template;
use crate::state::template::CreateTemplateRequest;
use crate::submit::CreateSessionRequest;

pub use records::{
    CircuitRecord, RunRecord, SessionRecord, SessionStatus, SlotRecord, StationRecord,
};

#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn get_templates(&self) -> Result<Vec<Template>>;

    async fn create_template(&self, request: &CreateTemplateRequest) -> Result<()>;

    async fn create_session(&self, request: &CreateSessionRequest) -> Result<SessionRecord>;

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>>;

    async fn get_session(&self, id: Uuid) -> Result<SessionRecord>;

    /// Remove sessions by id. Needs an admin token.
    async fn delete_sessions(&self, ids: &[Uuid]) -> Result<()>;

    async fn get_stations(&self, session_id: Uuid) -> Result<Vec<StationRecord>>;

    async fn get_slots(&self, session_id: Uuid) -> Result<Vec<SlotRecord>>;

    async fn get_runs(&self, slot_id: Uuid) -> Result<Vec<RunRecord>>;

    async fn get_circuits(&self, slot_id: Uuid) -> Result<Vec<CircuitRecord>>;
}

#[derive(Debug, Serialize)]
struct IdBody {
    id: Uuid,
}

#[derive(Debug, Serialize)]
struct IdsBody<'a> {
    ids: &'a [Uuid],
}

#[derive(Debug, Deserialize)]
struct ServerError {
    error: String,
}

/// [`SessionApi`] over HTTP with JSON bodies.
pub struct HttpSessionApi {
    base_url: String,
    auth_token: Option<String>,
    csrf_token: Option<String>,
    http: reqwest::Client,
}

impl HttpSessionApi {
    pub fn new(base_url: &str) -> Self {
        HttpSessionApi {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
            csrf_token: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &MockomaticConfig) -> Self {
        let mut api = Self::new(&config.api_base);
        api.auth_token = config.auth_token.clone();
        api.csrf_token = config.csrf_token.clone();
        api
    }

    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    pub fn with_csrf_token(mut self, token: &str) -> Self {
        self.csrf_token = Some(token.to_string());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%method, %url, "api request");
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(token) = &self.csrf_token {
            builder = builder.header("x-csrf-token", token);
        }
        builder
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, id: Option<Uuid>) -> Result<T> {
        let mut builder = self.request(Method::GET, path);
        if let Some(id) = id {
            builder = builder.query(&[("id", id.to_string())]);
        }
        let response = builder.send().await?;
        parse_response(path, response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        parse_response(path, response).await
    }
}

async fn check_status(path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ServerError>(&body) {
        Ok(err) => err.error,
        Err(_) => body,
    };
    warn!(path, %status, %message, "api request failed");
    Err(DraftError::Api(format!("{} {}: {}", path, status, message)))
}

async fn parse_response<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
    let response = check_status(path, response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn get_templates(&self) -> Result<Vec<Template>> {
        let templates: Vec<Template> = self.get_json("templates/get-all", None).await?;
        info!(count = templates.len(), "fetched templates");
        Ok(templates)
    }

    async fn create_template(&self, request: &CreateTemplateRequest) -> Result<()> {
        let path = "templates/create";
        let response = self
            .request(Method::POST, path)
            .json(request)
            .send()
            .await?;
        check_status(path, response).await?;
        info!(name = %request.template_session.name, "created template");
        Ok(())
    }

    async fn create_session(&self, request: &CreateSessionRequest) -> Result<SessionRecord> {
        let record: SessionRecord = self.post_json("sessions/create", request).await?;
        info!(id = %record.id, "created session");
        Ok(record)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        self.get_json("sessions/get-all", None).await
    }

    async fn get_session(&self, id: Uuid) -> Result<SessionRecord> {
        self.post_json("sessions/get", &IdBody { id }).await
    }

    async fn delete_sessions(&self, ids: &[Uuid]) -> Result<()> {
        let path = "sessions/delete";
        let response = self
            .request(Method::POST, path)
            .json(&IdsBody { ids })
            .send()
            .await?;
        check_status(path, response).await?;
        info!(count = ids.len(), "deleted sessions");
        Ok(())
    }

    async fn get_stations(&self, session_id: Uuid) -> Result<Vec<StationRecord>> {
        self.get_json("stations/get-session", Some(session_id)).await
    }

    async fn get_slots(&self, session_id: Uuid) -> Result<Vec<SlotRecord>> {
        self.get_json("slots/get-session", Some(session_id)).await
    }

    async fn get_runs(&self, slot_id: Uuid) -> Result<Vec<RunRecord>> {
        self.get_json("runs/get-slot", Some(slot_id)).await
    }

    async fn get_circuits(&self, slot_id: Uuid) -> Result<Vec<CircuitRecord>> {
        self.get_json("circuits/get-slot", Some(slot_id)).await
    }
}
