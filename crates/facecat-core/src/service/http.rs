//! HTTP adapter for the face service.
//!
//! Uses the curl crate (libcurl) on tokio's blocking pool. Non-2xx
//! responses become [`RemoteError`]s parsed from the service's JSON error
//! body; curl failures become `Transport` (or `OperationTimeout`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

use crate::remote::{ErrorCode, RemoteError};

use super::types::{
    DetectedFace, IdentifyResult, PersistedFaceId, Person, PersonGroup, PersonId, TrainingStatus,
};
use super::FaceService;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const JSON_CONTENT_TYPE: &str = "application/json";
const STREAM_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug)]
enum Body {
    Empty,
    Json(Vec<u8>),
    Stream(Vec<u8>),
}

/// Face service client over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpFaceClient {
    root: Url,
    subscription_key: String,
    connect_timeout: Duration,
    timeout: Duration,
}

impl HttpFaceClient {
    pub fn new(endpoint: &str, subscription_key: impl Into<String>) -> Result<Self> {
        let root = Url::parse(endpoint).with_context(|| format!("invalid endpoint {}", endpoint))?;
        if root.cannot_be_a_base() {
            anyhow::bail!("endpoint {} cannot be used as an API root", endpoint);
        }
        Ok(Self {
            root,
            subscription_key: subscription_key.into(),
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        })
    }

    /// Hard per-request timeout enforced by curl.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `root/<segments...>?<query...>`
    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    async fn send<R: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Body,
    ) -> Result<Option<R>, RemoteError> {
        let key = self.subscription_key.clone();
        let (connect_timeout, timeout) = (self.connect_timeout, self.timeout);
        tracing::debug!(?method, url = %url, "request");
        let (status, bytes) = tokio::task::spawn_blocking(move || {
            perform(&key, method, url.as_str(), body, connect_timeout, timeout)
        })
        .await
        .map_err(|e| RemoteError::transport(format!("request task: {}", e)))?
        .map_err(|e| curl_error(&e))?;

        let text = String::from_utf8_lossy(&bytes);
        if !(200..300).contains(&status) {
            let err = RemoteError::from_response(status, &text);
            tracing::debug!(status, code = %err.code, "response error: {}", err.message);
            return Err(err);
        }
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text).map(Some).map_err(|e| {
            RemoteError::new(
                ErrorCode::Other("InvalidResponse".into()),
                format!("could not parse response: {}", e),
            )
            .with_status(status)
        })
    }

    async fn send_required<R: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Body,
    ) -> Result<R, RemoteError> {
        self.send(method, url, body).await?.ok_or_else(|| {
            RemoteError::new(ErrorCode::Other("InvalidResponse".into()), "empty response body")
        })
    }
}

fn json_body<T: Serialize>(value: &T) -> Result<Body, RemoteError> {
    serde_json::to_vec(value)
        .map(Body::Json)
        .map_err(|e| RemoteError::new(ErrorCode::Other("InvalidRequest".into()), e.to_string()))
}

/// Map a curl failure to a service error (mirrors how we classify transport errors).
fn curl_error(e: &curl::Error) -> RemoteError {
    if e.is_operation_timedout() {
        return RemoteError::new(ErrorCode::OperationTimeout, e.to_string());
    }
    RemoteError::transport(e.to_string())
}

/// Runs one request in the current thread; call from `spawn_blocking`.
fn perform(
    key: &str,
    method: Method,
    url: &str,
    body: Body,
    connect_timeout: Duration,
    timeout: Duration,
) -> Result<(u32, Vec<u8>), curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.connect_timeout(connect_timeout)?;
    easy.timeout(timeout)?;

    let mut headers = curl::easy::List::new();
    headers.append(&format!("{}: {}", SUBSCRIPTION_KEY_HEADER, key))?;
    match method {
        Method::Get => easy.get(true)?,
        Method::Post => easy.post(true)?,
        Method::Put => {
            easy.post(true)?;
            easy.custom_request("PUT")?;
        }
        Method::Delete => easy.custom_request("DELETE")?,
    }
    match body {
        Body::Empty => {
            if matches!(method, Method::Post | Method::Put) {
                easy.post_fields_copy(&[])?;
            }
        }
        Body::Json(bytes) => {
            headers.append(&format!("Content-Type: {}", JSON_CONTENT_TYPE))?;
            easy.post_fields_copy(&bytes)?;
        }
        Body::Stream(bytes) => {
            headers.append(&format!("Content-Type: {}", STREAM_CONTENT_TYPE))?;
            easy.post_fields_copy(&bytes)?;
        }
    }
    easy.http_headers(headers)?;

    let mut response = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            response.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    let status = easy.response_code()?;
    Ok((status, response))
}

#[async_trait]
impl FaceService for HttpFaceClient {
    async fn detect_faces(&self, image: Vec<u8>) -> Result<Vec<DetectedFace>, RemoteError> {
        let url = self.url(&["detect"], &[("returnFaceId", "true")]);
        Ok(self
            .send(Method::Post, url, Body::Stream(image))
            .await?
            .unwrap_or_default())
    }

    async fn create_group(
        &self,
        group: &str,
        name: &str,
        user_data: Option<&str>,
    ) -> Result<(), RemoteError> {
        let url = self.url(&["largepersongroups", group], &[]);
        let body = json_body(&json!({ "name": name, "userData": user_data }))?;
        self.send::<serde_json::Value>(Method::Put, url, body)
            .await
            .map(|_| ())
    }

    async fn list_groups(&self) -> Result<Vec<PersonGroup>, RemoteError> {
        let url = self.url(&["largepersongroups"], &[]);
        Ok(self.send(Method::Get, url, Body::Empty).await?.unwrap_or_default())
    }

    async fn delete_group(&self, group: &str) -> Result<(), RemoteError> {
        let url = self.url(&["largepersongroups", group], &[]);
        self.send::<serde_json::Value>(Method::Delete, url, Body::Empty)
            .await
            .map(|_| ())
    }

    async fn create_person(
        &self,
        group: &str,
        name: &str,
        user_data: Option<&str>,
    ) -> Result<PersonId, RemoteError> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Created {
            person_id: PersonId,
        }
        let url = self.url(&["largepersongroups", group, "persons"], &[]);
        let body = json_body(&json!({ "name": name, "userData": user_data }))?;
        let created: Created = self.send_required(Method::Post, url, body).await?;
        Ok(created.person_id)
    }

    async fn add_person_face(
        &self,
        group: &str,
        person: &str,
        image: Vec<u8>,
        user_data: Option<&str>,
    ) -> Result<PersistedFaceId, RemoteError> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Added {
            persisted_face_id: PersistedFaceId,
        }
        let query: Vec<(&str, &str)> = user_data.map(|d| ("userData", d)).into_iter().collect();
        let url = self.url(
            &["largepersongroups", group, "persons", person, "persistedfaces"],
            &query,
        );
        let added: Added = self
            .send_required(Method::Post, url, Body::Stream(image))
            .await?;
        Ok(added.persisted_face_id)
    }

    async fn list_persons(&self, group: &str) -> Result<Vec<Person>, RemoteError> {
        let url = self.url(&["largepersongroups", group, "persons"], &[]);
        Ok(self.send(Method::Get, url, Body::Empty).await?.unwrap_or_default())
    }

    async fn delete_person(&self, group: &str, person: &str) -> Result<(), RemoteError> {
        let url = self.url(&["largepersongroups", group, "persons", person], &[]);
        self.send::<serde_json::Value>(Method::Delete, url, Body::Empty)
            .await
            .map(|_| ())
    }

    async fn train_group(&self, group: &str) -> Result<(), RemoteError> {
        let url = self.url(&["largepersongroups", group, "train"], &[]);
        self.send::<serde_json::Value>(Method::Post, url, Body::Empty)
            .await
            .map(|_| ())
    }

    async fn training_status(&self, group: &str) -> Result<TrainingStatus, RemoteError> {
        let url = self.url(&["largepersongroups", group, "training"], &[]);
        self.send_required(Method::Get, url, Body::Empty).await
    }

    async fn identify(
        &self,
        group: &str,
        face_ids: &[String],
        max_candidates: u32,
    ) -> Result<Vec<IdentifyResult>, RemoteError> {
        let url = self.url(&["identify"], &[]);
        let body = json_body(&json!({
            "largePersonGroupId": group,
            "faceIds": face_ids,
            "maxNumOfCandidatesReturned": max_candidates,
        }))?;
        Ok(self.send(Method::Post, url, body).await?.unwrap_or_default())
    }
}
