//! Async HTTP client wrapping the Trestle JSON API.

use std::{future::Future, sync::Arc, time::Duration};

use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument};
use trestle_core::{Individual, IndividualSource, record::IndividualRecord};

use crate::{Error, Result, Session};

/// Connection settings for the Trestle API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// API root, e.g. `http://localhost:8080/trestle`.
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8080/trestle".into(),
      timeout:  Duration::from_secs(30),
    }
  }
}

#[derive(Serialize)]
struct Credentials<'a> {
  username: &'a str,
  password: &'a str,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
  repository: &'a str,
  query:      &'a str,
}

/// Async HTTP client for the Trestle REST API.
///
/// Cheap to clone. The inner [`reqwest::Client`] is `Arc`-based, and clones
/// share the bearer token.
#[derive(Clone)]
pub struct TrestleClient {
  http:   Client,
  config: ClientConfig,
  token:  Arc<RwLock<Option<String>>>,
}

impl TrestleClient {
  pub fn new(config: ClientConfig) -> Result<Self> {
    if !config.base_url.starts_with("http://")
      && !config.base_url.starts_with("https://")
    {
      return Err(Error::Config(format!(
        "base url must be http(s): {}",
        config.base_url
      )));
    }
    let http = Client::builder().timeout(config.timeout).build()?;
    Ok(Self {
      http,
      config,
      token: Arc::new(RwLock::new(None)),
    })
  }

  /// Attach a previously persisted session.
  pub fn with_session(self, session: &Session) -> Self {
    self.set_token(Some(session.token.clone()));
    self
  }

  pub fn config(&self) -> &ClientConfig { &self.config }

  pub fn set_token(&self, token: Option<String>) { *self.token.write() = token; }

  pub fn is_authenticated(&self) -> bool { self.token.read().is_some() }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
    match self.token.read().as_deref() {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  async fn send(&self, req: RequestBuilder, path: &str) -> Result<Response> {
    let resp = self.authorize(req).send().await?;
    let status = resp.status();
    if !status.is_success() {
      debug!(path, %status, "request failed");
      return Err(Error::Status {
        path: path.to_string(),
        status,
      });
    }
    Ok(resp)
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T> {
    let req = self.http.get(self.url(path)).query(query);
    let body = self.send(req, path).await?.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
  }

  // ── Authentication ────────────────────────────────────────────────────────

  /// `POST /auth/login`. The response body is the bare token; on success the
  /// client uses it for every later request.
  #[instrument(skip(self, password))]
  pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
    let req = self
      .http
      .post(self.url("/auth/login"))
      .json(&Credentials { username, password });
    let body = self.send(req, "/auth/login").await?.text().await?;
    let session = Session::from_token(body.trim().trim_matches('"'))?;
    self.set_token(Some(session.token.clone()));
    Ok(session)
  }

  /// `POST /auth/logout`. The local token is dropped even if the server
  /// call fails.
  pub async fn logout(&self) -> Result<()> {
    if !self.is_authenticated() {
      return Err(Error::NotAuthenticated);
    }
    let req = self.http.post(self.url("/auth/logout"));
    let result = self.send(req, "/auth/logout").await.map(drop);
    self.set_token(None);
    result
  }

  // ── Individuals ───────────────────────────────────────────────────────────

  /// `GET /individual/retrieve?name=<id>`
  #[instrument(skip(self))]
  pub async fn retrieve_record(&self, id: &str) -> Result<IndividualRecord> {
    self
      .get_json("/individual/retrieve", &[("name", id.to_string())])
      .await
  }

  pub async fn retrieve_individual(&self, id: &str) -> Result<Individual> {
    Ok(self.retrieve_record(id).await?.try_into()?)
  }

  /// `GET /visualize/search?name=<name>[&dataset=<ds>][&limit=<n>]`.
  /// Returns matching individual identifiers.
  pub async fn search(
    &self,
    name: &str,
    dataset: Option<&str>,
    limit: Option<u32>,
  ) -> Result<Vec<String>> {
    let mut query = vec![("name", name.to_string())];
    if let Some(dataset) = dataset {
      query.push(("dataset", dataset.to_string()));
    }
    if let Some(limit) = limit {
      query.push(("limit", limit.to_string()));
    }
    self.get_json("/visualize/search", &query).await
  }

  // ── Datasets and queries ──────────────────────────────────────────────────

  /// `GET /datasets`
  pub async fn datasets(&self) -> Result<Vec<String>> {
    self.get_json("/datasets", &[]).await
  }

  /// `POST /query`. The result shape depends on the query, so it is
  /// returned as raw JSON.
  pub async fn query(&self, repository: &str, query: &str) -> Result<Value> {
    let req = self
      .http
      .post(self.url("/query"))
      .json(&QueryRequest { repository, query });
    let body = self.send(req, "/query").await?.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
  }
}

impl IndividualSource for TrestleClient {
  type Error = Error;

  fn individual<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Arc<Individual>>> + Send + 'a {
    async move { Ok(Arc::new(self.retrieve_individual(id).await?)) }
  }
}
