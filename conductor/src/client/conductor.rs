use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use shared_types::{ApiError, PlayResponse, RegisterWorkerRequest, SessionStatus, Worker, WorkerId};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid conductor url '{0}'")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("conductor returned {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
}

/// Client for the conductor's v1 HTTP API.
#[derive(Clone)]
pub struct ConductorClient {
    base: Url,
    http: reqwest::Client,
}

impl ConductorClient {
    pub fn new(base_url: &str, http: reqwest::Client) -> Result<Self, ClientError> {
        let base =
            Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { base, http })
    }

    pub async fn register(&self, id: WorkerId, address: &str) -> Result<(), ClientError> {
        let body = RegisterWorkerRequest {
            id: id.to_hex(),
            address: address.to_string(),
        };
        let url = self.url(&["v1", "musician"])?;
        self.send(self.http.post(url).json(&body)).await.map(drop)
    }

    pub async fn unregister(&self, id: WorkerId) -> Result<(), ClientError> {
        let hex = id.to_hex();
        let url = self.url(&["v1", "musician", &hex])?;
        self.send(self.http.delete(url)).await.map(drop)
    }

    pub async fn workers(&self) -> Result<Vec<Worker>, ClientError> {
        let url = self.url(&["v1", "musicians"])?;
        self.json(Method::GET, url).await
    }

    /// Start playing a score and return the session id; `name` may contain
    /// `/` for sub-directories.
    pub async fn play(&self, name: &str) -> Result<String, ClientError> {
        let mut segments = vec!["v1", "music", "play"];
        segments.extend(name.split('/').filter(|s| !s.is_empty()));
        let url = self.url(&segments)?;
        let started: PlayResponse = self.json(Method::POST, url).await?;
        Ok(started.session_id)
    }

    pub async fn pause(&self) -> Result<(), ClientError> {
        self.control("pause").await
    }

    pub async fn resume(&self) -> Result<(), ClientError> {
        self.control("resume").await
    }

    pub async fn stop(&self) -> Result<(), ClientError> {
        self.control("stop").await
    }

    pub async fn status(&self) -> Result<SessionStatus, ClientError> {
        let url = self.url(&["v1", "music", "status"])?;
        self.json(Method::GET, url).await
    }

    pub async fn health(&self) -> Result<(), ClientError> {
        let url = self.url(&["health"])?;
        self.send(self.http.get(url)).await.map(drop)
    }

    async fn control(&self, action: &str) -> Result<(), ClientError> {
        let url = self.url(&["v1", "music", action])?;
        self.send(self.http.post(url)).await.map(drop)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn json<T: DeserializeOwned>(&self, method: Method, url: Url) -> Result<T, ClientError> {
        let response = self.send(self.http.request(method, url)).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ApiError>(&text) {
            Ok(api) => (api.error.code, api.error.message),
            Err(_) => ("UNKNOWN".to_string(), text),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}
