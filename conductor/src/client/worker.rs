use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use reqwest::Url;
use shared_types::PlayNoteRequest;

use super::{DeliveryError, WorkerClient};

const PLAY_PATH: &str = "v1/play";

/// Delivers events as `POST {address}/v1/play` with a base64 envelope.
///
/// One pooled `reqwest::Client` serves every worker.
#[derive(Clone)]
pub struct HttpWorkerClient {
    http: reqwest::Client,
}

impl HttpWorkerClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn play_url(address: &str) -> Result<Url, DeliveryError> {
        let invalid = |reason: String| DeliveryError::InvalidAddress {
            address: address.to_string(),
            reason,
        };
        let base = Url::parse(&format!("{}/", address.trim_end_matches('/')))
            .map_err(|e| invalid(e.to_string()))?;
        base.join(PLAY_PATH).map_err(|e| invalid(e.to_string()))
    }
}

#[async_trait]
impl WorkerClient for HttpWorkerClient {
    async fn deliver_event(&self, address: &str, payload: &[u8]) -> Result<(), DeliveryError> {
        let url = Self::play_url(address)?;
        let body = PlayNoteRequest {
            note: STANDARD_NO_PAD.encode(payload),
        };

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
