//! HTTP transport over the runtime's local REST API.
//!
//! `GET  /api/tags`     → model listing (the probe's status call)
//! `POST /api/generate` → one non-streaming generation

use super::listing::parse_model_listing;
use super::{GenerateRequest, ModelRuntime};
use crate::config::Transport;
use crate::error::{RuntimeError, RuntimeResult};
use async_trait::async_trait;
use std::time::Duration;

pub struct HttpRuntime {
    client: reqwest::Client,
    base_url: String,
    model: String,
    generate_timeout: Duration,
}

impl HttpRuntime {
    pub fn new(base_url: &str, model: &str, generate_timeout: Duration) -> Self {
        // The runtime is local; system proxy settings must not apply.
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            generate_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build the `/api/generate` body for a request.
    pub(crate) fn generate_body(&self, request: &GenerateRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "top_p": request.top_p,
            }
        });
        if request.json {
            body["format"] = serde_json::Value::String("json".to_string());
        }
        body
    }
}

/// Read the body and turn any non-2xx status into `HttpStatus`.
async fn checked_text(resp: reqwest::Response) -> RuntimeResult<String> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(RuntimeError::HttpStatus {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }
    Ok(body)
}

#[async_trait]
impl ModelRuntime for HttpRuntime {
    fn transport(&self) -> Transport {
        Transport::Http
    }

    async fn list_models(&self) -> RuntimeResult<Vec<String>> {
        let resp = self.client.get(self.url("/api/tags")).send().await?;
        let body = checked_text(resp).await?;
        parse_model_listing(&body)
    }

    async fn generate(&self, request: &GenerateRequest) -> RuntimeResult<String> {
        let start = std::time::Instant::now();
        log::info!(
            "[HTTP] POST /api/generate model={} json={} ({} chars)",
            self.model,
            request.json,
            request.prompt.len()
        );

        let resp = self
            .client
            .post(self.url("/api/generate"))
            .timeout(self.generate_timeout)
            .json(&self.generate_body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RuntimeError::Timeout {
                        operation: "generate".to_string(),
                        after_ms: self.generate_timeout.as_millis() as u64,
                    }
                } else {
                    RuntimeError::Transport(e)
                }
            })?;
        let body = checked_text(resp).await?;

        let parsed: serde_json::Value = serde_json::from_str(&body)?;
        let text = parsed
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or_else(|| {
                RuntimeError::MalformedResponse("no string 'response' field".to_string())
            })?;

        log::info!(
            "[HTTP] Generation finished in {}ms ({} chars)",
            start.elapsed().as_millis(),
            text.len()
        );
        Ok(text.to_string())
    }
}
