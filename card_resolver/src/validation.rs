//! Validation gate: confirm a candidate image actually loads.
//!
//! A load attempt races a timer; timeout, transport errors, non-2xx
//! statuses and non-image bodies all count as failure. Never errors.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::config::ResolverConfig;
use crate::error::Result;

#[async_trait]
pub trait ImageValidator: Send + Sync {
    async fn validate(&self, url: &str) -> bool;
}

pub struct HttpImageValidator {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpImageValidator {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self::with_http(http, config.validation_timeout))
    }

    pub fn with_http(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Attempt to load `url`, giving up after `timeout`
    pub async fn load_within(&self, url: &str, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.load(url)).await {
            Ok(loaded) => loaded,
            Err(_) => {
                debug!("Image validation timed out after {:?}: {}", timeout, url);
                false
            }
        }
    }

    async fn load(&self, url: &str) -> bool {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Image validation request failed for {}: {}", url, e);
                return false;
            }
        };

        if !response.status().is_success() {
            debug!("Image validation got {} for {}", response.status(), url);
            return false;
        }

        // Servers that omit Content-Type get the benefit of the doubt
        let is_image = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(true);
        if !is_image {
            debug!("Image validation: {} is not an image", url);
        }
        is_image
    }
}

#[async_trait]
impl ImageValidator for HttpImageValidator {
    async fn validate(&self, url: &str) -> bool {
        self.load_within(url, self.timeout).await
    }
}
