//! Lights behind a RESTful HTTP endpoint (e.g. an ESP8266 driving RGBW LEDs).
//!
//! The endpoint answers `GET <resource>` with the light's state and accepts
//! the same JSON shape on `POST <resource>` as a command.

mod light;
#[cfg(test)]
mod mock;
mod payload;

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use linkme::distributed_slice;
use reqwest::Client;
use reqwest::Url;
use tracing::error;
use tracing::info;

pub use light::RestLight;
pub use payload::LightPayload;
pub use payload::Mode;

use crate::config::RestLightConfig;
use crate::engine;
use crate::engine::Light;
use crate::engine::Platform;

/// Timeout for the reachability check made during setup
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "Missing resource or schema in configuration ({0}). Add http:// or https:// to your URL"
    )]
    MissingSchema(String),

    #[error("No route to resource/endpoint: {0}")]
    NoRoute(String, #[source] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[distributed_slice(engine::PLATFORM_REGISTRY)]
fn init_rest(ctx: &engine::PlatformContext) -> engine::PlatformFactoryResult {
    let rest = &ctx.config.integrations.rest;
    if rest.is_empty() {
        return Ok(Vec::new());
    }

    let client = Client::builder()
        .build()
        .context("Failed to create HTTP client")?;

    Ok(rest
        .iter()
        .map(|config| Box::new(RestPlatform::new(config.clone(), client.clone())) as Box<dyn Platform>)
        .collect())
}

/// Platform for a single RESTful light
pub struct RestPlatform {
    name: String,
    config: RestLightConfig,
    client: Client,
}

impl RestPlatform {
    pub fn new(config: RestLightConfig, client: Client) -> Self {
        let object_id = engine::slugify(config.id.as_deref().unwrap_or(&config.name));
        Self {
            name: format!("rest.{}", object_id),
            config,
            client,
        }
    }

    /// Check that the resource is a usable URL and something answers on it.
    async fn probe(&self) -> Result<(), Error> {
        let resource = &self.config.resource;
        let url = Url::parse(resource).map_err(|_| Error::MissingSchema(resource.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::MissingSchema(resource.clone()));
        }

        match self.client.get(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(_) => Ok(()),
            Err(e) if e.is_connect() => Err(Error::NoRoute(resource.clone(), e)),
            Err(e) => Err(Error::Http(e)),
        }
    }
}

#[async_trait]
impl Platform for RestPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    async fn setup(&self) -> anyhow::Result<Vec<Box<dyn Light>>> {
        self.probe().await?;

        match RestLight::new(self.config.clone(), self.client.clone()).await {
            Ok(light) => {
                info!("Initialized {} ({})", self.config.name, self.config.resource);
                Ok(vec![Box::new(light)])
            }
            Err(e) => {
                error!("Failed to initialize {}: {}", self.name, e);
                Ok(Vec::new())
            }
        }
    }
}
