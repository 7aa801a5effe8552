use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use tracing::debug;
use tracing::error;

use super::Error;
use super::payload::LIGHT_OFF;
use super::payload::LIGHT_ON;
use super::payload::LightPayload;
use super::payload::Mode;
use crate::color;
use crate::color::Rgb;
use crate::config::RestLightConfig;
use crate::engine;
use crate::engine::Feature;
use crate::engine::Light;
use crate::engine::LightResult;
use crate::engine::TurnOn;

const SUPPORTED_FEATURES: &[Feature] = &[Feature::Brightness, Feature::RgbColor, Feature::WhiteValue];

/// A light controlled through a RESTful endpoint.
///
/// State is cached from the last GET and only changes on refresh or after a
/// command the endpoint accepted with 200.
pub struct RestLight {
    config: RestLightConfig,
    client: Client,

    on: bool,
    mode: Mode,
    rgb: Rgb,
    white: u8,
    /// HSV value of `rgb`
    brightness: f64,
}

impl RestLight {
    /// Construct the light and read its initial state.
    pub async fn new(config: RestLightConfig, client: Client) -> Result<Self, Error> {
        let mut light = Self {
            config,
            client,
            on: false,
            mode: Mode::Color,
            rgb: Rgb::default(),
            white: 0,
            brightness: 0.0,
        };
        light.refresh().await?;
        Ok(light)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    async fn refresh(&mut self) -> Result<(), Error> {
        let response = self
            .client
            .get(&self.config.resource)
            .timeout(self.config.timeout())
            .send()
            .await?;
        let body = response.bytes().await?;
        let status: LightPayload = serde_json::from_slice(&body)?;
        debug!("{} status: {:?}", self.config.resource, status);

        self.on = status.is_on();
        self.mode = status.mode;
        self.rgb = status.color;
        self.white = status.whitelevel;
        self.brightness = color::brightness_of(self.rgb);
        Ok(())
    }

    async fn post(&self, payload: &LightPayload) -> Result<StatusCode, Error> {
        debug!("{} <- {:?}", self.config.resource, payload);
        let response = self
            .client
            .post(&self.config.resource)
            .timeout(self.config.timeout())
            .json(payload)
            .send()
            .await?;
        Ok(response.status())
    }

    async fn power_on(&mut self, overrides: TurnOn) -> Result<(), Error> {
        let target = overrides.resolve(self.rgb, self.brightness, self.white);
        let (mode, color) = if target.white_requested {
            (Mode::White, self.rgb)
        } else {
            (Mode::Color, color::normalize(target.rgb, target.brightness))
        };

        let payload = LightPayload {
            state: LIGHT_ON,
            mode,
            color,
            whitelevel: target.white,
        };

        let status = self.post(&payload).await?;
        if status == StatusCode::OK {
            self.on = true;
            self.mode = mode;
        } else {
            error!(
                "Can't turn on {}. Is resource/endpoint offline? (HTTP {})",
                self.config.resource, status
            );
        }
        Ok(())
    }

    async fn power_off(&mut self) -> Result<(), Error> {
        let payload = LightPayload {
            state: LIGHT_OFF,
            mode: self.mode,
            color: self.rgb,
            whitelevel: self.white,
        };

        let status = self.post(&payload).await?;
        if status == StatusCode::OK {
            self.on = false;
        } else {
            error!(
                "Can't turn off {}. Is resource/endpoint offline? (HTTP {})",
                self.config.resource, status
            );
        }
        Ok(())
    }
}

#[async_trait]
impl Light for RestLight {
    fn unique_id(&self) -> Option<String> {
        self.config.id.as_ref().map(|id| format!("rest.{}", id))
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn object_id(&self) -> String {
        engine::slugify(self.config.id.as_deref().unwrap_or(&self.config.name))
    }

    fn is_on(&self) -> bool {
        self.on
    }

    fn brightness(&self) -> f64 {
        self.brightness
    }

    fn rgb_color(&self) -> Rgb {
        self.rgb
    }

    fn white_value(&self) -> u8 {
        self.white
    }

    fn supported_features(&self) -> &'static [Feature] {
        SUPPORTED_FEATURES
    }

    async fn update(&mut self) -> LightResult<()> {
        Ok(self.refresh().await?)
    }

    async fn turn_on(&mut self, overrides: TurnOn) -> LightResult<()> {
        Ok(self.power_on(overrides).await?)
    }

    async fn turn_off(&mut self, _overrides: TurnOn) -> LightResult<()> {
        Ok(self.power_off().await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::integrations::rest::mock::MockEndpoint;

    fn config(resource: String) -> RestLightConfig {
        crate::config::Config::parse(&format!(
            "[[integrations.rest]]\nid = \"desk\"\nname = \"Desk Strip\"\nresource = \"{}\"\n",
            resource
        ))
        .unwrap()
        .integrations
        .rest
        .remove(0)
    }

    fn sample_status() -> serde_json::Value {
        json!({
            "state": 1,
            "mode": 0,
            "color": {"red": 10, "green": 20, "blue": 30},
            "whitelevel": 5
        })
    }

    async fn light_for(endpoint: &MockEndpoint) -> RestLight {
        RestLight::new(config(endpoint.url()), Client::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_update_decodes_status() {
        let endpoint = MockEndpoint::start(sample_status()).await;
        let light = light_for(&endpoint).await;

        assert!(light.is_on());
        assert_eq!(light.mode(), Mode::Color);
        assert_eq!(light.rgb_color(), Rgb::new(10, 20, 30));
        assert_eq!(light.white_value(), 5);
        assert_eq!(light.brightness(), color::brightness_of(Rgb::new(10, 20, 30)));
        assert_eq!(light.unique_id().as_deref(), Some("rest.desk"));
        assert_eq!(light.object_id(), "desk");
    }

    #[tokio::test]
    async fn test_turn_on_with_color_and_brightness() {
        let endpoint = MockEndpoint::start(json!({
            "state": 0,
            "mode": 1,
            "color": {"red": 0, "green": 0, "blue": 0},
            "whitelevel": 40
        }))
        .await;
        let mut light = light_for(&endpoint).await;
        assert!(!light.is_on());

        light
            .turn_on(TurnOn {
                rgb_color: Some(Rgb::new(255, 0, 0)),
                brightness: Some(128),
                white_value: None,
            })
            .await
            .unwrap();

        let expected = color::normalize(Rgb::new(255, 0, 0), 128.0 / 255.0);
        assert_eq!(expected, Rgb::new(128, 0, 0));
        assert_eq!(
            endpoint.posts(),
            vec![json!({
                "state": 1,
                "mode": 0,
                "color": {"red": 128, "green": 0, "blue": 0},
                "whitelevel": 40
            })]
        );
        assert!(light.is_on());
        assert_eq!(light.mode(), Mode::Color);
        // cached color only changes on refresh
        assert_eq!(light.rgb_color(), Rgb::new(0, 0, 0));
    }

    #[tokio::test]
    async fn test_turn_on_white_keeps_cached_color() {
        let endpoint = MockEndpoint::start(sample_status()).await;
        let mut light = light_for(&endpoint).await;

        light
            .turn_on(TurnOn {
                white_value: Some(200),
                rgb_color: Some(Rgb::new(255, 255, 255)),
                brightness: None,
            })
            .await
            .unwrap();

        assert_eq!(
            endpoint.posts(),
            vec![json!({
                "state": 1,
                "mode": 1,
                "color": {"red": 10, "green": 20, "blue": 30},
                "whitelevel": 200
            })]
        );
        assert_eq!(light.mode(), Mode::White);
    }

    #[tokio::test]
    async fn test_turn_on_rejected_leaves_state() {
        let endpoint = MockEndpoint::start(json!({
            "state": 0,
            "mode": 0,
            "color": {"red": 10, "green": 20, "blue": 30},
            "whitelevel": 5
        }))
        .await;
        endpoint.respond_to_posts_with(StatusCode::INTERNAL_SERVER_ERROR);
        let mut light = light_for(&endpoint).await;

        light
            .turn_on(TurnOn {
                white_value: Some(10),
                ..TurnOn::default()
            })
            .await
            .unwrap();

        assert_eq!(endpoint.posts().len(), 1);
        assert!(!light.is_on());
        assert_eq!(light.mode(), Mode::Color);
    }

    #[tokio::test]
    async fn test_turn_off_sends_cached_state() {
        let endpoint = MockEndpoint::start(json!({
            "state": 1,
            "mode": 1,
            "color": {"red": 1, "green": 2, "blue": 3},
            "whitelevel": 99
        }))
        .await;
        let mut light = light_for(&endpoint).await;

        // overrides are ignored when turning off
        light
            .turn_off(TurnOn {
                brightness: Some(1),
                ..TurnOn::default()
            })
            .await
            .unwrap();

        assert_eq!(
            endpoint.posts(),
            vec![json!({
                "state": 0,
                "mode": 1,
                "color": {"red": 1, "green": 2, "blue": 3},
                "whitelevel": 99
            })]
        );
        assert!(!light.is_on());
    }

    #[tokio::test]
    async fn test_turn_off_rejected_leaves_state() {
        let endpoint = MockEndpoint::start(sample_status()).await;
        endpoint.respond_to_posts_with(StatusCode::SERVICE_UNAVAILABLE);
        let mut light = light_for(&endpoint).await;

        light.turn_off(TurnOn::default()).await.unwrap();
        assert!(light.is_on());
    }

    #[tokio::test]
    async fn test_update_refreshes_and_recomputes_brightness() {
        let endpoint = MockEndpoint::start(sample_status()).await;
        let mut light = light_for(&endpoint).await;

        endpoint.set_status(json!({
            "state": 0,
            "mode": 1,
            "color": {"red": 0, "green": 0, "blue": 255},
            "whitelevel": 0
        }));
        light.update().await.unwrap();

        assert!(!light.is_on());
        assert_eq!(light.mode(), Mode::White);
        assert_eq!(light.rgb_color(), Rgb::new(0, 0, 255));
        assert_eq!(light.brightness(), 1.0);
    }

    #[tokio::test]
    async fn test_malformed_status_is_an_error() {
        let endpoint = MockEndpoint::start(sample_status()).await;
        let mut light = light_for(&endpoint).await;

        endpoint.set_status(json!({"state": 1}));
        assert!(light.update().await.is_err());
        // last known state is kept
        assert!(light.is_on());

        let result = RestLight::new(config(endpoint.url()), Client::new()).await;
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }
}
