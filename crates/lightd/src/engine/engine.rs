use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::light::Light;
use super::light::LightError;
use super::light::TurnOn;
use super::platform::Platform;
use super::platform::PlatformContext;
use super::platform::REGISTRY;
use super::state::LightState;
use super::state::State;
use crate::config::Config;

/// A light shared between the poll loop and command handlers. The mutex
/// serializes operations on a single light.
type SharedLight = Arc<Mutex<Box<dyn Light>>>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No light found for entity: {0}")]
    UnknownEntity(String),

    #[error("Light {entity_id} failed: {source}")]
    Light {
        entity_id: String,
        #[source]
        source: LightError,
    },
}

/// lightd engine
///
/// Sets up platforms, owns the lights they produce, polls them for state and
/// dispatches commands to them.
pub struct Engine {
    /// Map of entity_id -> light
    lights: BTreeMap<String, SharedLight>,
}

impl Engine {
    /// Create a new Engine instance
    pub fn new() -> Self {
        Self {
            lights: BTreeMap::new(),
        }
    }

    /// Build every configured platform from the registry and set it up.
    pub async fn setup_from_config(&mut self, cfg: &Config) {
        let ctx = PlatformContext { config: cfg };
        let mut platforms = Vec::new();
        for constr in REGISTRY {
            match constr(&ctx) {
                Ok(p) => platforms.extend(p),
                Err(e) => error!("failed to create platform: {:#}", e),
            }
        }

        for platform in platforms {
            self.setup_platform(platform.as_ref()).await;
        }

        info!("{} light(s) active", self.lights.len());
    }

    /// Set up a single platform and register the lights it produces.
    ///
    /// Returns the entity ids that were added. A failing platform is logged
    /// and contributes nothing.
    pub async fn setup_platform(&mut self, platform: &dyn Platform) -> Vec<String> {
        info!("Setting up platform: {}", platform.name());

        let lights = match platform.setup().await {
            Ok(lights) => lights,
            Err(e) => {
                error!("Platform '{}' setup failed: {:#}", platform.name(), e);
                return Vec::new();
            }
        };

        lights
            .into_iter()
            .filter_map(|light| self.add_light(light))
            .collect()
    }

    /// Register a light. Returns its entity id, or None if the id is taken.
    pub fn add_light(&mut self, light: Box<dyn Light>) -> Option<String> {
        let entity_id = format!("light.{}", light.object_id());
        if self.lights.contains_key(&entity_id) {
            warn!(
                "Skipping light '{}': entity id {} is already in use",
                light.name(),
                entity_id
            );
            return None;
        }

        info!("Registered light: {} ({})", light.name(), entity_id);
        self.lights
            .insert(entity_id.clone(), Arc::new(Mutex::new(light)));
        Some(entity_id)
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.lights.keys().map(String::as_str)
    }

    /// Refresh every idle light from its device, each in its own task.
    ///
    /// A light still busy with an earlier operation is skipped for this round.
    /// Failures are logged per light and do not stop the others. The returned
    /// set completes as the individual updates do.
    pub fn poll(&self) -> JoinSet<()> {
        let mut updates = JoinSet::new();
        for (entity_id, light) in &self.lights {
            let Ok(mut light) = light.clone().try_lock_owned() else {
                debug!("Skipping update of {}: light is busy", entity_id);
                continue;
            };

            let entity_id = entity_id.clone();
            updates.spawn(async move {
                match light.update().await {
                    Ok(()) => debug!("Updated {}", entity_id),
                    Err(e) => warn!("Failed to update {}: {}", entity_id, e),
                }
            });
        }
        updates
    }

    /// Run the poll loop until `shutdown` resolves.
    pub async fn run(&self, poll_interval: Duration, shutdown: impl Future<Output = ()>) {
        info!("Engine starting, polling every {:?}", poll_interval);

        let mut ticker = tokio::time::interval(poll_interval);
        // The first tick completes immediately; lights were just refreshed by setup.
        ticker.tick().await;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => self.poll().detach_all(),
            }
        }

        info!("Engine shutting down");
    }

    /// Turn a light on, applying any attribute overrides.
    pub async fn turn_on(
        &self,
        entity_id: &str,
        overrides: TurnOn,
    ) -> Result<LightState, EngineError> {
        let light = self.get(entity_id)?;
        let mut light = light.lock().await;

        info!("Turning on {}: {:?}", entity_id, overrides);
        light
            .turn_on(overrides)
            .await
            .map_err(|source| EngineError::Light {
                entity_id: entity_id.to_string(),
                source,
            })?;

        Ok(LightState::read(&**light))
    }

    pub async fn turn_off(&self, entity_id: &str) -> Result<LightState, EngineError> {
        let light = self.get(entity_id)?;
        let mut light = light.lock().await;

        info!("Turning off {}", entity_id);
        light
            .turn_off(TurnOn::default())
            .await
            .map_err(|source| EngineError::Light {
                entity_id: entity_id.to_string(),
                source,
            })?;

        Ok(LightState::read(&**light))
    }

    pub async fn light_state(&self, entity_id: &str) -> Result<LightState, EngineError> {
        let light = self.get(entity_id)?;
        let light = light.lock().await;
        Ok(LightState::read(&**light))
    }

    /// Get a snapshot of every light's last known state.
    ///
    /// Lights in the middle of an operation are left out.
    pub fn snapshot(&self) -> State {
        let mut state = State::default();
        for (entity_id, light) in &self.lights {
            match light.try_lock() {
                Ok(light) => {
                    state
                        .lights
                        .insert(entity_id.clone(), LightState::read(&**light));
                }
                Err(_) => debug!("Leaving {} out of snapshot: light is busy", entity_id),
            }
        }
        state
    }

    fn get(&self, entity_id: &str) -> Result<&SharedLight, EngineError> {
        self.lights
            .get(entity_id)
            .ok_or_else(|| EngineError::UnknownEntity(entity_id.to_string()))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
