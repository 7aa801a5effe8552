use async_trait::async_trait;
use linkme::distributed_slice;

use super::light::Light;
use crate::config::Config;

/// Result type for platform factory functions
pub type PlatformFactoryResult = anyhow::Result<Vec<Box<dyn Platform>>>;

pub struct PlatformContext<'a> {
    pub config: &'a Config,
}

/// Factories for every compiled-in integration. Each one inspects the
/// configuration and returns the platforms it should run, possibly none.
#[distributed_slice]
pub static REGISTRY: [fn(&PlatformContext) -> PlatformFactoryResult];

/// A configured integration instance that produces lights.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Get the name/identifier of this platform
    fn name(&self) -> &str;

    /// Set up the platform and construct its lights.
    ///
    /// Lights that fail to construct are left out of the returned list. An
    /// error means the whole platform could not be set up and no lights
    /// should be added.
    async fn setup(&self) -> anyhow::Result<Vec<Box<dyn Light>>>;
}
