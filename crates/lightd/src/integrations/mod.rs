//! Light integrations. Each one registers a platform factory with the engine.

#[cfg(feature = "integration_magiclight_ble")]
pub mod magiclight_ble;
#[cfg(feature = "integration_rest")]
pub mod rest;
