pub mod api;
pub mod color;
pub mod config;
pub mod engine;
pub mod integrations;

pub use color::Rgb;
pub use config::Config;
pub use config::LogLevel;
pub use engine::Engine;
pub use engine::LightState;
pub use engine::State;
pub use engine::TurnOn;
