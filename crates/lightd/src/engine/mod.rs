#[allow(clippy::module_inception)]
mod engine;
mod light;
mod platform;
pub mod state;

pub use engine::Engine;
pub use engine::EngineError;
pub use light::Feature;
pub use light::Light;
pub use light::LightError;
pub use light::LightResult;
pub use light::TurnOn;
pub use platform::Platform;
pub use platform::PlatformContext;
pub use platform::PlatformFactoryResult;
pub use platform::REGISTRY as PLATFORM_REGISTRY;
pub use state::LightState;
pub use state::State;

#[cfg(test)]
pub(crate) use engine::tests::FakeLight;

/// Turn a display name into an object id: lowercase ASCII alphanumerics
/// separated by single underscores.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("unnamed");
    }
    slug
}
