//! Configuration loaded from TOML.

pub mod settings;

pub use settings::Settings;
