//! Startup settings and logging.

pub mod logging;
pub mod settings;

pub use logging::ReloadLogControl;
pub use settings::Settings;
