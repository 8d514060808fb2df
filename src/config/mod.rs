//! TOML-backed audit settings stored in the app directory.

use crate::app_dirs;

mod errors;
mod load;
mod save;
mod settings;


/// Default filename used to store the audit settings.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub use errors::ConfigError;
pub use load::{config_path, load_from, load_or_default};
pub use save::{save, save_to_path};
pub use settings::AuditSettings;

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}
