//! Configuration loading for the Ordino notification service.
//!
//! Configuration is layered: `config/default.*`, then `config/{RUN_ENV}.*`,
//! then environment variables with the `APP` prefix and `__` separator
//! (e.g. `APP_SERVER__PORT`, `APP_DATABASE__URL`, `APP_FCM__PROJECT_ID`).
//! A `.env` file is honored in development. Secrets (the service-account
//! private key) are never read from config files — see [`env_vars`].

pub mod env_vars;
pub mod models;

pub use models::{AppConfig, DatabaseConfig, FcmConfig, ServerConfig};

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;

static DOTENV_LOADED: OnceCell<()> = OnceCell::new();

/// Load `.env` once per process. Safe to call from every entry point.
pub fn ensure_dotenv_loaded() {
    DOTENV_LOADED.get_or_init(|| {
        dotenv::dotenv().ok();
    });
}

/// Load the application configuration.
///
/// Missing config files are not an error; a config built purely from
/// environment variables is valid. Deserialization fails when the mandatory
/// `server` section cannot be resolved from any source.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string());

    let config: AppConfig = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()?;

    Ok(apply_legacy_env_overrides(config))
}

/// Fill FCM fields from the provider-conventional env var names when the
/// `APP_FCM__*` form was not used. The deployment scripts set
/// `FIREBASE_PROJECT_ID` / `FIREBASE_CLIENT_EMAIL` directly.
fn apply_legacy_env_overrides(mut config: AppConfig) -> AppConfig {
    let fcm = config.fcm.get_or_insert_with(FcmConfig::default);
    if fcm.project_id.is_none() {
        fcm.project_id = env::var(env_vars::FIREBASE_PROJECT_ID).ok();
    }
    if fcm.client_email.is_none() {
        fcm.client_email = env::var(env_vars::FIREBASE_CLIENT_EMAIL).ok();
    }
    if config.database.is_none() {
        if let Ok(url) = env::var(env_vars::DATABASE_URL) {
            config.database = Some(DatabaseConfig { url });
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_env_overrides_fill_missing_fcm_fields() {
        let config = AppConfig {
            fcm: None,
            ..AppConfig::default()
        };
        // No env set in the test environment: the section is created empty.
        let config = apply_legacy_env_overrides(config);
        assert!(config.fcm.is_some());
    }

    #[test]
    fn explicit_fcm_section_is_not_overwritten() {
        let config = AppConfig {
            fcm: Some(FcmConfig {
                project_id: Some("pizzeria-prod".to_string()),
                client_email: Some("svc@pizzeria-prod.iam.gserviceaccount.com".to_string()),
                token_uri: None,
                api_base: None,
            }),
            ..AppConfig::default()
        };
        let config = apply_legacy_env_overrides(config);
        let fcm = config.fcm.unwrap();
        assert_eq!(fcm.project_id.as_deref(), Some("pizzeria-prod"));
        assert_eq!(
            fcm.client_email.as_deref(),
            Some("svc@pizzeria-prod.iam.gserviceaccount.com")
        );
    }
}
