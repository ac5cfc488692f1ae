use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g., DATABASE_URL loaded via APP_DATABASE__URL or DATABASE_URL
}

// --- Firebase Cloud Messaging Config ---
// Holds non-secret FCM config. The service-account private key is loaded
// directly from the FIREBASE_PRIVATE_KEY env var, never from config files.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct FcmConfig {
    /// Firebase project identifier, used to build the messages:send URL.
    pub project_id: Option<String>, // Loaded via APP_FCM__PROJECT_ID or FIREBASE_PROJECT_ID

    /// Service-account client email, the `iss` of the signed assertion.
    pub client_email: Option<String>, // Loaded via APP_FCM__CLIENT_EMAIL or FIREBASE_CLIENT_EMAIL

    /// OAuth token endpoint. Defaults to Google's endpoint when absent;
    /// overridable so tests can point at a local mock server.
    pub token_uri: Option<String>,

    /// FCM API base URL. Defaults to https://fcm.googleapis.com when absent.
    pub api_base: Option<String>,
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_fcm: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>, // Central DB config
    #[serde(default)]
    pub fcm: Option<FcmConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            use_fcm: false,
            database: None,
            fcm: None,
        }
    }
}
