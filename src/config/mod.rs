use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public origin used to turn stored `/uploads/...` paths into absolute URLs.
    pub base_url: String,
    pub uploads_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity provider that issues bearer tokens.
    pub jwt_secret: String,
    #[serde(default = "default_admin_roles")]
    pub admin_roles: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_admin_roles() -> Vec<String> {
    vec!["admin".to_string(), "super_admin".to_string()]
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // .env is optional; real deployments set variables directly
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.base_url", "http://localhost:5000")?
            .set_default("server.uploads_dir", "uploads")?
            .set_default("database.url", "sqlite://sanctuary.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("uploads.max_file_size", 5 * 1024 * 1024)?
            .set_default("logging.json", false)?

            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // SANCTUARY__AUTH__JWT_SECRET -> auth.jwt_secret
            .add_source(Environment::with_prefix("SANCTUARY").separator("__"))

            .build()?;

        config.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                base_url: "http://localhost:5000".to_string(),
                uploads_dir: "uploads".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://sanctuary.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                admin_roles: default_admin_roles(),
            },
            uploads: UploadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
