use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub account: AccountConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// Shared secret used to verify bearer token signatures.
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AccountConfig {
    #[serde(default = "default_overdraft_limit")]
    pub default_overdraft_limit: Decimal,
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

fn default_overdraft_limit() -> Decimal {
    Decimal::from(100)
}

fn default_currency() -> String {
    "EUR".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8080,
                db_path: "./data/accounts".to_string(),
                log_level: "info".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "dev-secret-change-me-before-deploying".to_string(),
            },
            account: AccountConfig {
                default_overdraft_limit: default_overdraft_limit(),
                default_currency: default_currency(),
            },
        }
    }
}

impl ServiceConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        println!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        eprintln!("Error parsing config: {}. Using Defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    eprintln!("Error reading config: {}. Using Defaults.", e);
                    Self::default()
                }
            }
        } else {
            println!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                let _ = std::fs::write(path, s);
            }
            config
        }
    }
}
