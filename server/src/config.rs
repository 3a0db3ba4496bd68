use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub site_base_url_path: String,
    #[serde(default)]
    pub fs_root_dir: std::path::PathBuf,
}

/// Shared secrets guarding the admin endpoints. There are no accounts: a request
/// is authorized when it carries the matching plaintext password.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct AdminConfig {
    pub upload_password: String,
    pub api_password: String,
    pub reset_password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl")]
    pub ttl: std::time::Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: default_ttl() }
    }
}

fn default_ttl() -> std::time::Duration {
    std::time::Duration::from_secs(5 * 60)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server_config: ServerConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub db_path: String,
}

pub enum Insecure {
    Deny,
    Allow,
}

pub fn validate(cfg: &Config, insecure: Insecure) -> Result<(), String> {
    if cfg.cache.ttl.is_zero() {
        return Err("cache.ttl must be positive".to_owned());
    }
    match insecure {
        Insecure::Allow => {}
        Insecure::Deny => {
            let admin = &cfg.admin;
            for (name, value) in [
                ("upload_password", &admin.upload_password),
                ("api_password", &admin.api_password),
                ("reset_password", &admin.reset_password),
            ] {
                if value.is_empty() {
                    return Err(format!("admin.{name} must not be empty in secure mode"));
                }
            }
        }
    }
    Ok(())
}
