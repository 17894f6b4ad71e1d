use std::path::PathBuf;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_CATALOG_PATH: &str = "data/territories.json";

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub listen: String,
    pub catalog_path: PathBuf,
    pub max_body_bytes: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            max_body_bytes: 16_384,
        }
    }
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(listen) = read_env_string("DISPENSER_LISTEN") {
            cfg.listen = listen;
        }
        if let Some(path) = read_env_string("DISPENSER_CATALOG_PATH") {
            cfg.catalog_path = PathBuf::from(path);
        }
        cfg.max_body_bytes = read_env_usize("DISPENSER_MAX_BODY_BYTES", cfg.max_body_bytes);
        cfg
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn read_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
