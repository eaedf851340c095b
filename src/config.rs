use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "data/nhi.sqlite";
const DEFAULT_OUTPUT_PATH: &str = "nhi_data.json";

/// Paths that can be overridden per environment (`NHI_DB_PATH`, `NHI_OUTPUT`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub output_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };
        Settings {
            db_path: path("NHI_DB_PATH", DEFAULT_DB_PATH),
            output_path: path("NHI_OUTPUT", DEFAULT_OUTPUT_PATH),
        }
    }
}
