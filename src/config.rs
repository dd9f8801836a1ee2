use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Address the HTTP server listens on (`FILMORATE_BIND`).
    pub bind: String,
    /// sled database directory (`FILMORATE_DB`); temporary when unset.
    pub database: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        Config {
            bind: lookup("FILMORATE_BIND")
                .filter(|bind| !bind.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIND.to_owned()),
            database: lookup("FILMORATE_DB")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn open_db(&self) -> sled::Result<sled::Db> {
        match &self.database {
            Some(path) => sled::Config::new().path(path).open(),
            None => sled::Config::new().temporary(true).open(),
        }
    }
}
