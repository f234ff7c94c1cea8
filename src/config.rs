use serde::Deserialize;
use std::{
    fs,
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::error::{Error, Result};

pub const CONFIG_ENV: &str = "RACE_CONFIG";

/// What to do with a history row that has a missing or unparsable field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    #[default]
    Skip,
    Fail,
}

impl FromStr for RowPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(RowPolicy::Skip),
            "fail" => Ok(RowPolicy::Fail),
            other => Err(Error::Config(format!("unknown row policy {other:?}"))),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub row_policy: RowPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/race_results_2015_2025.csv"),
            model_path: PathBuf::from("model.json"),
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            row_policy: RowPolicy::Skip,
        }
    }
}

impl Config {
    /// Reads a JSON config file; absent keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&data)?)
    }

    /// `RACE_CONFIG` names a JSON file if set; otherwise individual env vars
    /// (`DATA_PATH`, `MODEL_PATH`, `BIND_ADDR`, `PORT`, `ROW_POLICY`) apply.
    /// `PORT` replaces the port of `BIND_ADDR`.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(path),
            Err(_) => Self::from_lookup(|k| std::env::var(k).ok()),
        }
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(p) = lookup("DATA_PATH") {
            cfg.data_path = PathBuf::from(p);
        }
        if let Some(p) = lookup("MODEL_PATH") {
            cfg.model_path = PathBuf::from(p);
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            cfg.bind_addr = addr.parse().map_err(|_| {
                Error::Config(format!("BIND_ADDR is not a socket address: {addr:?}"))
            })?;
        }
        if let Some(port) = lookup("PORT") {
            let port = port
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a port number: {port:?}")))?;
            cfg.bind_addr.set_port(port);
        }
        if let Some(policy) = lookup("ROW_POLICY") {
            cfg.row_policy = policy.parse()?;
        }
        Ok(cfg)
    }
}
