use anyhow::{Context, Result};
use finbalance_core::GatewayCredentials;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::{default_db_path, ensure_finbalance_home};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub locale: LocaleSection,
    /// Fallback Evolution API credentials for senders without their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewaySection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StorageSection {
    /// Defaults to `finbalance.db` under the home directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LocaleSection {
    /// IANA zone used to date records and pick the report month.
    /// Server local time when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewaySection {
    pub base_url: String,
    pub api_key: String,
    pub instance_name: String,
}

impl Config {
    /// Apply `FINBALANCE_BIND`, `FINBALANCE_DB` and `FINBALANCE_TZ`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        if let Some(bind) = set("FINBALANCE_BIND") {
            self.server.bind = bind;
        }
        if let Some(db) = set("FINBALANCE_DB") {
            self.storage.db_path = Some(PathBuf::from(db));
        }
        if let Some(tz) = set("FINBALANCE_TZ") {
            self.locale.timezone = Some(tz);
        }
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(p) => Ok(p.clone()),
            None => default_db_path(),
        }
    }

    pub fn fallback_gateway(&self) -> Option<GatewayCredentials> {
        self.gateway.as_ref().map(|g| GatewayCredentials {
            base_url: g.base_url.clone(),
            api_key: g.api_key.clone(),
            instance_name: g.instance_name.clone(),
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_finbalance_home()?.join("config.toml"))
}

/// File contents (or defaults when absent) with environment overrides applied.
pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    let mut cfg = if p.exists() {
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        parse_config(&s)?
    } else {
        Config::default()
    };
    cfg.apply_overrides(|key| std::env::var(key).ok());
    Ok(cfg)
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    println!("# {}", config_path()?.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
