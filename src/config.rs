use std::net::SocketAddr;
use std::path::Path;

use ini::Ini;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://finance_data.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_CONFIG_FILE: &str = "config.ini";
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to load config file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: ini::Error,
    },
}

/// Settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse::<SocketAddr>().map_err(|e| {
            ConfigError::Invalid { key: "BIND_ADDR", reason: e.to_string() }
        })?;

        Ok(Self {
            database_url: database_url(),
            bind_addr,
        })
    }
}

/// Settings for the ingestor.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub database_url: String,
    pub companies: Vec<String>,
    pub yahoo_base_url: String,
}

impl IngestConfig {
    /// Reads `companies` from the `[DEFAULT]` section of the INI file at
    /// `path`. A `COMPANIES` environment variable takes precedence over the
    /// file, and the file may be absent when the variable is set.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::resolve(path, std::env::var("COMPANIES").ok())
    }

    fn resolve(path: &Path, env_companies: Option<String>) -> Result<Self, ConfigError> {
        let raw = match env_companies {
            Some(raw) => raw,
            None if path.exists() => companies_from_file(path)?
                .ok_or(ConfigError::Missing("companies"))?,
            None => return Err(ConfigError::Missing("companies")),
        };

        let companies = parse_companies(&raw);
        if companies.is_empty() {
            return Err(ConfigError::Invalid {
                key: "companies",
                reason: "no company identifiers listed".to_string(),
            });
        }

        Ok(Self {
            database_url: database_url(),
            companies,
            yahoo_base_url: std::env::var("YAHOO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_YAHOO_BASE_URL.to_string()),
        })
    }
}

pub fn companies_from_file(path: &Path) -> Result<Option<String>, ConfigError> {
    let ini = Ini::load_from_file(path).map_err(|source| ConfigError::File {
        path: path.display().to_string(),
        source,
    })?;
    Ok(companies_from_ini(&ini))
}

// `[DEFAULT]` first, then keys outside any section. Key lookup ignores case.
fn companies_from_ini(ini: &Ini) -> Option<String> {
    [ini.section(Some("DEFAULT")), Some(ini.general_section())]
        .into_iter()
        .flatten()
        .find_map(|props| {
            props
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("companies"))
                .map(|(_, value)| value.to_string())
        })
}

fn database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Splits a comma-separated list of company identifiers.
pub fn parse_companies(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_companies_trims_and_drops_empties() {
        let companies = parse_companies(" AAPL,MSFT ,, GOOG,");
        assert_eq!(companies, vec!["AAPL", "MSFT", "GOOG"]);
    }

    #[test]
    fn test_parse_companies_keeps_exchange_suffixes() {
        let companies = parse_companies("RY.TO,BRK-B");
        assert_eq!(companies, vec!["RY.TO", "BRK-B"]);
    }

    fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir()
            .join(format!("finance-data-{}-{}.ini", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_default_section_file() {
        let path = write_config("default", "[DEFAULT]\ncompanies = AAPL,MSFT\n");
        let config = IngestConfig::resolve(&path, None).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.companies, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_companies_key_is_case_insensitive() {
        let ini = Ini::load_from_str("[DEFAULT]\nCompanies = IBM\n[other]\ncompanies = NOPE\n").unwrap();
        assert_eq!(companies_from_ini(&ini).as_deref(), Some("IBM"));

        let ini = Ini::load_from_str("companies = GOOG, AMZN\n").unwrap();
        assert_eq!(companies_from_ini(&ini).as_deref(), Some("GOOG, AMZN"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = write_config("override", "[DEFAULT]\ncompanies = AAPL\n");
        let config = IngestConfig::resolve(&path, Some("TSLA,NVDA".to_string())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.companies, vec!["TSLA", "NVDA"]);
    }

    #[test]
    fn test_missing_file_and_key_rejected() {
        let absent = std::env::temp_dir().join("finance-data-does-not-exist.ini");
        assert!(matches!(
            IngestConfig::resolve(&absent, None),
            Err(ConfigError::Missing("companies"))
        ));

        let path = write_config("nokey", "[DEFAULT]\ndatabase = x\n");
        let result = IngestConfig::resolve(&path, None);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Missing("companies"))));
    }

    #[test]
    fn test_empty_company_list_rejected() {
        let path = write_config("empty", "[DEFAULT]\ncompanies = ,\n");
        let result = IngestConfig::resolve(&path, None);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Invalid { key: "companies", .. })));
    }

    #[test]
    fn test_parse_companies_empty_input() {
        assert!(parse_companies("").is_empty());
        assert!(parse_companies(" , ").is_empty());
    }
}
