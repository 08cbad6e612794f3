//! Configuration file management for plancraft.
//!
//! Provides a TOML-based config file at `~/.config/plancraft/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use plancraft_core::llm::{LlmConfig, LlmProvider};
use plancraft_db::config::DbConfig;

pub const OWNER_ENV_VAR: &str = "PLANCRAFT_OWNER_ID";
pub const PROVIDER_ENV_VAR: &str = "PLANCRAFT_LLM_PROVIDER";
pub const API_KEY_ENV_VAR: &str = "PLANCRAFT_LLM_API_KEY";
pub const MODEL_ENV_VAR: &str = "PLANCRAFT_LLM_MODEL";
pub const BASE_URL_ENV_VAR: &str = "PLANCRAFT_LLM_BASE_URL";
pub const TIMEOUT_ENV_VAR: &str = "PLANCRAFT_LLM_TIMEOUT_SECS";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub llm: LlmSection,
    pub owner: OwnerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<LlmProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerSection {
    /// Default owner for plans created and listed from this machine.
    pub id: Uuid,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the plancraft config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/plancraft` or
/// `~/.config/plancraft`, never the macOS `Application Support` directory.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("plancraft");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("plancraft")
}

/// Return the path to the plancraft config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since the file may hold an API key.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PlancraftConfig {
    pub db_config: DbConfig,
    pub llm_config: LlmConfig,
    /// Owner from env or config file; `None` if neither sets one.
    pub owner_id: Option<Uuid>,
}

impl PlancraftConfig {
    /// Resolve configuration from the environment and the config file, if any.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        Self::resolve_with(cli_db_url, load_config().ok())
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `PLANCRAFT_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - LLM settings: `PLANCRAFT_LLM_*` > `[llm]` > provider defaults. The API
    ///   key additionally falls back to the provider's own variable
    ///   (`OPENAI_API_KEY`, `GEMINI_API_KEY`). A missing key is not an error here.
    /// - Owner: `PLANCRAFT_OWNER_ID` > `owner.id`
    pub fn resolve_with(cli_db_url: Option<&str>, file_config: Option<ConfigFile>) -> Result<Self> {
        let file_db_url = file_config.as_ref().map(|cfg| cfg.database.url.as_str());
        let db_config = DbConfig::resolve(cli_db_url, file_db_url);

        let llm_section = file_config.as_ref().map(|cfg| &cfg.llm);
        let llm_config = resolve_llm(llm_section)?;

        let owner_id = match env_nonempty(OWNER_ENV_VAR) {
            Some(raw) => Some(
                raw.parse::<Uuid>()
                    .with_context(|| format!("{OWNER_ENV_VAR} is not a valid UUID: {raw:?}"))?,
            ),
            None => file_config.as_ref().map(|cfg| cfg.owner.id),
        };

        Ok(Self {
            db_config,
            llm_config,
            owner_id,
        })
    }

    /// The owner to act as: the CLI flag, else the resolved default.
    pub fn owner(&self, cli_owner: Option<Uuid>) -> Result<Uuid> {
        match cli_owner.or(self.owner_id) {
            Some(id) => Ok(id),
            None => bail!(
                "no owner id; pass --owner, set {OWNER_ENV_VAR}, or run `plancraft init` to create a config file"
            ),
        }
    }
}

fn resolve_llm(section: Option<&LlmSection>) -> Result<LlmConfig> {
    let provider = match env_nonempty(PROVIDER_ENV_VAR) {
        Some(raw) => raw
            .parse::<LlmProvider>()
            .with_context(|| format!("invalid {PROVIDER_ENV_VAR}"))?,
        None => section
            .and_then(|s| s.provider)
            .unwrap_or(LlmProvider::OpenAi),
    };

    let mut config = LlmConfig::new(provider);

    config.api_key = env_nonempty(API_KEY_ENV_VAR)
        .or_else(|| section.and_then(|s| s.api_key.clone()))
        .or_else(|| env_nonempty(provider.api_key_env_var()));

    if let Some(model) = env_nonempty(MODEL_ENV_VAR).or_else(|| section.and_then(|s| s.model.clone())) {
        config.model = model;
    }

    config.base_url =
        env_nonempty(BASE_URL_ENV_VAR).or_else(|| section.and_then(|s| s.base_url.clone()));

    let timeout_secs = match env_nonempty(TIMEOUT_ENV_VAR) {
        Some(raw) => Some(
            raw.parse::<u64>()
                .with_context(|| format!("{TIMEOUT_ENV_VAR} must be a whole number of seconds"))?,
        ),
        None => section.and_then(|s| s.timeout_secs),
    };
    if let Some(secs) = timeout_secs {
        if secs == 0 {
            bail!("LLM timeout must be at least one second");
        }
        config.timeout = Duration::from_secs(secs);
    }

    Ok(config)
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{EnvGuard, lock_env};

    const LLM_VARS: &[&str] = &[
        PROVIDER_ENV_VAR,
        API_KEY_ENV_VAR,
        MODEL_ENV_VAR,
        BASE_URL_ENV_VAR,
        TIMEOUT_ENV_VAR,
        "OPENAI_API_KEY",
        "GEMINI_API_KEY",
        OWNER_ENV_VAR,
        DbConfig::ENV_VAR,
    ];

    fn file_config() -> ConfigFile {
        ConfigFile {
            database: DatabaseSection {
                url: "postgresql://file:5432/filedb".to_string(),
            },
            llm: LlmSection {
                provider: Some(LlmProvider::Gemini),
                model: Some("gemini-1.5-pro".to_string()),
                api_key: Some("file-key".to_string()),
                base_url: None,
                timeout_secs: Some(30),
            },
            owner: OwnerSection { id: Uuid::nil() },
        }
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = EnvGuard::set(&[("XDG_CONFIG_HOME", tmp.path().to_str().unwrap())]);

        let original = file_config();
        save_config(&original).unwrap();

        let path = config_path();
        assert!(path.starts_with(tmp.path()));
        let loaded = load_config().unwrap();

        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.llm.provider, Some(LlmProvider::Gemini));
        assert_eq!(loaded.llm.timeout_secs, Some(30));
        assert_eq!(loaded.owner.id, Uuid::nil());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let meta = std::fs::metadata(&path).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        }
    }

    #[test]
    fn llm_section_is_optional_in_file() {
        let parsed: ConfigFile = toml::from_str(
            "[database]\nurl = \"postgresql://x/y\"\n\n[owner]\nid = \"00000000-0000-0000-0000-000000000000\"\n",
        )
        .unwrap();
        assert!(parsed.llm.provider.is_none());
        assert!(parsed.llm.api_key.is_none());
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        let _env = EnvGuard::clear(LLM_VARS);
        let _db = EnvGuard::set(&[(DbConfig::ENV_VAR, "postgresql://env:5432/envdb")]);

        let config =
            PlancraftConfig::resolve_with(Some("postgresql://cli:5432/clidb"), Some(file_config()))
                .unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        let _env = EnvGuard::clear(LLM_VARS);
        let _set = EnvGuard::set(&[
            (DbConfig::ENV_VAR, "postgresql://env:5432/envdb"),
            (PROVIDER_ENV_VAR, "openai"),
            (MODEL_ENV_VAR, "gpt-4o-mini"),
            (TIMEOUT_ENV_VAR, "15"),
        ]);

        let config = PlancraftConfig::resolve_with(None, Some(file_config())).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(config.llm_config.provider, LlmProvider::OpenAi);
        assert_eq!(config.llm_config.model, "gpt-4o-mini");
        assert_eq!(config.llm_config.timeout, Duration::from_secs(15));
        // Key still comes from the file.
        assert_eq!(config.llm_config.api_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn resolve_uses_file_then_defaults() {
        let _lock = lock_env();
        let _env = EnvGuard::clear(LLM_VARS);

        let from_file = PlancraftConfig::resolve_with(None, Some(file_config())).unwrap();
        assert_eq!(from_file.db_config.database_url, "postgresql://file:5432/filedb");
        assert_eq!(from_file.llm_config.provider, LlmProvider::Gemini);
        assert_eq!(from_file.llm_config.model, "gemini-1.5-pro");
        assert_eq!(from_file.owner_id, Some(Uuid::nil()));

        let defaults = PlancraftConfig::resolve_with(None, None).unwrap();
        assert_eq!(defaults.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(defaults.llm_config.provider, LlmProvider::OpenAi);
        assert_eq!(defaults.llm_config.model, "gpt-3.5-turbo");
        assert_eq!(defaults.llm_config.timeout, LlmConfig::DEFAULT_TIMEOUT);
        assert!(defaults.llm_config.api_key.is_none());
        assert!(defaults.owner_id.is_none());
    }

    #[test]
    fn blank_database_env_var_is_ignored() {
        let _lock = lock_env();
        let _env = EnvGuard::clear(LLM_VARS);
        let _set = EnvGuard::set(&[(DbConfig::ENV_VAR, "  ")]);

        let config = PlancraftConfig::resolve_with(None, Some(file_config())).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
    }

    #[test]
    fn api_key_falls_back_to_provider_variable() {
        let _lock = lock_env();
        let _env = EnvGuard::clear(LLM_VARS);
        let _set = EnvGuard::set(&[(PROVIDER_ENV_VAR, "gemini"), ("GEMINI_API_KEY", "g-key")]);

        let config = PlancraftConfig::resolve_with(None, None).unwrap();
        assert_eq!(config.llm_config.provider, LlmProvider::Gemini);
        assert_eq!(config.llm_config.api_key.as_deref(), Some("g-key"));
    }

    #[test]
    fn invalid_env_values_are_errors() {
        let _lock = lock_env();
        let _env = EnvGuard::clear(LLM_VARS);

        {
            let _set = EnvGuard::set(&[(PROVIDER_ENV_VAR, "claude")]);
            let err = PlancraftConfig::resolve_with(None, None).unwrap_err();
            assert!(format!("{err:#}").contains("invalid LLM provider"), "{err:#}");
        }
        {
            let _set = EnvGuard::set(&[(TIMEOUT_ENV_VAR, "soon")]);
            assert!(PlancraftConfig::resolve_with(None, None).is_err());
        }
        {
            let _set = EnvGuard::set(&[(OWNER_ENV_VAR, "not-a-uuid")]);
            let err = PlancraftConfig::resolve_with(None, None).unwrap_err();
            assert!(err.to_string().contains(OWNER_ENV_VAR));
        }
    }

    #[test]
    fn owner_prefers_cli_flag() {
        let _lock = lock_env();
        let _env = EnvGuard::clear(LLM_VARS);

        let config = PlancraftConfig::resolve_with(None, Some(file_config())).unwrap();
        let cli = Uuid::new_v4();
        assert_eq!(config.owner(Some(cli)).unwrap(), cli);
        assert_eq!(config.owner(None).unwrap(), Uuid::nil());

        let bare = PlancraftConfig::resolve_with(None, None).unwrap();
        let err = bare.owner(None).unwrap_err();
        assert!(err.to_string().contains("no owner id"));
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("plancraft/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
