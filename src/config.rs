//! Configuration loading for Quarry.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`<vault>/.quarry/config.toml`)
//! 3. User config (`~/.quarry/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. Quarry runs with defaults when no config
//! exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{QuarryError, Result};
use crate::providers::ProviderType;
use crate::util::write_atomic;

/// Name of the per-vault and per-user Quarry directory.
pub const QUARRY_DIR: &str = ".quarry";

/// Main configuration struct for Quarry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Quarry note discovery.
    pub discovery: DiscoveryConfig,
    /// Atom note output.
    pub atoms: AtomsConfig,
    /// Critique generation.
    pub critique: CritiqueConfig,
    /// Text-generation provider.
    pub provider: ProviderConfig,
}

/// Quarry note discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Folder prefixes searched for quarry notes.
    pub quarry_folders: Vec<String>,
    /// Metadata field holding the migration status.
    pub migration_field: String,
    /// Status value marking a note as a quarry.
    pub quarry_status: String,
    /// Status written once a note has been atomised.
    pub atomised_status: String,
    /// Also match inline `field:: value` lines, not just frontmatter.
    pub use_inline_fields: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            quarry_folders: vec!["Quarry".to_string()],
            migration_field: "migration".to_string(),
            quarry_status: "quarry".to_string(),
            atomised_status: "atomised".to_string(),
            use_inline_fields: true,
        }
    }
}

/// Atom note output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtomsConfig {
    /// Folder new atoms are written to.
    pub output_folder: String,
    /// Vault path of a note template, if any.
    pub template_path: Option<String>,
}

impl Default for AtomsConfig {
    fn default() -> Self {
        Self {
            output_folder: "Atoms".to_string(),
            template_path: None,
        }
    }
}

/// Critique generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CritiqueConfig {
    /// Ask the provider for critiques instead of using the rules.
    pub use_llm_critique: bool,
    /// Characters of the source note included in the provider prompt.
    pub source_excerpt_chars: usize,
}

impl Default for CritiqueConfig {
    fn default() -> Self {
        Self {
            use_llm_critique: false,
            source_excerpt_chars: 2000,
        }
    }
}

/// Text-generation provider configuration.
///
/// `model` and `api_key` are passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Which provider to use.
    pub provider_type: ProviderType,
    /// Model name, if the provider takes one.
    pub model: Option<String>,
    /// API credential, if the provider takes one.
    pub api_key: Option<String>,
    /// Local-bridge executable.
    pub command: String,
    /// Local-bridge arguments.
    pub args: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::None,
            model: None,
            api_key: None,
            command: "claude".to_string(),
            args: vec!["-p".to_string()],
        }
    }
}

impl Config {
    /// Load configuration for the vault at `vault_root`.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`<vault>/.quarry/config.toml`)
    /// 3. User config (`~/.quarry/config.toml`)
    /// 4. Defaults
    pub fn load(vault_root: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(vault_root) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();
        config
    }

    fn load_user_config() -> Option<Config> {
        let path = quarry_home()?.join("config.toml");
        Self::load_layer(&path)
    }

    fn load_project_config(vault_root: &Path) -> Option<Config> {
        Self::load_layer(&project_config_path(vault_root))
    }

    /// A missing file is silently skipped; a broken one is reported and skipped.
    fn load_layer(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable config");
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| QuarryError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| QuarryError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // QUARRY_FOLDERS
        if let Ok(val) = env::var("QUARRY_FOLDERS") {
            let folders: Vec<String> = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if folders.is_empty() {
                eprintln!(
                    "Warning: Invalid QUARRY_FOLDERS value '{}'. \
                    Expected a comma-separated folder list. Using {:?}.",
                    val, self.discovery.quarry_folders
                );
            } else {
                self.discovery.quarry_folders = folders;
            }
        }

        if let Ok(val) = env::var("QUARRY_MIGRATION_FIELD") {
            if !val.trim().is_empty() {
                self.discovery.migration_field = val.trim().to_string();
            }
        }

        if let Ok(val) = env::var("QUARRY_STATUS") {
            if !val.trim().is_empty() {
                self.discovery.quarry_status = val.trim().to_string();
            }
        }

        if let Ok(val) = env::var("QUARRY_ATOM_FOLDER") {
            self.atoms.output_folder = val.trim().to_string();
        }

        if let Ok(val) = env::var("QUARRY_TEMPLATE") {
            let val = val.trim();
            self.atoms.template_path = (!val.is_empty()).then(|| val.to_string());
        }

        // QUARRY_LLM_CRITIQUE
        if let Ok(val) = env::var("QUARRY_LLM_CRITIQUE") {
            self.critique.use_llm_critique = val == "true" || val == "1";
        }

        // QUARRY_PROVIDER
        if let Ok(val) = env::var("QUARRY_PROVIDER") {
            match ProviderType::parse(&val) {
                Some(provider_type) => self.provider.provider_type = provider_type,
                None => eprintln!(
                    "Warning: Invalid QUARRY_PROVIDER value '{}'. \
                    Valid values: none, local-bridge, anthropic, openai. Using '{}'.",
                    val, self.provider.provider_type
                ),
            }
        }

        if let Ok(val) = env::var("QUARRY_MODEL") {
            if !val.trim().is_empty() {
                self.provider.model = Some(val.trim().to_string());
            }
        }

        if let Ok(val) = env::var("QUARRY_API_KEY") {
            if !val.is_empty() {
                self.provider.api_key = Some(val);
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// Values in `other` that differ from the defaults override values in
    /// `self`. A higher layer cannot reset a lower layer's value back to
    /// the default by writing the default explicitly.
    fn merge(mut self, other: Config) -> Self {
        let default_discovery = DiscoveryConfig::default();
        if other.discovery.quarry_folders != default_discovery.quarry_folders {
            self.discovery.quarry_folders = other.discovery.quarry_folders;
        }
        if other.discovery.migration_field != default_discovery.migration_field {
            self.discovery.migration_field = other.discovery.migration_field;
        }
        if other.discovery.quarry_status != default_discovery.quarry_status {
            self.discovery.quarry_status = other.discovery.quarry_status;
        }
        if other.discovery.atomised_status != default_discovery.atomised_status {
            self.discovery.atomised_status = other.discovery.atomised_status;
        }
        if other.discovery.use_inline_fields != default_discovery.use_inline_fields {
            self.discovery.use_inline_fields = other.discovery.use_inline_fields;
        }

        let default_atoms = AtomsConfig::default();
        if other.atoms.output_folder != default_atoms.output_folder {
            self.atoms.output_folder = other.atoms.output_folder;
        }
        if other.atoms.template_path.is_some() {
            self.atoms.template_path = other.atoms.template_path;
        }

        let default_critique = CritiqueConfig::default();
        if other.critique.use_llm_critique != default_critique.use_llm_critique {
            self.critique.use_llm_critique = other.critique.use_llm_critique;
        }
        if other.critique.source_excerpt_chars != default_critique.source_excerpt_chars {
            self.critique.source_excerpt_chars = other.critique.source_excerpt_chars;
        }

        let default_provider = ProviderConfig::default();
        if other.provider.provider_type != default_provider.provider_type {
            self.provider.provider_type = other.provider.provider_type;
        }
        if other.provider.model.is_some() {
            self.provider.model = other.provider.model;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }
        if other.provider.command != default_provider.command {
            self.provider.command = other.provider.command;
        }
        if other.provider.args != default_provider.args {
            self.provider.args = other.provider.args;
        }

        self
    }

    /// Save configuration to the vault's project config file.
    ///
    /// Creates `<vault>/.quarry/` if needed. The write is atomic.
    pub fn save_project(&self, vault_root: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| QuarryError::config(e.to_string()))?;
        write_atomic(&project_config_path(vault_root), content.as_bytes())
    }
}

/// Get the Quarry home directory.
///
/// Uses `QUARRY_HOME` if set and non-empty, otherwise `~/.quarry`.
pub fn quarry_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("QUARRY_HOME") {
        if home.is_empty() {
            tracing::warn!("QUARRY_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            return Some(path.canonicalize().unwrap_or(path));
        }
    }

    dirs::home_dir().map(|home| home.join(QUARRY_DIR))
}

/// The vault's Quarry directory: `<vault>/.quarry/`.
pub fn project_quarry_dir(vault_root: &Path) -> PathBuf {
    vault_root.join(QUARRY_DIR)
}

/// The vault's project config file.
pub fn project_config_path(vault_root: &Path) -> PathBuf {
    project_quarry_dir(vault_root).join("config.toml")
}

/// The vault's live session file.
pub fn session_path(vault_root: &Path) -> PathBuf {
    project_quarry_dir(vault_root).join("session.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "QUARRY_FOLDERS",
        "QUARRY_MIGRATION_FIELD",
        "QUARRY_STATUS",
        "QUARRY_ATOM_FOLDER",
        "QUARRY_TEMPLATE",
        "QUARRY_LLM_CRITIQUE",
        "QUARRY_PROVIDER",
        "QUARRY_MODEL",
        "QUARRY_API_KEY",
    ];

    /// Point QUARRY_HOME at an empty directory and clear overrides.
    fn isolated_env() -> TempDir {
        let home = TempDir::new().unwrap();
        env::set_var("QUARRY_HOME", home.path());
        for var in ENV_VARS {
            env::remove_var(var);
        }
        home
    }

    fn write_project_config(vault: &Path, toml_content: &str) {
        let dir = project_quarry_dir(vault);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), toml_content).unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.discovery.quarry_folders, vec!["Quarry"]);
        assert_eq!(config.discovery.migration_field, "migration");
        assert_eq!(config.discovery.quarry_status, "quarry");
        assert_eq!(config.discovery.atomised_status, "atomised");
        assert!(config.discovery.use_inline_fields);
        assert_eq!(config.atoms.output_folder, "Atoms");
        assert!(config.atoms.template_path.is_none());
        assert!(!config.critique.use_llm_critique);
        assert_eq!(config.critique.source_excerpt_chars, 2000);
        assert_eq!(config.provider.provider_type, ProviderType::None);
        assert_eq!(config.provider.command, "claude");
        assert_eq!(config.provider.args, vec!["-p"]);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[atoms]
output_folder = "Zettel"

[provider]
provider_type = "local-bridge"
"#,
        )
        .unwrap();

        assert_eq!(config.atoms.output_folder, "Zettel");
        assert_eq!(config.provider.provider_type, ProviderType::LocalBridge);
        assert_eq!(config.provider.command, "claude");
        assert_eq!(config.discovery, DiscoveryConfig::default());
    }

    #[test]
    fn test_invalid_provider_type_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
[provider]
provider_type = "gemini"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_missing_and_invalid() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load_from_file(&dir.path().join("none.toml")),
            Err(QuarryError::Storage { .. })
        ));

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[atoms\noutput_folder = ").unwrap();
        assert!(matches!(
            Config::load_from_file(&bad),
            Err(QuarryError::Config { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_project_config_precedence() {
        let _home = isolated_env();
        let vault = TempDir::new().unwrap();
        write_project_config(
            vault.path(),
            r#"
[discovery]
quarry_folders = ["Inbox", "Reading"]

[critique]
use_llm_critique = true
"#,
        );

        let config = Config::load(vault.path());

        assert_eq!(config.discovery.quarry_folders, vec!["Inbox", "Reading"]);
        assert!(config.critique.use_llm_critique);
        assert_eq!(config.atoms.output_folder, "Atoms");
    }

    #[test]
    #[serial]
    fn test_user_config_below_project() {
        let home = isolated_env();
        fs::write(
            home.path().join("config.toml"),
            r#"
[atoms]
output_folder = "UserAtoms"
template_path = "Templates/User.md"
"#,
        )
        .unwrap();
        let vault = TempDir::new().unwrap();
        write_project_config(
            vault.path(),
            r#"
[atoms]
output_folder = "ProjectAtoms"
"#,
        );

        let config = Config::load(vault.path());

        assert_eq!(config.atoms.output_folder, "ProjectAtoms");
        assert_eq!(config.atoms.template_path.as_deref(), Some("Templates/User.md"));
        env::remove_var("QUARRY_HOME");
    }

    #[test]
    #[serial]
    fn test_broken_project_config_ignored() {
        let _home = isolated_env();
        let vault = TempDir::new().unwrap();
        write_project_config(vault.path(), "not = [valid");

        assert_eq!(Config::load(vault.path()), Config::default());
        env::remove_var("QUARRY_HOME");
    }

    #[test]
    #[serial]
    fn test_env_var_precedence() {
        let _home = isolated_env();
        let vault = TempDir::new().unwrap();
        write_project_config(
            vault.path(),
            r#"
[atoms]
output_folder = "FromFile"
"#,
        );

        env::set_var("QUARRY_ATOM_FOLDER", "FromEnv");
        let config = Config::load(vault.path());
        assert_eq!(config.atoms.output_folder, "FromEnv");

        env::remove_var("QUARRY_ATOM_FOLDER");
        env::remove_var("QUARRY_HOME");
    }

    #[test]
    #[serial]
    fn test_env_var_overrides() {
        let _home = isolated_env();
        env::set_var("QUARRY_FOLDERS", "Inbox, Books ,");
        env::set_var("QUARRY_MIGRATION_FIELD", "status");
        env::set_var("QUARRY_STATUS", "to-split");
        env::set_var("QUARRY_TEMPLATE", "Templates/Atom.md");
        env::set_var("QUARRY_LLM_CRITIQUE", "1");
        env::set_var("QUARRY_PROVIDER", "local-bridge");
        env::set_var("QUARRY_MODEL", "sonnet");
        env::set_var("QUARRY_API_KEY", "sk-test");

        let vault = TempDir::new().unwrap();
        let config = Config::load(vault.path());

        assert_eq!(config.discovery.quarry_folders, vec!["Inbox", "Books"]);
        assert_eq!(config.discovery.migration_field, "status");
        assert_eq!(config.discovery.quarry_status, "to-split");
        assert_eq!(config.atoms.template_path.as_deref(), Some("Templates/Atom.md"));
        assert!(config.critique.use_llm_critique);
        assert_eq!(config.provider.provider_type, ProviderType::LocalBridge);
        assert_eq!(config.provider.model.as_deref(), Some("sonnet"));
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));

        for var in ENV_VARS {
            env::remove_var(var);
        }
        env::remove_var("QUARRY_HOME");
    }

    #[test]
    #[serial]
    fn test_env_var_invalid_values_ignored() {
        let _home = isolated_env();
        env::set_var("QUARRY_PROVIDER", "gemini");
        env::set_var("QUARRY_FOLDERS", " , ");

        let vault = TempDir::new().unwrap();
        let config = Config::load(vault.path());

        assert_eq!(config.provider.provider_type, ProviderType::None);
        assert_eq!(config.discovery.quarry_folders, vec!["Quarry"]);

        env::remove_var("QUARRY_PROVIDER");
        env::remove_var("QUARRY_FOLDERS");
        env::remove_var("QUARRY_HOME");
    }

    #[test]
    fn test_merge_field_by_field_preserves_non_default_values() {
        let mut lower = Config::default();
        lower.discovery.migration_field = "status".to_string();
        lower.provider.model = Some("haiku".to_string());

        let mut upper = Config::default();
        upper.discovery.quarry_status = "to-split".to_string();

        let merged = lower.merge(upper);

        assert_eq!(merged.discovery.migration_field, "status");
        assert_eq!(merged.discovery.quarry_status, "to-split");
        assert_eq!(merged.provider.model.as_deref(), Some("haiku"));
    }

    #[test]
    fn test_merge_with_explicit_defaults_does_not_reset() {
        let mut lower = Config::default();
        lower.critique.use_llm_critique = true;

        let merged = lower.merge(Config::default());
        assert!(merged.critique.use_llm_critique);
    }

    #[test]
    fn test_full_toml_roundtrip() {
        let mut config = Config::default();
        config.discovery.quarry_folders = vec!["A".into(), "B".into()];
        config.atoms.template_path = Some("T.md".into());
        config.provider.provider_type = ProviderType::OpenAi;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_project_creates_config_file() {
        let vault = TempDir::new().unwrap();
        let mut config = Config::default();
        config.atoms.output_folder = "Saved".into();

        config.save_project(vault.path()).unwrap();

        let loaded = Config::load_from_file(&project_config_path(vault.path())).unwrap();
        assert_eq!(loaded.atoms.output_folder, "Saved");
        assert!(!project_quarry_dir(vault.path()).join(".config.toml.tmp").exists());
    }

    #[test]
    #[serial]
    fn test_quarry_home_with_env() {
        let dir = TempDir::new().unwrap();
        env::set_var("QUARRY_HOME", dir.path());
        assert_eq!(quarry_home(), Some(dir.path().to_path_buf()));

        env::set_var("QUARRY_HOME", "");
        let home = quarry_home();
        if let Some(h) = dirs::home_dir() {
            assert_eq!(home, Some(h.join(".quarry")));
        }
        env::remove_var("QUARRY_HOME");
    }

    #[test]
    fn test_project_paths() {
        let vault = Path::new("/vault");
        assert_eq!(project_quarry_dir(vault), PathBuf::from("/vault/.quarry"));
        assert_eq!(
            project_config_path(vault),
            PathBuf::from("/vault/.quarry/config.toml")
        );
        assert_eq!(session_path(vault), PathBuf::from("/vault/.quarry/session.json"));
    }
}
