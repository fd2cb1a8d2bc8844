use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    FileReadError(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Longest value a cache record can hold, in UTF-16 code units
pub const MAX_STORABLE_VALUE_LENGTH: usize = i16::MAX as usize;

/// Phase of the vetting cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Submission,
    Vetting,
    Closed,
    Readonly,
}

impl Phase {
    /// Whether ordinary voters may still vote
    pub fn is_open(&self) -> bool {
        matches!(self, Phase::Submission | Phase::Vetting)
    }
}

impl FromStr for Phase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "submission" => Ok(Phase::Submission),
            "vetting" => Ok(Phase::Vetting),
            "closed" => Ok(Phase::Closed),
            "readonly" | "read-only" => Ok(Phase::Readonly),
            other => Err(ConfigError::InvalidEnvVar("VETTING_PHASE".to_string(), other.to_string())),
        }
    }
}

/// Vote weights at which a winning value is promoted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Weight required for approval in an ordinary locale
    #[serde(default = "default_required_votes")]
    pub required_votes: u32,
    /// Weight required for approval in an established locale
    #[serde(default = "default_established_required_votes")]
    pub established_required_votes: u32,
    /// Weight required for approval on sensitive paths
    #[serde(default = "default_high_bar")]
    pub high_bar: u32,
    #[serde(default = "default_provisional_votes")]
    pub provisional_votes: u32,
    #[serde(default = "default_contributed_votes")]
    pub contributed_votes: u32,
    /// Number of agreeing organizations, with none opposed, that approves a
    /// value outright
    #[serde(default = "default_unanimous_organizations")]
    pub unanimous_organizations: usize,
    /// Fixed margin under which a lead counts as disputed. When unset the
    /// largest single-organization contribution on the path is used.
    #[serde(default)]
    pub dispute_margin: Option<u32>,
}

fn default_required_votes() -> u32 {
    4
}

fn default_established_required_votes() -> u32 {
    8
}

fn default_high_bar() -> u32 {
    20
}

fn default_provisional_votes() -> u32 {
    2
}

fn default_contributed_votes() -> u32 {
    4
}

fn default_unanimous_organizations() -> usize {
    3
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            required_votes: default_required_votes(),
            established_required_votes: default_established_required_votes(),
            high_bar: default_high_bar(),
            provisional_votes: default_provisional_votes(),
            contributed_votes: default_contributed_votes(),
            unanimous_organizations: default_unanimous_organizations(),
            dispute_margin: None,
        }
    }
}

impl Thresholds {
    /// Approval bar for a path
    pub fn required_for(&self, established: bool, high_bar: bool) -> u32 {
        if high_bar {
            self.high_bar
        } else if established {
            self.established_required_votes
        } else {
            self.required_votes
        }
    }
}

/// Main vetting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VettingConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Cache directory, `<data_dir>/cache` when unset
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Frozen locales; their overlays never load votes
    #[serde(default = "default_read_only_locales")]
    pub read_only_locales: Vec<String>,
    /// Locales whose approval bar is raised
    #[serde(default)]
    pub established_locales: Vec<String>,
    /// Path prefixes that need the high bar
    #[serde(default)]
    pub high_bar_paths: Vec<String>,
    #[serde(default = "default_max_value_length")]
    pub max_value_length: usize,
    #[serde(default = "default_phase")]
    pub phase: Phase,
    /// Accept votes on paths the baseline does not know
    #[serde(default)]
    pub allow_new_paths: bool,
    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/vetting")
}

fn default_cache_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_read_only_locales() -> Vec<String> {
    vec!["root".to_string(), "en".to_string()]
}

fn default_max_value_length() -> usize {
    4000
}

fn default_phase() -> Phase {
    Phase::Vetting
}

impl Default for VettingConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_dir: None,
            cache_enabled: default_cache_enabled(),
            log_level: default_log_level(),
            read_only_locales: default_read_only_locales(),
            established_locales: Vec::new(),
            high_bar_paths: Vec::new(),
            max_value_length: default_max_value_length(),
            phase: default_phase(),
            allow_new_paths: false,
            thresholds: Thresholds::default(),
        }
    }
}

impl VettingConfig {
    /// Configuration rooted at `data_dir` with every other setting defaulted
    pub fn with_data_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `VETTING_CONFIG_FILE` names a YAML file to load; otherwise defaults
    /// are overridden by the individual `VETTING_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`VettingConfig::from_env`] with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("VETTING_CONFIG_FILE") {
            if !Path::new(&path).exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            return Self::from_file(&path);
        }

        let mut config = Self::default();
        if let Some(dir) = lookup("VETTING_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("VETTING_CACHE_DIR") {
            config.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = lookup("VETTING_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(phase) = lookup("VETTING_PHASE") {
            config.phase = phase.parse()?;
        }
        if let Some(locales) = lookup("VETTING_READ_ONLY_LOCALES") {
            config.read_only_locales = locales
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(enabled) = lookup("VETTING_CACHE_ENABLED") {
            config.cache_enabled = enabled
                .parse::<bool>()
                .map_err(|e| ConfigError::InvalidEnvVar("VETTING_CACHE_ENABLED".to_string(), e.to_string()))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: VettingConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject threshold combinations that cannot be satisfied in order
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if t.provisional_votes > t.contributed_votes {
            return Err(ConfigError::Invalid(format!(
                "provisional_votes ({}) exceeds contributed_votes ({})",
                t.provisional_votes, t.contributed_votes
            )));
        }
        if t.high_bar < t.required_votes || t.high_bar < t.established_required_votes {
            return Err(ConfigError::Invalid(format!(
                "high_bar ({}) is below the normal approval bar",
                t.high_bar
            )));
        }
        if t.unanimous_organizations == 0 {
            return Err(ConfigError::Invalid("unanimous_organizations must be positive".to_string()));
        }
        if self.max_value_length == 0 || self.max_value_length > MAX_STORABLE_VALUE_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "max_value_length must be between 1 and {}",
                MAX_STORABLE_VALUE_LENGTH
            )));
        }
        Ok(())
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("cache"))
    }

    pub fn baseline_dir(&self) -> PathBuf {
        self.data_dir.join("baseline")
    }

    pub fn voters_file(&self) -> PathBuf {
        self.data_dir.join("voters.yaml")
    }

    pub fn votes_db(&self) -> PathBuf {
        self.data_dir.join("votes")
    }

    pub fn is_read_only(&self, locale: &str) -> bool {
        self.read_only_locales.iter().any(|l| l == locale)
    }

    pub fn is_established(&self, locale: &str) -> bool {
        let language = locale.split('_').next().unwrap_or(locale);
        self.established_locales
            .iter()
            .any(|l| l == locale || l == language)
    }

    pub fn is_high_bar(&self, path: &str) -> bool {
        self.high_bar_paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Approval bar for `path` in `locale`
    pub fn required_votes(&self, locale: &str, path: &str) -> u32 {
        self.thresholds
            .required_for(self.is_established(locale), self.is_high_bar(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = VettingConfig::default();
        assert_eq!(config.thresholds.required_votes, 4);
        assert_eq!(config.thresholds.high_bar, 20);
        assert_eq!(config.log_level, "info");
        assert!(config.is_read_only("root"));
        assert!(config.is_read_only("en"));
        assert!(!config.is_read_only("fr"));
        assert_eq!(config.cache_path(), PathBuf::from("/var/lib/vetting/cache"));
        config.validate().unwrap();
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VETTING_DATA_DIR", "/tmp/vetting"),
            ("VETTING_PHASE", "closed"),
            ("VETTING_READ_ONLY_LOCALES", "root, und"),
        ]
        .into_iter()
        .collect();
        let config = VettingConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/vetting"));
        assert_eq!(config.phase, Phase::Closed);
        assert!(!config.phase.is_open());
        assert!(config.is_read_only("und"));
        assert!(!config.is_read_only("en"));

        let bad = VettingConfig::from_lookup(|k| (k == "VETTING_PHASE").then(|| "sometimes".to_string()));
        assert!(matches!(bad, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "data_dir: /srv/vetting\nestablished_locales: [de]\nhigh_bar_paths: [\"//ldml/numbers\"]\nthresholds:\n  required_votes: 6\n  dispute_margin: 3\n"
        )
        .unwrap();

        let config = VettingConfig::from_file(file.path()).unwrap();
        assert_eq!(config.thresholds.required_votes, 6);
        assert_eq!(config.thresholds.established_required_votes, 8);
        assert_eq!(config.thresholds.dispute_margin, Some(3));
        assert_eq!(config.required_votes("fr", "//ldml/units"), 6);
        assert_eq!(config.required_votes("de_AT", "//ldml/units"), 8);
        assert_eq!(config.required_votes("fr", "//ldml/numbers/symbols"), 20);

        let missing = VettingConfig::from_lookup(|k| (k == "VETTING_CONFIG_FILE").then(|| "/nonexistent/vetting.yaml".to_string()));
        assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = VettingConfig::default();
        config.thresholds.high_bar = 2;
        assert!(config.validate().is_err());

        let mut config = VettingConfig::default();
        config.max_value_length = MAX_STORABLE_VALUE_LENGTH + 1;
        assert!(config.validate().is_err());
    }
}
