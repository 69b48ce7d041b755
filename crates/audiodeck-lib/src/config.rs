//! Configuration — optional TOML file, overridden by CLI flags.
//!
//! ```toml
//! base_dir = "audio"
//! identifiers = ["001", "002", "003"]   # or: count = 3
//! archive_name = "audio_files.zip"
//!
//! [server]
//! port = 2004
//!
//! [tts]
//! url = "http://localhost:3001"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use audiodeck_core::types::{
    ARCHIVE_FILE_NAME, ARCHIVE_FOLDER, Catalog, DEFAULT_BASE_DIR, Identifier,
};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub base_dir: String,
    /// Explicit identifier list. Mutually exclusive with `count`.
    pub identifiers: Option<Vec<Identifier>>,
    /// Shorthand for `001..=count`.
    pub count: Option<usize>,
    pub archive_name: String,
    pub archive_folder: String,
    pub server: ServerConfig,
    pub tts: TtsConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            base_dir: DEFAULT_BASE_DIR.into(),
            identifiers: None,
            count: None,
            archive_name: ARCHIVE_FILE_NAME.into(),
            archive_folder: ARCHIVE_FOLDER.into(),
            server: ServerConfig::default(),
            tts: TtsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 2004,
        }
    }
}

/// Kokoro / OpenAI-compatible speech endpoint used by `prepare`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub url: String,
    pub voice: String,
    pub speed: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3001".into(),
            voice: "af_heart".into(),
            speed: 1.0,
        }
    }
}

impl DeckConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identifiers.is_some() && self.count.is_some() {
            return Err(ConfigError::Invalid(
                "set either `identifiers` or `count`, not both".into(),
            ));
        }
        if let Some(ids) = &self.identifiers {
            let mut seen = HashSet::new();
            if let Some(dup) = ids.iter().find(|id| !seen.insert(*id)) {
                return Err(ConfigError::Invalid(format!("duplicate identifier '{dup}'")));
            }
        }
        for (field, value) in [
            ("base_dir", &self.base_dir),
            ("archive_folder", &self.archive_folder),
        ] {
            let trimmed = value.trim_matches('/');
            if trimmed.is_empty() || trimmed.split('/').any(|seg| seg == "..") {
                return Err(ConfigError::Invalid(format!("bad {field} '{value}'")));
            }
        }
        if self.archive_name.is_empty() || self.archive_name.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "bad archive_name '{}'",
                self.archive_name
            )));
        }
        Ok(())
    }

    /// The fixed identifier sequence this config describes.
    pub fn catalog(&self) -> Catalog {
        match (&self.identifiers, self.count) {
            (Some(ids), _) => Catalog::new(self.base_dir.clone(), ids.clone()),
            (None, Some(n)) => Catalog::from_count(self.base_dir.clone(), n),
            (None, None) => {
                let default = Catalog::default();
                Catalog::new(self.base_dir.clone(), default.identifiers().to_vec())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = DeckConfig::from_toml_str("").unwrap();
        assert_eq!(config.catalog(), Catalog::default());
        assert_eq!(config.archive_name, "audio_files.zip");
        assert_eq!(config.server.port, 2004);
    }

    #[test]
    fn explicit_identifiers() {
        let config = DeckConfig::from_toml_str(
            r#"
            base_dir = "clips"
            identifiers = ["intro", "002"]
            "#,
        )
        .unwrap();
        let catalog = config.catalog();
        assert_eq!(catalog.base_dir(), "clips");
        let ids: Vec<&str> = catalog.identifiers().iter().map(|i| i.as_str()).collect();
        assert_eq!(ids, vec!["intro", "002"]);
    }

    #[test]
    fn slashed_base_dir_is_normalized() {
        let config = DeckConfig::from_toml_str("base_dir = \"/audio/\"").unwrap();
        assert_eq!(config.catalog().base_dir(), "audio");
    }

    #[test]
    fn count_and_empty_list() {
        let config = DeckConfig::from_toml_str("count = 3").unwrap();
        assert_eq!(config.catalog().len(), 3);

        let config = DeckConfig::from_toml_str("identifiers = []").unwrap();
        assert!(config.catalog().is_empty());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(DeckConfig::from_toml_str("identifiers = [\"../x\"]").is_err());
        assert!(DeckConfig::from_toml_str("identifiers = [\"1\", \"1\"]").is_err());
        assert!(DeckConfig::from_toml_str("identifiers = [\"1\"]\ncount = 1").is_err());
        assert!(DeckConfig::from_toml_str("base_dir = \"../up\"").is_err());
        assert!(DeckConfig::from_toml_str("archive_name = \"a/b.zip\"").is_err());
        assert!(DeckConfig::from_toml_str("count = \"many\"").is_err());
    }

    #[test]
    fn nested_sections() {
        let config = DeckConfig::from_toml_str(
            r#"
            [server]
            port = 8080

            [tts]
            voice = "af_jadzia"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.tts.voice, "af_jadzia");
        assert_eq!(config.tts.speed, 1.0);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = DeckConfig::load(Path::new("/nonexistent/audiodeck.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
