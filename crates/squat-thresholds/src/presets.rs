//! Difficulty presets
//!
//! Presets are literal TOML data. The built-in file is embedded at compile
//! time; a user file and `SQUAT_*` environment variables can override any
//! subset of keys (e.g. `SQUAT_STRICT__ANKLE_MAX=28`).

use crate::{ConfigError, ThresholdConfig, Thresholds};
use config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

const BUILTIN_PRESETS: &str = include_str!("../presets.toml");

/// Difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    #[serde(alias = "beginner")]
    Lenient,
    #[serde(alias = "pro")]
    Strict,
}

impl Difficulty {
    /// Built-in thresholds for this tier
    pub fn thresholds(self) -> Result<Thresholds, ConfigError> {
        PresetBook::builtin()?.get(self)
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" | "beginner" => Ok(Difficulty::Lenient),
            "strict" | "pro" => Ok(Difficulty::Strict),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Lenient => write!(f, "lenient"),
            Difficulty::Strict => write!(f, "strict"),
        }
    }
}

/// All difficulty presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetBook {
    pub lenient: ThresholdConfig,
    pub strict: ThresholdConfig,
}

impl PresetBook {
    /// Presets shipped with the crate, without file or environment overrides
    pub fn builtin() -> Result<Self, ConfigError> {
        PresetLoader::new().load()
    }

    /// Validated thresholds for a tier
    pub fn get(&self, difficulty: Difficulty) -> Result<Thresholds, ConfigError> {
        let config = match difficulty {
            Difficulty::Lenient => self.lenient.clone(),
            Difficulty::Strict => self.strict.clone(),
        };
        config.validate()
    }
}

/// Layered preset loader
#[derive(Debug, Clone, Default)]
pub struct PresetLoader {
    file: Option<PathBuf>,
    env: bool,
    env_vars: Option<Map<String, String>>,
}

impl PresetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override presets from a TOML/JSON/YAML file
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Apply `SQUAT_*` environment overrides
    pub fn with_env(mut self, enabled: bool) -> Self {
        self.env = enabled;
        self
    }

    /// Apply `SQUAT_*` overrides from the given variables instead of the
    /// process environment
    pub fn with_env_vars<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env = true;
        self.env_vars = Some(vars.into_iter().collect());
        self
    }

    pub fn load(&self) -> Result<PresetBook, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::from_str(BUILTIN_PRESETS, FileFormat::Toml));

        if let Some(path) = &self.file {
            info!("Loading threshold overrides from {}", path.display());
            builder = builder.add_source(File::from(path.as_path()));
        }

        if self.env {
            builder = builder.add_source(
                Environment::with_prefix("SQUAT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(self.env_vars.clone()),
            );
        }

        let book: PresetBook = builder.build()?.try_deserialize()?;
        debug!("Loaded threshold presets");
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AngleRange;
    use std::io::Write;

    #[test]
    fn test_lenient_preset_values() {
        let t = Difficulty::Lenient.thresholds().unwrap();
        assert_eq!(t.phases.normal, AngleRange::new(0.0, 32.0));
        assert_eq!(t.phases.transition, AngleRange::new(35.0, 65.0));
        assert_eq!(t.phases.pass, AngleRange::new(70.0, 95.0));
        assert_eq!(t.hip_range, AngleRange::new(10.0, 50.0));
        assert_eq!(t.ankle_max, 45.0);
        assert_eq!(t.offset_max, 35.0);
        assert_eq!(t.inactivity_timeout_secs, 15.0);
        assert_eq!(t.persistence_frames, 50);
        assert_eq!(t.depth_cues.lower_hips, AngleRange::new(50.0, 70.0));
        assert_eq!(t.depth_cues.too_deep, 95.0);
    }

    #[test]
    fn test_strict_preset_values() {
        let t = Difficulty::Strict.thresholds().unwrap();
        assert_eq!(t.phases.normal, AngleRange::new(0.0, 32.0));
        assert_eq!(t.phases.transition, AngleRange::new(35.0, 65.0));
        assert_eq!(t.phases.pass, AngleRange::new(80.0, 95.0));
        assert_eq!(t.hip_range, AngleRange::new(15.0, 50.0));
        assert_eq!(t.ankle_max, 30.0);
        assert_eq!(t.offset_max, 35.0);
        assert_eq!(t.inactivity_timeout_secs, 15.0);
        assert_eq!(t.persistence_frames, 50);
        assert_eq!(t.depth_cues.lower_hips, AngleRange::new(50.0, 80.0));
    }

    #[test]
    fn test_difficulty_names() {
        assert_eq!("beginner".parse::<Difficulty>().unwrap(), Difficulty::Lenient);
        assert_eq!("PRO".parse::<Difficulty>().unwrap(), Difficulty::Strict);
        assert!(matches!(
            "expert".parse::<Difficulty>(),
            Err(ConfigError::UnknownPreset(_))
        ));
        assert_eq!(Difficulty::Strict.to_string(), "strict");
    }

    #[test]
    fn test_file_overrides_subset() {
        let path = std::env::temp_dir().join(format!(
            "squat-thresholds-override-{}.toml",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[strict]\nankle_max = 28.0").unwrap();
        drop(file);

        let book = PresetLoader::new().with_file(&path).load().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(book.strict.ankle_max, 28.0);
        assert_eq!(book.strict.hip_range, AngleRange::new(15.0, 50.0));
        assert_eq!(book.lenient.ankle_max, 45.0);
    }

    fn env(vars: &[(&str, &str)]) -> Vec<(String, String)> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        let book = PresetLoader::new()
            .with_env_vars(env(&[
                ("SQUAT_STRICT__ANKLE_MAX", "28"),
                ("SQUAT_LENIENT__PERSISTENCE_FRAMES", "30"),
                ("OTHER_STRICT__ANKLE_MAX", "5"),
            ]))
            .load()
            .unwrap();

        assert_eq!(book.strict.ankle_max, 28.0);
        assert_eq!(book.strict.offset_max, 35.0);
        assert_eq!(book.lenient.persistence_frames, 30);
        assert_eq!(book.lenient.ankle_max, 45.0);
    }

    #[test]
    fn test_env_overrides_are_validated() {
        let book = PresetLoader::new()
            .with_env_vars(env(&[("SQUAT_LENIENT__PERSISTENCE_FRAMES", "0")]))
            .load()
            .unwrap();
        assert!(matches!(
            book.get(Difficulty::Lenient),
            Err(ConfigError::NonPositive { field: "persistence_frames", .. })
        ));
        assert!(book.get(Difficulty::Strict).is_ok());
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let result = PresetLoader::new()
            .with_file("/nonexistent/squat-presets.toml")
            .load();
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
