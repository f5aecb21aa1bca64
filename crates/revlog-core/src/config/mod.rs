//! Configuration system for revlog.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RevlogError, RevlogResult};
use crate::time::DayBoundary;

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Day-boundary policy for timestamps.
    pub day_boundary: DayBoundary,
    /// Whether the first line of the log is a header.
    pub has_header: bool,
    /// Expand timelines across worker threads.
    pub parallel: bool,
    /// Let the optimizer fit short-term (same-day) parameters.
    pub enable_short_term: bool,
    /// Relearning steps hint passed to the optimizer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_relearning_steps: Option<usize>,
    /// Target recall probability used when scheduling.
    pub desired_retention: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            day_boundary: DayBoundary::default(),
            has_header: true,
            parallel: true,
            enable_short_term: true,
            num_relearning_steps: None,
            desired_retention: 0.9,
        }
    }
}

/// Default location of the config file (`~/.revlog/config.toml`).
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".revlog"))
        .unwrap_or_else(|| PathBuf::from(".revlog"))
        .join("config.toml")
}

fn env_parse<T: std::str::FromStr>(name: &str) -> RevlogResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| RevlogError::Configuration(format!("{name} has an invalid value: '{raw}'"))),
        Err(_) => Ok(None),
    }
}

impl PipelineConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> RevlogResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| RevlogError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| RevlogError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| RevlogError::Configuration(e.to_string()))?,
            _ => {
                return Err(RevlogError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides on top of this configuration.
    ///
    /// Recognized: `REVLOG_UTC_OFFSET_HOURS`, `REVLOG_ROLLOVER_HOURS`,
    /// `REVLOG_PARALLEL`, `REVLOG_DESIRED_RETENTION`.
    pub fn with_env_overrides(mut self) -> RevlogResult<Self> {
        if let Some(offset) = env_parse::<i32>("REVLOG_UTC_OFFSET_HOURS")? {
            self.day_boundary.utc_offset_hours = offset;
        }
        if let Some(rollover) = env_parse::<u32>("REVLOG_ROLLOVER_HOURS")? {
            self.day_boundary.rollover_hours = rollover;
        }
        if let Some(parallel) = env_parse::<bool>("REVLOG_PARALLEL")? {
            self.parallel = parallel;
        }
        if let Some(retention) = env_parse::<f32>("REVLOG_DESIRED_RETENTION")? {
            self.desired_retention = retention;
        }
        self.validate()?;
        Ok(self)
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> RevlogResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Validate configuration values are in valid ranges.
    pub fn validate(&self) -> RevlogResult<()> {
        self.day_boundary
            .validate()
            .map_err(|e| RevlogError::Configuration(e.to_string()))?;
        if !(self.desired_retention > 0.0 && self.desired_retention <= 1.0) {
            return Err(RevlogError::Configuration(
                "desired_retention must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for PipelineConfig.
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the day-boundary policy.
    pub fn day_boundary(mut self, boundary: DayBoundary) -> Self {
        self.config.day_boundary = boundary;
        self
    }

    /// Set whether the log starts with a header line.
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.config.has_header = has_header;
        self
    }

    /// Enable or disable parallel expansion.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Enable or disable short-term parameter fitting.
    pub fn enable_short_term(mut self, enable: bool) -> Self {
        self.config.enable_short_term = enable;
        self
    }

    /// Set the relearning steps hint.
    pub fn num_relearning_steps(mut self, steps: usize) -> Self {
        self.config.num_relearning_steps = Some(steps);
        self
    }

    /// Set the desired retention.
    pub fn desired_retention(mut self, retention: f32) -> Self {
        self.config.desired_retention = retention;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> RevlogResult<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.day_boundary, DayBoundary::new(8, 4));
        assert!(config.has_header);
        assert!(config.parallel);
        assert!((config.desired_retention - 0.9).abs() < 1e-6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::builder()
            .day_boundary(DayBoundary::new(-5, 3))
            .parallel(false)
            .num_relearning_steps(2)
            .build()
            .unwrap();
        assert_eq!(config.day_boundary.utc_offset_hours, -5);
        assert!(!config.parallel);
        assert_eq!(config.num_relearning_steps, Some(2));
    }

    #[test]
    fn test_builder_rejects_bad_retention() {
        assert!(PipelineConfig::builder().desired_retention(0.0).build().is_err());
        assert!(PipelineConfig::builder().desired_retention(1.5).build().is_err());
        assert!(PipelineConfig::builder().desired_retention(1.0).build().is_ok());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "parallel = false\n\n[day_boundary]\nutc_offset_hours = 2\nrollover_hours = 5"
        )
        .unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert!(!config.parallel);
        assert_eq!(config.day_boundary, DayBoundary::new(2, 5));
        assert!(config.has_header);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"has_header": false, "desired_retention": 0.85}}"#).unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert!(!config.has_header);
        assert!((config.desired_retention - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_from_yaml_file_validates() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "day_boundary:\n  utc_offset_hours: 8\n  rollover_hours: 30").unwrap();

        let err = PipelineConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, RevlogError::Configuration(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(PipelineConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_default_config_path() {
        assert!(default_config_path().ends_with(".revlog/config.toml"));
    }
}
