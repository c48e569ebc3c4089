use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_datasource")]
    pub datasource: String,
    #[serde(default = "default_query_path")]
    pub query_path: String,
    #[serde(default = "default_intervals")]
    pub intervals: Vec<String>,
    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<String>,
    #[serde(default = "default_row_count")]
    pub row_count: u64, // virtual length of the dataset, never materialized
}

fn default_endpoint() -> String {
    "http://localhost:8082".into()
}
fn default_datasource() -> String {
    "taxi".into()
}
fn default_query_path() -> String {
    "druid/v2".into()
}
fn default_intervals() -> Vec<String> {
    vec!["2013-01-01/2013-04-01".into()]
}
fn default_dimensions() -> Vec<String> {
    vec![
        "passenger_count".into(),
        "trip_distance".into(),
        "trip_time_in_secs".into(),
    ]
}
fn default_row_count() -> u64 {
    1_000_000_000
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            datasource: default_datasource(),
            query_path: default_query_path(),
            intervals: default_intervals(),
            dimensions: default_dimensions(),
            row_count: default_row_count(),
        }
    }
}

impl SourceConfig {
    /// `<endpoint>/<query_path>` with exactly one slash at the join
    pub fn query_url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.query_path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramConfig {
    #[serde(default = "default_bins")]
    pub default_bins: usize,
    #[serde(default = "default_range")]
    pub default_range: (f64, f64),
}

fn default_bins() -> usize {
    5
}
fn default_range() -> (f64, f64) {
    (0.0, 5.0)
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            default_bins: default_bins(),
            default_range: default_range(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub histogram: HistogramConfig,
}

impl Config {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("druid-lens")
            .join("config.toml")
    }

    pub fn load() -> crate::Result<Self> {
        let path = if let Ok(env_path) = std::env::var("DRUID_LENS_CONFIG") {
            PathBuf::from(env_path) // $DRUID_LENS_CONFIG overrides default config path
        } else {
            Self::config_path()
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let cfg: Self =
            toml::from_str(&content).map_err(|e| crate::DruidLensError::Config(e.to_string()))?;
        Ok(cfg)
    }

    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::DruidLensError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests_config {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.source.datasource, "taxi");
        assert_eq!(cfg.source.dimensions.len(), 3);
        assert_eq!(cfg.histogram.default_bins, 5);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[source]\ndatasource = \"rides\"\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.source.datasource, "rides");
        assert_eq!(cfg.source.endpoint, "http://localhost:8082");
        assert_eq!(cfg.source.intervals, vec!["2013-01-01/2013-04-01".to_string()]);
        assert_eq!(cfg.histogram.default_range, (0.0, 5.0));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.source.endpoint = "http://broker:8082".into();
        cfg.histogram.default_bins = 20;
        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.source.endpoint, "http://broker:8082");
        assert_eq!(loaded.histogram.default_bins, 20);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[source\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(crate::DruidLensError::Config(_))));
    }

    #[test]
    fn query_url_joins_with_single_slash() {
        let mut src = SourceConfig::default();
        src.endpoint = "http://broker:8082/".into();
        src.query_path = "/druid/v2".into();
        assert_eq!(src.query_url(), "http://broker:8082/druid/v2");
    }
}
