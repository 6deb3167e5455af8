use serde::de::Error;
use serde::Deserialize;
use serde::Deserializer;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::satellite::Satellite;

pub mod error;
pub use error::ConfigError;

/// Runtime options for one scene's retrieval.
#[derive(Debug, Clone)]
pub struct Config {
    satellite: Satellite,
    process_all_sentinel_bands: bool,
    use_semi_empirical_kernel: bool,
}

// This deserializer validates the band selection: processing all Sentinel-2
// bands is only meaningful for Sentinel-2 scenes.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            satellite: Satellite,
            #[serde(default)]
            process_all_sentinel_bands: bool,
            use_semi_empirical_kernel: Option<bool>,
        }

        let helper = ConfigHelper::deserialize(deserializer)?;

        if helper.process_all_sentinel_bands && helper.satellite != Satellite::Sentinel2 {
            return Err(D::Error::custom(ConfigError::BandSelection));
        }

        Ok(Config {
            satellite: helper.satellite,
            process_all_sentinel_bands: helper.process_all_sentinel_bands,
            use_semi_empirical_kernel: helper.use_semi_empirical_kernel.unwrap_or(true),
        })
    }
}

impl Config {
    pub fn new(
        satellite: Satellite,
        process_all_sentinel_bands: bool,
        use_semi_empirical_kernel: bool,
    ) -> Self {
        Self {
            satellite,
            process_all_sentinel_bands,
            use_semi_empirical_kernel,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader).map_err(ConfigError::from)?;

        Ok(config)
    }

    pub fn satellite(&self) -> Satellite {
        self.satellite
    }

    pub fn process_all_sentinel_bands(&self) -> bool {
        self.process_all_sentinel_bands
    }

    pub fn use_semi_empirical_kernel(&self) -> bool {
        self.use_semi_empirical_kernel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        let mut file = File::create(&file_path).unwrap();

        let config_data = r#"
    {
        "satellite": "sentinel-2",
        "process_all_sentinel_bands": true,
        "use_semi_empirical_kernel": false
    }
    "#;

        file.write_all(config_data.as_bytes()).unwrap();

        let config = Config::from_file(file_path).unwrap();

        assert_eq!(config.satellite(), Satellite::Sentinel2);
        assert!(config.process_all_sentinel_bands());
        assert!(!config.use_semi_empirical_kernel());
    }

    #[test]
    fn test_defaults_are_applied() {
        let config: Config = serde_json::from_str(r#"{"satellite": "landsat-8"}"#).unwrap();
        assert_eq!(config.satellite(), Satellite::Landsat8);
        assert!(!config.process_all_sentinel_bands());
        assert!(config.use_semi_empirical_kernel());
    }

    #[test]
    fn test_all_bands_requires_sentinel() {
        let result: Result<Config, _> = serde_json::from_str(
            r#"{"satellite": "landsat-9", "process_all_sentinel_bands": true}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = Config::from_file("/nonexistent/config.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
