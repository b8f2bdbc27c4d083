//! Configuration module
//!
//! Loads the launcher configuration from the environment and applies the
//! command-line overrides on top.

use anyhow::{Context, Result};
use kernelbot_launcher::BuildkiteConfig;

/// Connection settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub org: Option<String>,
    pub pipeline: Option<String>,
    pub api_url: Option<String>,
}

impl Overrides {
    /// Builds the launcher configuration
    pub fn load(&self) -> Result<BuildkiteConfig> {
        let config = BuildkiteConfig::from_env().context("Failed to load configuration")?;
        Ok(self.apply(config))
    }

    fn apply(&self, mut config: BuildkiteConfig) -> BuildkiteConfig {
        if let Some(org) = &self.org {
            config.org_slug = org.clone();
        }
        if let Some(pipeline) = &self.pipeline {
            config.pipeline_slug = pipeline.clone();
        }
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let overrides = Overrides {
            org: Some("acme".to_string()),
            pipeline: None,
            api_url: Some("http://localhost:9000".to_string()),
        };

        let config = overrides.apply(BuildkiteConfig::new("gpu-mode", "kernelbot", "token"));

        assert_eq!(config.org_slug, "acme");
        assert_eq!(config.pipeline_slug, "kernelbot");
        assert_eq!(config.api_url, "http://localhost:9000");
    }
}
