/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::ResiliencyScoreProperties;

/// Loads TOML configuration with environment-variable substitution.
///
/// Supports `${VAR}`, `${VAR:-default}` and `${VAR:?error message}` inside
/// the file, so credentials like the backend API token never have to be
/// written to disk.
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory
        search_paths.push(PathBuf::from("./rescore.toml"));

        // 2. User config directory
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("rescore").join("config.toml"));
        }

        // 3. System config directory
        search_paths.push(PathBuf::from("/etc/rescore/config.toml"));

        Self { search_paths }
    }

    /// Create a config loader with custom search paths
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Load configuration from the specified file or auto-discover
    pub fn load_config(
        &self,
        config_file: Option<&Path>,
    ) -> Result<ResiliencyScoreProperties, ConfigError> {
        let config_path = if let Some(path) = config_file {
            path.to_path_buf()
        } else if let Ok(env_config) = env::var("RESCORE_CONFIG") {
            PathBuf::from(env_config)
        } else {
            self.find_config_file().ok_or(ConfigError::ConfigNotFound)?
        };

        self.load_config_from_file(&config_path)
    }

    /// Load configuration from a specific file
    pub fn load_config_from_file(
        &self,
        path: &Path,
    ) -> Result<ResiliencyScoreProperties, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let substituted_content = self.substitute_env_vars(&content)?;
        let properties = toml::from_str::<ResiliencyScoreProperties>(&substituted_content)?;

        Ok(properties)
    }

    /// Find the first existing configuration file in search paths
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .find(|path| path.exists() && path.is_file())
            .cloned()
    }

    /// Substitute environment variables in configuration content
    fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        // Regex to match ${VAR}, ${VAR:-default}, ${VAR:?error}
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let full_match = &cap[0];
            let var_expr = &cap[1];

            let replacement = self.process_var_expression(var_expr)?;
            result = result.replace(full_match, &replacement);
        }

        Ok(result)
    }

    fn process_var_expression(&self, expr: &str) -> Result<String, ConfigError> {
        if let Some((name, default)) = expr.split_once(":-") {
            return Ok(env::var(name).unwrap_or_else(|_| default.to_string()));
        }
        if let Some((name, message)) = expr.split_once(":?") {
            return env::var(name).map_err(|_| {
                ConfigError::EnvSubstitutionError(format!("{}: {}", name, message))
            });
        }
        env::var(expr).map_err(|_| {
            ConfigError::EnvSubstitutionError(format!("environment variable '{}' is not set", expr))
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
