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

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::ResiliencyScoreProperties;
use crate::error::ProviderError;

use super::wavefront::WavefrontProvider;
use super::MetricProvider;

/// Registry name under which the Wavefront implementation registers itself.
pub const WAVEFRONT_PROVIDER: &str = "wavefront";

/// Name-indexed set of available backend implementations.
///
/// Providers are registered once at startup and resolved by name; resolution
/// of an unregistered name is an error rather than a fallback, so a typo'd
/// provider name surfaces immediately instead of silently scoring nothing.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn MetricProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry holding every provider the snapshot configures.
    pub fn from_properties(
        properties: &ResiliencyScoreProperties,
    ) -> Result<Self, ProviderError> {
        let mut registry = Self::new();
        if properties.provider.is_some() {
            let provider = WavefrontProvider::from_properties(properties)?;
            registry.register(WAVEFRONT_PROVIDER, Arc::new(provider));
        }
        Ok(registry)
    }

    /// Registers a provider under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn MetricProvider>) {
        let name = name.into();
        debug!(provider = %name, "Registering metric provider");
        self.providers.insert(name, provider);
    }

    /// Resolves a provider by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn MetricProvider>, ProviderError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider {
                name: name.to_string(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
