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

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::service::{resolve_queries, Granularity, QueryDefinition, Service};

use super::loader::ConfigLoader;

/// Connection details for the active monitoring backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricProviderConnection {
    /// Base URL of the backend API, e.g. `https://metrics.example.com`.
    pub base_url: String,
    /// API token sent as a bearer credential.
    pub api_token: String,
    /// Source reported with every emitted metric point.
    pub source: String,
    /// Optional proxy host for metric emission.
    #[serde(default)]
    pub proxy_host: Option<String>,
    #[serde(default)]
    pub proxy_port: Option<u16>,
}

/// Scoring-metric configuration: windows, granularity and output names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResiliencyMetricConfig {
    /// Name of the per-service resiliency metric.
    pub metric_name: String,
    /// Name of the per-endpoint metric emitted in success-ratio mode.
    #[serde(default)]
    pub url_metric_name: Option<String>,
    /// Name of the functional-part metric, when the split is enabled.
    #[serde(default)]
    pub functional_metric_name: Option<String>,
    /// Name of the non-functional-part metric, when the split is enabled.
    #[serde(default)]
    pub non_functional_metric_name: Option<String>,
    /// How far back from now fault events are considered, in hours.
    pub lookback_hours: i64,
    /// Length of the pre/post reference windows, in minutes.
    pub reference_window_minutes: i64,
    /// Granularity for time-series fetches.
    #[serde(default)]
    pub granularity: Granularity,
}

/// Query templates for success-ratio scoring.
///
/// `{service}` inside either template is replaced with the scored service's
/// name before the query is sent. Both queries must group their results by
/// `endpoint_tag`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessRatioConfig {
    /// Query returning total request counts per endpoint.
    pub total_query: String,
    /// Query returning successful request counts per endpoint.
    pub success_query: String,
    /// Tag key identifying an endpoint in the returned series.
    #[serde(default = "default_endpoint_tag")]
    pub endpoint_tag: String,
}

fn default_endpoint_tag() -> String {
    "url".to_string()
}

/// One service entry inside a family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Service-specific queries; these override family-common queries that
    /// share a name.
    #[serde(default)]
    pub queries: Vec<QueryDefinition>,
}

/// A service family and its members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub name: String,
    /// Queries shared by every service in this family.
    #[serde(default)]
    pub queries: Vec<QueryDefinition>,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

fn default_max_concurrent_services() -> usize {
    4
}

fn default_provider_timeout_secs() -> u64 {
    30
}

/// Immutable configuration snapshot for the engine.
///
/// The provider and metric sections are optional at the type level because a
/// deployment may not have configured them yet; the executor treats their
/// absence as a fatal precondition failure for the run, not a panic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResiliencyScoreProperties {
    #[serde(default)]
    pub provider: Option<MetricProviderConnection>,
    #[serde(default)]
    pub metrics: Option<ResiliencyMetricConfig>,
    /// Global tags attached to event queries and emitted metrics. On a key
    /// collision with service tags these win.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub families: Vec<FamilyConfig>,
    /// Weight `alpha` of the recovery part in the functional split. `None`
    /// disables the split.
    #[serde(default)]
    pub functional_split: Option<f64>,
    #[serde(default)]
    pub success_ratio: Option<SuccessRatioConfig>,
    /// Bound on concurrently scored services in a batch run.
    #[serde(default = "default_max_concurrent_services")]
    pub max_concurrent_services: usize,
    /// Timeout applied to every monitoring-backend call.
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,
}

impl ResiliencyScoreProperties {
    /// Loads and validates a snapshot from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let properties = ConfigLoader::new().load_config(Some(path.as_ref()))?;
        properties.validate()?;
        Ok(properties)
    }

    /// Loads a snapshot from the default search paths.
    pub fn discover() -> Result<Self, ConfigError> {
        let properties = ConfigLoader::new().load_config(None)?;
        properties.validate()?;
        Ok(properties)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Resolves a service by name into its effective form, with the family's
    /// common queries merged under the service-specific ones.
    pub fn find_service(&self, name: &str) -> Option<Service> {
        for family in &self.families {
            if let Some(service) = family.services.iter().find(|s| s.name == name) {
                return Some(self.materialize(family, service));
            }
        }
        None
    }

    /// All configured (family, service) pairs in declaration order.
    pub fn all_services(&self) -> Vec<Service> {
        self.families
            .iter()
            .flat_map(|family| {
                family
                    .services
                    .iter()
                    .map(|service| self.materialize(family, service))
            })
            .collect()
    }

    fn materialize(&self, family: &FamilyConfig, service: &ServiceConfig) -> Service {
        Service {
            name: service.name.clone(),
            family: family.name.clone(),
            tags: service.tags.clone(),
            queries: resolve_queries(&family.queries, &service.queries),
        }
    }

    /// Merges global property tags over a service's tags; property tags win
    /// on collision.
    pub fn merged_tags(&self, service_tags: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut all = service_tags.clone();
        for (key, value) in &self.tags {
            all.insert(key.clone(), value.clone());
        }
        all
    }

    /// Validates the snapshot's numeric constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(metrics) = &self.metrics {
            if metrics.lookback_hours <= 0 {
                return Err(ConfigError::InvalidWindow {
                    field: "lookback_hours",
                    value: metrics.lookback_hours,
                });
            }
            if metrics.reference_window_minutes <= 0 {
                return Err(ConfigError::InvalidWindow {
                    field: "reference_window_minutes",
                    value: metrics.reference_window_minutes,
                });
            }
        }
        if let Some(alpha) = self.functional_split {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(ConfigError::InvalidFunctionalSplit { alpha });
            }
        }
        for family in &self.families {
            let service_queries = family
                .services
                .iter()
                .flat_map(|service| service.queries.iter());
            for query in family.queries.iter().chain(service_queries) {
                if query.weight < 0.0 || !query.weight.is_finite() {
                    return Err(ConfigError::InvalidWeight {
                        query: query.name.clone(),
                        weight: query.weight,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_test_logging;

    fn minimal_toml() -> &'static str {
        r#"
            [provider]
            base_url = "https://metrics.example.com"
            api_token = "secret"
            source = "rescore"

            [metrics]
            metric_name = "resiliency.score"
            lookback_hours = 1
            reference_window_minutes = 15
            granularity = "m"

            [tags]
            env = "prod"

            [[families]]
            name = "checkout"

            [[families.queries]]
            name = "error-rate"
            condition = "ts(checkout.errors.alert)"
            weight = 1.0

            [[families.services]]
            name = "cart"

            [families.services.tags]
            env = "staging"
            team = "payments"

            [[families.services.queries]]
            name = "latency"
            condition = "ts(cart.latency.alert)"
            weight = 2.0
        "#
    }

    #[test]
    fn parses_and_resolves_service_queries() {
        init_test_logging();

        let properties: ResiliencyScoreProperties = toml::from_str(minimal_toml()).unwrap();
        properties.validate().unwrap();

        let service = properties.find_service("cart").unwrap();
        assert_eq!(service.family, "checkout");
        assert_eq!(service.queries.len(), 2);
        assert_eq!(service.queries[0].name, "error-rate");
        assert_eq!(service.queries[1].weight, 2.0);
    }

    #[test]
    fn property_tags_win_merge_collisions() {
        init_test_logging();

        let properties: ResiliencyScoreProperties = toml::from_str(minimal_toml()).unwrap();
        let service = properties.find_service("cart").unwrap();
        let merged = properties.merged_tags(&service.tags);

        assert_eq!(merged.get("env").map(String::as_str), Some("prod"));
        assert_eq!(merged.get("team").map(String::as_str), Some("payments"));
    }

    #[test]
    fn rejects_negative_weight() {
        init_test_logging();

        let mut properties: ResiliencyScoreProperties = toml::from_str(minimal_toml()).unwrap();
        properties.families[0].queries[0].weight = -1.0;
        assert!(matches!(
            properties.validate(),
            Err(ConfigError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_functional_split() {
        init_test_logging();

        let mut properties: ResiliencyScoreProperties = toml::from_str(minimal_toml()).unwrap();
        properties.functional_split = Some(1.5);
        assert!(matches!(
            properties.validate(),
            Err(ConfigError::InvalidFunctionalSplit { .. })
        ));
    }
}
