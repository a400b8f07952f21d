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

use anyhow::Result;

use rescore::config::ResiliencyScoreProperties;

pub fn run(properties: &ResiliencyScoreProperties) -> Result<()> {
    // Loading already ran validation; this just reports what was found.
    println!(
        "provider: {}",
        properties
            .provider
            .as_ref()
            .map(|connection| connection.base_url.as_str())
            .unwrap_or("(not configured)")
    );
    println!(
        "metric config: {}",
        properties
            .metrics
            .as_ref()
            .map(|metrics| metrics.metric_name.as_str())
            .unwrap_or("(not configured)")
    );
    for family in &properties.families {
        println!("family '{}':", family.name);
        for service in &family.services {
            let resolved = properties
                .find_service(&service.name)
                .map(|s| s.queries.len())
                .unwrap_or(0);
            println!("  {} ({} queries)", service.name, resolved);
        }
    }
    println!("configuration is valid");
    Ok(())
}
