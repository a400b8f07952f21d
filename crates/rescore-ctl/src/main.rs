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

mod cli;
mod commands;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use rescore::config::ResiliencyScoreProperties;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let properties = match &cli.config {
        Some(path) => ResiliencyScoreProperties::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => ResiliencyScoreProperties::discover()
            .context("failed to discover a configuration file")?,
    };
    let properties = Arc::new(properties);

    match cli.command {
        Commands::Batch { ref mode } => commands::batch::run(properties, mode).await,
        Commands::Score { ref service } => commands::score::run(properties, service).await,
        Commands::Validate => commands::validate::run(&properties),
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
