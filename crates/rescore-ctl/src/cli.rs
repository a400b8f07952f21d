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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rescore-ctl",
    version,
    about = "Command-line interface for resiliency score calculations",
    long_about = "Runs resiliency scoring against a configured monitoring backend: \
                  one service at a time or as a batch over every configured service"
)]
pub struct Cli {
    /// Path to the configuration file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score every configured service concurrently
    Batch {
        /// Scoring strategy to apply [alert, success]
        #[arg(long, default_value = "alert")]
        mode: String,
    },
    /// Score a single service and print the resulting task as JSON
    Score {
        /// Name of the configured service to score
        #[arg(long)]
        service: String,
    },
    /// Load and validate the configuration, then print a summary
    Validate,
}
