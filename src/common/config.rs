// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::decimal::DEFAULT_MAX_NUMERIC_PRECISION;

static CONFIG: OnceLock<EngineConfig> = OnceLock::new();

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_numeric_precision() -> u32 {
    DEFAULT_MAX_NUMERIC_PRECISION
}

pub fn init_from_path(path: impl AsRef<Path>) -> Result<&'static EngineConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let path = path.as_ref().to_path_buf();
    let cfg = EngineConfig::load_from_file(&path)?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn init_from_env_or_default() -> Result<&'static EngineConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let path = config_path_from_env_or_default()?;
    let cfg = EngineConfig::load_from_file(&path)?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn config() -> Result<&'static EngineConfig> {
    init_from_env_or_default()
}

fn config_path_from_env_or_default() -> Result<PathBuf> {
    if let Ok(p) = std::env::var("EXACT_AVG_CONFIG") {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p));
        }
    }

    let candidates = [PathBuf::from("exact_avg.toml")];
    for p in candidates {
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "missing config file: set $EXACT_AVG_CONFIG or create ./exact_avg.toml"
    ))
}

#[derive(Clone, Debug, Deserialize)]
pub struct EngineConfig {
    /// Hard ceiling on total decimal digits for any numeric the engine
    /// materializes. Plans and overflow diagnosis are evaluated against this
    /// value, so tests may run with a much smaller ceiling.
    #[serde(default = "default_max_numeric_precision")]
    pub max_numeric_precision: u32,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional full tracing EnvFilter expression.
    /// If set, this takes precedence over `log_level`.
    /// Example: "exact_avg=debug"
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl EngineConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        let cfg: EngineConfig =
            toml::from_str(&s).with_context(|| format!("parse toml: {}", path.display()))?;
        Ok(cfg)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_numeric_precision: default_max_numeric_precision(),
            log_level: default_log_level(),
            log_filter: None,
        }
    }
}
