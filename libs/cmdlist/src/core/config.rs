// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Recorder configuration via `cmdlist.yaml`.

use crate::core::{CmdListError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Limits for the shared staging buffer free list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StagingConfig {
    /// Maximum number of completed staging buffers kept for reuse.
    #[serde(default = "StagingConfig::default_max_pooled_buffers")]
    pub max_pooled_buffers: usize,

    /// Maximum total size in bytes of completed staging buffers kept for reuse.
    #[serde(default = "StagingConfig::default_max_pooled_bytes")]
    pub max_pooled_bytes: u64,
}

impl StagingConfig {
    fn default_max_pooled_buffers() -> usize {
        16
    }

    fn default_max_pooled_bytes() -> u64 {
        16 * 1024 * 1024
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            max_pooled_buffers: Self::default_max_pooled_buffers(),
            max_pooled_bytes: Self::default_max_pooled_bytes(),
        }
    }
}

/// Configuration for a [`CommandList`](crate::core::CommandList).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandListConfig {
    /// Debug label attached to log lines emitted by the recorder.
    #[serde(default)]
    pub label: Option<String>,

    /// Staging pool limits.
    #[serde(default)]
    pub staging: StagingConfig,
}

impl CommandListConfig {
    /// Configuration file name.
    pub const FILE_NAME: &'static str = "cmdlist.yaml";

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parse configuration from a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| CmdListError::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from a directory. Returns error if file is
    /// missing or cannot be parsed.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            CmdListError::Configuration(format!("Failed to read {}: {}", config_path.display(), e))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            CmdListError::Configuration(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;

        tracing::info!(
            path = %config_path.display(),
            label = ?config.label,
            max_pooled_buffers = config.staging.max_pooled_buffers,
            "Loaded command list config"
        );
        Ok(config)
    }

    /// Load configuration from a directory, returning defaults if the
    /// file is missing or unparseable.
    pub fn load_or_default(dir: &Path) -> Self {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            tracing::debug!(
                dir = %dir.display(),
                file = Self::FILE_NAME,
                "No config file, using defaults"
            );
            return Self::default();
        }

        match Self::load(dir) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }
}
