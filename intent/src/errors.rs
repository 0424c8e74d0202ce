// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Failures when loading the base configuration or a node intent

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("Failed to read '{path}': {err}", path = .0.display(), err = .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Malformed document: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    #[error("Invalid base config: {0}")]
    InvalidBaseConfig(String),
}
