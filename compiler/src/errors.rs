// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Type for compilation failures. Any error aborts the compilation: no partial
//! tree is ever returned.

use thiserror::Error;
use tracing::error;

/// The reasons why we may refuse to compile an intent
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Invalid spec: {0}")]
    InvalidSpec(String),
    #[error("VRF '{vrf}' not found in namespace '{namespace}'")]
    VrfNotFound { vrf: String, namespace: String },
    #[error("No more free tables available in range [{start}-{end})")]
    NoFreeTable { start: u32, end: u32 },
    #[error("VRF name too long (max {max}): {name}")]
    NameTooLong { name: String, max: usize },
    #[error("Reserved VRF '{0}' has no table id in the observed configuration")]
    MissingReservedTable(String),
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),
    #[error("Sequence {seq} already exists in '{object}'")]
    DuplicateSequence { object: String, seq: u32 },
}

pub type CompileResult<T> = Result<T, CompileError>;

impl CompileError {
    /// Log the error where it is raised and hand it back
    #[must_use]
    pub(crate) fn logged(self) -> Self {
        error!("{self}");
        self
    }
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidSpec(msg.into()).logged()
    }
    pub(crate) fn vrf_not_found(vrf: &str, namespace: &str) -> Self {
        Self::VrfNotFound {
            vrf: vrf.to_owned(),
            namespace: namespace.to_owned(),
        }
        .logged()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in tests
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_errors_are_logged() {
        let err = CompileError::vrf_not_found("m2m", "hbn");
        assert_eq!(err.to_string(), "VRF 'm2m' not found in namespace 'hbn'");
        assert!(logs_contain("VRF 'm2m' not found"));

        let err = CompileError::invalid("anycast gateways require a MAC address");
        assert!(matches!(err, CompileError::InvalidSpec(_)));
        assert!(logs_contain("Invalid spec: anycast gateways"));
    }
}
