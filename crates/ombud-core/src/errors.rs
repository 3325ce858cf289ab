//! Error taxonomy for the proxy layer
//!
//! Programming errors (double completion, duplicate registration) are kept
//! distinct from remote failures, which preserve the bus-level error name
//! and message verbatim. Per-identifier invalidity during resolution is not
//! an error at all; it is reported through result partitions.

use crate::feature::Feature;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type ProxyResult<T> = Result<T, ProxyError>;

/// A namespaced error reply from the bus transport.
///
/// Both fields are preserved verbatim from the wire; nothing in this layer
/// rewrites or localizes them.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{name}: {message}")]
pub struct RemoteError {
    /// Namespaced error identifier, e.g. `org.example.Error.Timeout`.
    pub name: String,
    /// Human-readable message supplied by the service.
    pub message: String,
}

impl RemoteError {
    /// Create a remote error from its wire parts.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by completion handles, the readiness graph, and the
/// resolution pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ProxyError {
    /// A completion handle was completed a second time.
    #[error("operation already completed")]
    AlreadyCompleted,

    /// A feature identity was registered twice.
    #[error("feature {feature} is already registered")]
    DuplicateFeature {
        /// The colliding feature identity
        feature: Feature,
    },

    /// A readiness request named a feature that was never registered.
    #[error("feature {feature} is not registered")]
    UnknownFeature {
        /// The unregistered feature identity
        feature: Feature,
    },

    /// The remote object cannot satisfy a required feature under its
    /// current capabilities.
    #[error("feature {feature} is unavailable on the remote object")]
    FeatureUnavailable {
        /// The feature that became Missing
        feature: Feature,
    },

    /// A remote call failed at the transport or protocol level.
    #[error("remote call failed: {name}: {message}")]
    RemoteCall {
        /// Namespaced bus error identifier, verbatim
        name: String,
        /// Human-readable message, verbatim
        message: String,
    },

    /// Introspection of the remote object failed.
    #[error("introspection failed: {name}: {message}")]
    RemoteIntrospection {
        /// Namespaced bus error identifier, verbatim
        name: String,
        /// Human-readable message, verbatim
        message: String,
    },

    /// Registering a feature would close a dependency cycle.
    #[error("feature {feature} closes a dependency cycle")]
    DependencyCycle {
        /// The feature whose registration closed the cycle
        feature: Feature,
    },

    /// Readiness was requested on an object that is not in a valid
    /// bus-registration state.
    #[error("object is not registered on the bus")]
    NotRegistered,

    /// A reply did not have the shape the call contract promises.
    #[error("unexpected reply shape: expected {expected}, got {found}")]
    UnexpectedShape {
        /// What the contract expects at this position
        expected: String,
        /// What actually arrived
        found: String,
    },
}

impl ProxyError {
    /// Create a duplicate-feature error.
    pub fn duplicate_feature(feature: Feature) -> Self {
        Self::DuplicateFeature { feature }
    }

    /// Create an unknown-feature error.
    pub fn unknown_feature(feature: Feature) -> Self {
        Self::UnknownFeature { feature }
    }

    /// Create a feature-unavailable error.
    pub fn feature_unavailable(feature: Feature) -> Self {
        Self::FeatureUnavailable { feature }
    }

    /// Create a dependency-cycle error.
    pub fn dependency_cycle(feature: Feature) -> Self {
        Self::DependencyCycle { feature }
    }

    /// Wrap a remote error reply from an ordinary call.
    pub fn remote_call(error: RemoteError) -> Self {
        Self::RemoteCall {
            name: error.name,
            message: error.message,
        }
    }

    /// Wrap a remote error reply from an introspection call.
    pub fn remote_introspection(error: RemoteError) -> Self {
        Self::RemoteIntrospection {
            name: error.name,
            message: error.message,
        }
    }

    /// Create a shape-mismatch error.
    pub fn unexpected_shape(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
