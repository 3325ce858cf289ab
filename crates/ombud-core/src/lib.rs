//! Ombud Core - shared types for the remote-object proxy layer
//!
//! This crate holds the leaf vocabulary used across ombud:
//!
//! - Identifiers: `ObjectPath`, `BusName`, `InterfaceName`, `EntityHandle`,
//!   and the registry key `ProxyKey`
//! - The bus value model: `Value` and its coercion helpers
//! - Feature vocabulary: `Feature`, `FeatureSet`, `Status`
//! - The error taxonomy: `ProxyError`, `RemoteError`
//!
//! # Architecture
//!
//! This is the bottom layer of the workspace. It carries no async machinery
//! and no transport knowledge; `ombud-client` builds the readiness and
//! resolution engine on top of these types.

pub mod errors;
pub mod feature;
pub mod identifiers;
pub mod value;

pub use errors::{ProxyError, ProxyResult, RemoteError};
pub use feature::{Feature, FeatureSet, Status};
pub use identifiers::{BusName, EntityHandle, InterfaceName, ObjectPath, ProxyKey};
pub use value::Value;
