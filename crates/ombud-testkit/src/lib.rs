//! Ombud Testkit - scripted bus transport for tests
//!
//! Provides an in-memory [`ScriptedBus`] implementing the `BusTransport`
//! seam with queued replies per remote method, a call log, and notification
//! injection, plus fixture builders for common core property maps.

pub mod fixtures;
pub mod transport;

pub use transport::{RecordedCall, ScriptedBus};
