//! Provider-free primitives for the image pipeline.
//!
//! Naming, persisted contracts, notification validation, site rendering,
//! step outcomes and the wait/retry helpers live here so that both the
//! deploy orchestrator and the Lambda handler share one definition.

pub mod contract;
pub mod error;
pub mod naming;
pub mod notification;
pub mod outcome;
pub mod site;
pub mod wait;
