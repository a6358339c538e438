//! AWS-oriented adapters, provisioning components and handlers for the image
//! pipeline.
//!
//! Capability traits in [`adapters`] are the seams between the sequential
//! provisioning logic, the Lambda event handler and the AWS SDK clients.
//! Provider-free primitives are re-exported through [`runtime`].

pub mod adapters;
pub mod handlers;
pub mod provisioning;
pub mod runtime;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
