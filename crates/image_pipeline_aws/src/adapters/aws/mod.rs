//! AWS SDK implementations of the capability traits.
//!
//! The traits are synchronous; every adapter bridges into the SDK's async
//! clients through [`block_on`], which requires a multi-threaded Tokio runtime.

use std::future::Future;

pub mod dynamodb;
pub mod errors;
pub mod identity;
pub mod lambda;
pub mod rekognition;
pub mod s3;

pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
