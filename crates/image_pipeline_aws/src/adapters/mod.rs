pub mod aws;
pub mod labels;
pub mod provider;
pub mod record_store;
