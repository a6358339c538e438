pub use image_pipeline_core::{contract, error, naming, notification, outcome, site, wait};
