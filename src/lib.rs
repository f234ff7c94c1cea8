//! Finishing-position regression for F1 races: an offline trainer that fits
//! least squares over one-hot encoded race features, and an HTTP predictor
//! that serves the fitted model.

pub mod config;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod model;
pub mod predictor;
pub mod server;
pub mod trainer;
pub mod types;

pub use error::{Error, Result};
