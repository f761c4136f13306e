pub mod alert;
pub mod classifiers;
pub mod config;
pub mod engine;
pub mod findings;
pub mod model;
pub mod output;
pub mod server;
pub mod snapshot;

pub use engine::{build_diff, DiffEngine};
