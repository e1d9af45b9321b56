pub mod assignments;
pub mod attendance;
pub mod domain;
pub mod error;
pub mod insights;
pub mod marks;
pub mod memory;
pub mod ports;
pub mod registry;
pub mod schedule;
pub mod stats;

#[cfg(test)]
mod fixtures;

pub use error::{CoreError, CoreResult};
