pub mod regression;
pub mod signal;
pub mod stats;
