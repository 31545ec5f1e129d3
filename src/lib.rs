pub mod cli;
pub mod config;
pub mod ctx;
pub mod gait;
pub mod history;
pub mod input;
pub mod io;
pub mod math;
pub mod phases;
pub mod pipeline;
pub mod pose;
pub mod schema;
pub mod scores;
pub mod stream;
