//! Command handlers for the svemu CLI.

mod decode;
mod run;

pub use decode::decode;
pub use run::{run, RunOptions};
