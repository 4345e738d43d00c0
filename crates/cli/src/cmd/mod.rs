mod build;
mod gc;
mod serve;

pub use build::{BuildArgs, cmd_build};
pub use gc::cmd_gc;
pub use serve::cmd_serve;
