pub mod deployment;
pub mod target;

pub use deployment::*;
pub use target::*;
