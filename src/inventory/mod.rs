pub mod error;
pub mod identity;
pub mod loader;
pub mod preprocess;

pub use error::*;
pub use identity::*;
pub use loader::*;
pub use preprocess::*;
