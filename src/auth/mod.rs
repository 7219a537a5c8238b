pub mod credential;
pub mod error;
pub mod resolver;

pub use credential::Credential;
pub use error::AuthError;
pub use resolver::resolve;
