// Shared errors
pub mod auth_error;
pub mod session_error;

pub use auth_error::*;
pub use session_error::*;
