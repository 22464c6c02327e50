// Auth domain services
pub mod activation_notifier;
pub mod auth_service;
pub mod federated_verifier;
pub mod session_service;
pub mod state;
pub mod sweep_scheduler;
pub mod token_codec;

pub use activation_notifier::*;
pub use auth_service::*;
pub use federated_verifier::*;
pub use session_service::*;
pub use state::*;
pub use sweep_scheduler::*;
pub use token_codec::*;
