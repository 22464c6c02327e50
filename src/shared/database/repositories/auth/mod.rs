// Auth repositories
pub mod account_repository;
pub mod memory_session_ledger;
pub mod session_ledger_repository;

pub use account_repository::*;
pub use memory_session_ledger::*;
pub use session_ledger_repository::*;
