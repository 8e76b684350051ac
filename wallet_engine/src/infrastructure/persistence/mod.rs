pub mod atomic_unit;
pub mod idempotency_store;
pub mod models;
pub mod transaction_repository;
pub mod user_directory;
pub mod wallet_repository;
