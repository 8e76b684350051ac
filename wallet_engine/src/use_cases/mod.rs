pub mod cash_out_request;
pub mod cash_out_verify;
pub mod create_wallet;
pub mod deposit;
pub mod get_transaction;
pub mod ingest_deposit_webhook;
pub mod list_transactions;
pub mod process_action;
pub mod transfer;
pub mod withdrawal;
