//! Shared primitives for the wallet platform.
//!
//! Anything that more than one service in this workspace would need to agree on byte-for-byte
//! lives here: the stable identifiers handed out by the ledger, and the currency domain. Kept
//! deliberately small — business logic belongs in the owning service, not here.

pub mod ids;
pub mod money;

pub use ids::{TransactionId, UserId, WalletId};
pub use money::Currency;
