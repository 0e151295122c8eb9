//! Account and wallet domain types.

pub mod account;
pub mod error;

pub use account::{
    Account, AccountProfile, AccountSummary, CreatedAccount, NewAccount, RenamedAccount,
    SessionToken, Wallet, WalletView, INITIAL_WALLET_UNITS,
};
pub use error::{AccountError, GuardError};
