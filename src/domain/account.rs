//! Account and wallet records, plus the views returned to callers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Balance every wallet starts with.
pub const INITIAL_WALLET_UNITS: i64 = 100;

pub fn initial_wallet_balance() -> Decimal {
    Decimal::from(INITIAL_WALLET_UNITS)
}

/// A persisted user account.
///
/// `password_hash` is a PHC-formatted digest and is never part of any view
/// handed back to clients.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Fields supplied when inserting an account; the store assigns id and timestamp.
#[derive(Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Balance record owned one-to-one by an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    pub id: Uuid,
    pub account_id: Uuid,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn view(&self) -> WalletView {
        WalletView {
            id: self.id,
            balance: self.balance,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct WalletView {
    pub id: Uuid,
    #[schema(value_type = f64)]
    pub balance: Decimal,
}

/// One entry of `GET /users`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub wallet: WalletView,
}

/// Returned by sign-up.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct CreatedAccount {
    pub id: Uuid,
    pub name: String,
    pub wallet: WalletView,
}

/// Full profile including the joined wallet.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub wallet: WalletView,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct RenamedAccount {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct SessionToken {
    pub token: String,
}
