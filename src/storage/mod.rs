//! Persistence for accounts and wallets.
//!
//! Every read and write goes through a [`StoreTransaction`] obtained from
//! [`Storage::begin`]. A transaction that is dropped without calling
//! [`StoreTransaction::commit`] is rolled back, so early returns via `?`
//! never leave partial writes behind.

use crate::domain::account::{Account, NewAccount, Wallet};
use crate::infra::config::{AppConfig, StorageBackend};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A uniqueness constraint rejected the write; carries the constraint or field name.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
    #[error("storage is not configured: {0}")]
    NotConfigured(&'static str),
}

/// Account operations available inside a transaction.
#[async_trait]
pub trait AccountStore: Send {
    async fn insert_account(&mut self, new: NewAccount) -> Result<Account, StoreError>;

    async fn find_account(&mut self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Exact, case-sensitive match.
    async fn find_account_by_email(&mut self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Returns `false` when no account has `id`.
    async fn update_account_name(&mut self, id: Uuid, name: &str) -> Result<bool, StoreError>;

    async fn update_password_hash(
        &mut self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, StoreError>;

    async fn delete_account(&mut self, id: Uuid) -> Result<bool, StoreError>;
}

/// Wallet operations available inside a transaction.
#[async_trait]
pub trait WalletStore: Send {
    async fn insert_wallet(
        &mut self,
        account_id: Uuid,
        balance: Decimal,
    ) -> Result<Wallet, StoreError>;

    async fn find_wallet_by_account(&mut self, account_id: Uuid)
        -> Result<Option<Wallet>, StoreError>;

    async fn delete_wallet_by_account(&mut self, account_id: Uuid) -> Result<bool, StoreError>;
}

/// An account together with its wallet, if it has one.
pub type AccountWithWallet = (Account, Option<Wallet>);

/// An open unit of work over both stores.
#[async_trait]
pub trait StoreTransaction: AccountStore + WalletStore {
    /// Reads the account and its wallet in one statement, so both come from
    /// the same snapshot even under concurrent deletes.
    async fn find_account_with_wallet(
        &mut self,
        id: Uuid,
    ) -> Result<Option<AccountWithWallet>, StoreError>;

    /// All accounts with their wallets, ordered by `(created_at, id)`.
    async fn list_accounts_with_wallets(&mut self) -> Result<Vec<AccountWithWallet>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Explicit rollback. Dropping the transaction has the same effect.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// A storage backend handing out transactions.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    /// Cheap reachability check used by `/health`.
    async fn ping(&self) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}

/// Opens the backend selected by `config`.
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn Storage>, StoreError> {
    match config.storage_backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(StoreError::NotConfigured("DATABASE_URL"))?;
            let storage = PgStorage::connect(url, config.max_connections).await?;
            Ok(Arc::new(storage))
        }
    }
}
