//! In-process storage backend.
//!
//! A transaction holds the store lock for its whole lifetime and works on a
//! staged copy of the collections; `commit` swaps the copy in, anything else
//! discards it.

use crate::domain::account::{Account, NewAccount, Wallet};
use crate::storage::{
    AccountStore, AccountWithWallet, Storage, StoreError, StoreTransaction, WalletStore,
};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Default, Clone)]
struct MemoryState {
    accounts: Vec<Account>,
    wallets: Vec<Wallet>,
}

impl MemoryState {
    fn with_wallet(&self, account: &Account) -> AccountWithWallet {
        let wallet = self
            .wallets
            .iter()
            .find(|w| w.account_id == account.id)
            .cloned();
        (account.clone(), wallet)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl AccountStore for MemoryTransaction {
    async fn insert_account(&mut self, new: NewAccount) -> Result<Account, StoreError> {
        if self.staged.accounts.iter().any(|a| a.email == new.email) {
            return Err(StoreError::UniqueViolation("users.email".to_string()));
        }
        let account = Account {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            created_at: Utc::now(),
        };
        self.staged.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_account(&mut self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.staged.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_account_by_email(&mut self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .staged
            .accounts
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn update_account_name(&mut self, id: Uuid, name: &str) -> Result<bool, StoreError> {
        match self.staged.accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_password_hash(
        &mut self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        match self.staged.accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_account(&mut self, id: Uuid) -> Result<bool, StoreError> {
        if self.staged.wallets.iter().any(|w| w.account_id == id) {
            return Err(StoreError::Corrupt(format!(
                "account {} is still referenced by a wallet",
                id
            )));
        }
        let before = self.staged.accounts.len();
        self.staged.accounts.retain(|a| a.id != id);
        Ok(self.staged.accounts.len() != before)
    }
}

#[async_trait]
impl WalletStore for MemoryTransaction {
    async fn insert_wallet(
        &mut self,
        account_id: Uuid,
        balance: Decimal,
    ) -> Result<Wallet, StoreError> {
        if !self.staged.accounts.iter().any(|a| a.id == account_id) {
            return Err(StoreError::Corrupt(format!(
                "wallet references missing account {}",
                account_id
            )));
        }
        if self.staged.wallets.iter().any(|w| w.account_id == account_id) {
            return Err(StoreError::UniqueViolation("wallets.user_id".to_string()));
        }
        let wallet = Wallet {
            id: Uuid::new_v4(),
            account_id,
            balance,
            created_at: Utc::now(),
        };
        self.staged.wallets.push(wallet.clone());
        Ok(wallet)
    }

    async fn find_wallet_by_account(
        &mut self,
        account_id: Uuid,
    ) -> Result<Option<Wallet>, StoreError> {
        Ok(self
            .staged
            .wallets
            .iter()
            .find(|w| w.account_id == account_id)
            .cloned())
    }

    async fn delete_wallet_by_account(&mut self, account_id: Uuid) -> Result<bool, StoreError> {
        let before = self.staged.wallets.len();
        self.staged.wallets.retain(|w| w.account_id != account_id);
        Ok(self.staged.wallets.len() != before)
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_account_with_wallet(
        &mut self,
        id: Uuid,
    ) -> Result<Option<AccountWithWallet>, StoreError> {
        Ok(self
            .staged
            .accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| self.staged.with_wallet(a)))
    }

    async fn list_accounts_with_wallets(&mut self) -> Result<Vec<AccountWithWallet>, StoreError> {
        let mut rows: Vec<AccountWithWallet> = self
            .staged
            .accounts
            .iter()
            .map(|a| self.staged.with_wallet(a))
            .collect();
        rows.sort_by(|(a, _), (b, _)| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(rows)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
