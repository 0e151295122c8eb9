//! Account lifecycle: sign-up, profile reads, rename, password change,
//! deletion and login.
//!
//! Sign-up and deletion touch both the account and its wallet; each runs in a
//! single storage transaction so either both rows change or neither does.

use crate::crypto::{CredentialCodec, TokenCodec};
use crate::domain::account::{
    initial_wallet_balance, AccountProfile, AccountSummary, CreatedAccount, NewAccount,
    RenamedAccount, SessionToken,
};
use crate::domain::error::AccountError;
use crate::storage::{AccountStore, Storage, StoreError, StoreTransaction, WalletStore};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct AccountService {
    storage: Arc<dyn Storage>,
    credentials: CredentialCodec,
    tokens: TokenCodec,
}

fn missing_wallet(account_id: Uuid) -> AccountError {
    AccountError::InternalInconsistency(format!("account {} has no wallet", account_id))
}

fn duplicate_email_on_conflict(err: StoreError) -> AccountError {
    match err {
        StoreError::UniqueViolation(ref constraint) if constraint.contains("email") => {
            AccountError::DuplicateEmail
        }
        other => AccountError::Storage(other),
    }
}

fn non_empty_name(name: &str) -> Result<&str, AccountError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AccountError::InvalidInput("name must not be empty".to_string()));
    }
    Ok(trimmed)
}

impl AccountService {
    pub fn new(storage: Arc<dyn Storage>, credentials: CredentialCodec, tokens: TokenCodec) -> Self {
        Self {
            storage,
            credentials,
            tokens,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    /// Every account with its wallet, ordered by creation time.
    pub async fn list_accounts(&self) -> Result<Vec<AccountSummary>, AccountError> {
        let mut tx = self.storage.begin().await?;
        let rows = tx.list_accounts_with_wallets().await?;
        tx.rollback().await?;

        rows.into_iter()
            .map(|(account, wallet)| {
                let wallet = wallet.ok_or_else(|| missing_wallet(account.id))?;
                Ok(AccountSummary {
                    id: account.id,
                    name: account.name,
                    email: account.email,
                    wallet: wallet.view(),
                })
            })
            .collect()
    }

    /// Signs up a new account and opens its wallet with the starting balance.
    pub async fn create_account(
        &self,
        name: &str,
        password: &str,
        email: &str,
    ) -> Result<CreatedAccount, AccountError> {
        let name = non_empty_name(name)?;
        let password_hash = self.credentials.hash_blocking(password).await?;

        let mut tx = self.storage.begin().await?;
        if tx.find_account_by_email(email).await?.is_some() {
            debug!(email, "sign-up rejected: email already registered");
            return Err(AccountError::DuplicateEmail);
        }

        let account = tx
            .insert_account(NewAccount {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(duplicate_email_on_conflict)?;
        let wallet = tx
            .insert_wallet(account.id, initial_wallet_balance())
            .await?;
        tx.commit().await?;

        info!(account_id = %account.id, wallet_id = %wallet.id, "account created");
        Ok(CreatedAccount {
            id: account.id,
            name: account.name,
            wallet: wallet.view(),
        })
    }

    pub async fn get_account(&self, id: Uuid) -> Result<AccountProfile, AccountError> {
        let mut tx = self.storage.begin().await?;
        let row = tx.find_account_with_wallet(id).await?;
        tx.rollback().await?;

        let (account, wallet) = row.ok_or(AccountError::NotFound)?;
        let wallet = wallet.ok_or_else(|| missing_wallet(id))?;
        Ok(AccountProfile {
            id: account.id,
            name: account.name,
            email: account.email,
            created_at: account.created_at,
            wallet: wallet.view(),
        })
    }

    pub async fn rename_account(
        &self,
        id: Uuid,
        name: &str,
    ) -> Result<RenamedAccount, AccountError> {
        let name = non_empty_name(name)?;

        let mut tx = self.storage.begin().await?;
        if !tx.update_account_name(id, name).await? {
            return Err(AccountError::NotFound);
        }
        tx.commit().await?;

        info!(account_id = %id, "account renamed");
        Ok(RenamedAccount {
            id,
            name: name.to_string(),
        })
    }

    /// Replaces the stored digest; a password equal to the current one is rejected.
    ///
    /// Both argon2 runs happen between the read and the write transaction, so
    /// no storage lock or pooled connection is held while hashing.
    pub async fn change_password(&self, id: Uuid, password: &str) -> Result<(), AccountError> {
        let mut tx = self.storage.begin().await?;
        let account = tx.find_account(id).await?;
        tx.rollback().await?;
        let account = account.ok_or(AccountError::NotFound)?;

        if self
            .credentials
            .verify_blocking(password, &account.password_hash)
            .await?
        {
            return Err(AccountError::PasswordUnchanged);
        }
        let password_hash = self.credentials.hash_blocking(password).await?;

        let mut tx = self.storage.begin().await?;
        if !tx.update_password_hash(id, &password_hash).await? {
            return Err(AccountError::NotFound);
        }
        tx.commit().await?;

        info!(account_id = %id, "password changed");
        Ok(())
    }

    /// Removes the wallet and the account together.
    pub async fn delete_account(&self, id: Uuid) -> Result<(), AccountError> {
        let mut tx = self.storage.begin().await?;
        if tx.find_account(id).await?.is_none() {
            return Err(AccountError::NotFound);
        }

        if !tx.delete_wallet_by_account(id).await? {
            warn!(account_id = %id, "deleting account that had no wallet");
        }
        if !tx.delete_account(id).await? {
            return Err(AccountError::NotFound);
        }
        tx.commit().await?;

        info!(account_id = %id, "account deleted");
        Ok(())
    }

    /// Checks credentials and issues a session token.
    ///
    /// Unknown email and wrong password both yield `NotFound` so callers cannot
    /// probe which emails are registered.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionToken, AccountError> {
        let mut tx = self.storage.begin().await?;
        let account = tx.find_account_by_email(email).await?;
        tx.rollback().await?;

        let Some(account) = account else {
            debug!("login rejected: unknown email");
            return Err(AccountError::NotFound);
        };

        if !self
            .credentials
            .verify_blocking(password, &account.password_hash)
            .await?
        {
            debug!(account_id = %account.id, "login rejected: wrong password");
            return Err(AccountError::NotFound);
        }

        let token = self.tokens.issue(account.id)?;
        info!(account_id = %account.id, "session token issued");
        Ok(SessionToken { token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::password::test_codec;
    use crate::domain::account::{Account, Wallet, INITIAL_WALLET_UNITS};
    use crate::storage::{AccountWithWallet, MemoryStorage};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::Mutex as StdMutex;

    const SECRET: &[u8] = b"service-test-key";

    fn service_with(storage: Arc<dyn Storage>) -> AccountService {
        AccountService::new(storage, test_codec(), TokenCodec::new(SECRET))
    }

    fn service() -> (AccountService, MemoryStorage) {
        let storage = MemoryStorage::new();
        (service_with(Arc::new(storage.clone())), storage)
    }

    #[tokio::test]
    async fn ada_lifecycle() {
        let (svc, _) = service();

        let created = svc
            .create_account("Ada", "Str0ng!Pw", "ada@x.com")
            .await
            .unwrap();
        assert_eq!(created.name, "Ada");
        assert_eq!(created.wallet.balance, Decimal::from(INITIAL_WALLET_UNITS));

        let renamed = svc.rename_account(created.id, "Ada L.").await.unwrap();
        assert_eq!(renamed.id, created.id);
        assert_eq!(renamed.name, "Ada L.");

        svc.delete_account(created.id).await.unwrap();
        assert!(matches!(
            svc.get_account(created.id).await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn new_account_starts_with_one_hundred() {
        let (svc, _) = service();
        let created = svc
            .create_account("Ada", "Str0ng!Pw", "ada@x.com")
            .await
            .unwrap();

        let profile = svc.get_account(created.id).await.unwrap();
        assert_eq!(profile.email, "ada@x.com");
        assert_eq!(profile.wallet.id, created.wallet.id);
        assert_eq!(profile.wallet.balance, Decimal::from(100));
    }

    #[tokio::test]
    async fn duplicate_email_keeps_a_single_account() {
        let (svc, _) = service();
        svc.create_account("Ada", "Str0ng!Pw", "ada@x.com")
            .await
            .unwrap();

        let second = svc.create_account("Other", "Str0ng!Pw2", "ada@x.com").await;
        assert!(matches!(second, Err(AccountError::DuplicateEmail)));

        let accounts = svc.list_accounts().await.unwrap();
        let matching = accounts.iter().filter(|a| a.email == "ada@x.com").count();
        assert_eq!(matching, 1);
    }

    #[tokio::test]
    async fn email_match_is_case_sensitive() {
        let (svc, _) = service();
        svc.create_account("Ada", "Str0ng!Pw", "ada@x.com")
            .await
            .unwrap();
        svc.create_account("Ada", "Str0ng!Pw", "ADA@x.com")
            .await
            .unwrap();
        assert_eq!(svc.list_accounts().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_removes_the_wallet_too() {
        let (svc, storage) = service();
        let created = svc
            .create_account("Ada", "Str0ng!Pw", "ada@x.com")
            .await
            .unwrap();

        svc.delete_account(created.id).await.unwrap();

        let mut tx = storage.begin().await.unwrap();
        assert!(tx.find_wallet_by_account(created.id).await.unwrap().is_none());
        assert!(tx.list_accounts_with_wallets().await.unwrap().is_empty());
        drop(tx);

        assert!(matches!(
            svc.delete_account(created.id).await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn repeating_a_password_change_is_rejected() {
        let (svc, _) = service();
        let created = svc
            .create_account("Ada", "Str0ng!Pw", "ada@x.com")
            .await
            .unwrap();

        svc.change_password(created.id, "N3w!Passw0rd").await.unwrap();
        assert!(matches!(
            svc.change_password(created.id, "N3w!Passw0rd").await,
            Err(AccountError::PasswordUnchanged)
        ));

        svc.authenticate("ada@x.com", "N3w!Passw0rd").await.unwrap();
        assert!(matches!(
            svc.authenticate("ada@x.com", "Str0ng!Pw").await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn missing_account_operations_report_not_found() {
        let (svc, _) = service();
        let id = Uuid::new_v4();

        assert!(matches!(svc.get_account(id).await, Err(AccountError::NotFound)));
        assert!(matches!(
            svc.rename_account(id, "Ada").await,
            Err(AccountError::NotFound)
        ));
        assert!(matches!(
            svc.change_password(id, "Str0ng!Pw").await,
            Err(AccountError::NotFound)
        ));
        assert!(matches!(
            svc.delete_account(id).await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let (svc, _) = service();
        assert!(matches!(
            svc.create_account("   ", "Str0ng!Pw", "ada@x.com").await,
            Err(AccountError::InvalidInput(_))
        ));

        let created = svc
            .create_account("Ada", "Str0ng!Pw", "ada@x.com")
            .await
            .unwrap();
        assert!(matches!(
            svc.rename_account(created.id, "").await,
            Err(AccountError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_issues_token_for_the_account() {
        let (svc, _) = service();
        let created = svc
            .create_account("Ada", "Str0ng!Pw", "ada@x.com")
            .await
            .unwrap();

        let session = svc.authenticate("ada@x.com", "Str0ng!Pw").await.unwrap();
        let claims = svc.tokens().verify(&session.token).unwrap();
        assert_eq!(claims.sub, created.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (svc, _) = service();
        svc.create_account("Ada", "Str0ng!Pw", "ada@x.com")
            .await
            .unwrap();

        assert!(matches!(
            svc.authenticate("ada@x.com", "Wr0ng!Pw").await,
            Err(AccountError::NotFound)
        ));
        assert!(matches!(
            svc.authenticate("nobody@x.com", "Str0ng!Pw").await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn listing_twice_without_writes_is_identical() {
        let (svc, _) = service();
        for i in 0..3 {
            svc.create_account("Ada", "Str0ng!Pw", &format!("ada{}@x.com", i))
                .await
                .unwrap();
        }

        let first = svc.list_accounts().await.unwrap();
        let second = svc.list_accounts().await.unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    async fn insert_account_without_wallet(storage: &MemoryStorage) -> Account {
        let mut tx = storage.begin().await.unwrap();
        let account = tx
            .insert_account(NewAccount {
                name: "Orphan".to_string(),
                email: "orphan@x.com".to_string(),
                password_hash: "$argon2id$stub".to_string(),
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        account
    }

    #[tokio::test]
    async fn account_without_wallet_is_an_inconsistency() {
        let (svc, storage) = service();
        let orphan = insert_account_without_wallet(&storage).await;

        assert!(matches!(
            svc.get_account(orphan.id).await,
            Err(AccountError::InternalInconsistency(_))
        ));
        assert!(matches!(
            svc.list_accounts().await,
            Err(AccountError::InternalInconsistency(_))
        ));

        svc.delete_account(orphan.id).await.unwrap();
        assert!(svc.list_accounts().await.unwrap().is_empty());
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Fault {
        None,
        WalletInsert,
        AccountDelete,
    }

    /// Memory storage that logs every store call and can fail one kind of write.
    struct ScriptedStorage {
        inner: MemoryStorage,
        fault: Fault,
        log: Arc<StdMutex<Vec<&'static str>>>,
    }

    impl ScriptedStorage {
        fn new(inner: MemoryStorage, fault: Fault) -> Self {
            Self {
                inner,
                fault,
                log: Arc::default(),
            }
        }

        fn events(&self) -> Vec<&'static str> {
            self.log.lock().unwrap().clone()
        }
    }

    struct ScriptedTx {
        inner: Box<dyn StoreTransaction>,
        fault: Fault,
        log: Arc<StdMutex<Vec<&'static str>>>,
    }

    impl ScriptedTx {
        fn record(&self, event: &'static str) {
            self.log.lock().unwrap().push(event);
        }

        fn injected(&self, fault: Fault) -> Result<(), StoreError> {
            if self.fault == fault {
                return Err(StoreError::Corrupt("injected failure".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Storage for ScriptedStorage {
        async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
            self.log.lock().unwrap().push("begin");
            Ok(Box::new(ScriptedTx {
                inner: self.inner.begin().await?,
                fault: self.fault,
                log: self.log.clone(),
            }))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.inner.ping().await
        }

        fn backend_name(&self) -> &'static str {
            "scripted"
        }
    }

    #[async_trait]
    impl AccountStore for ScriptedTx {
        async fn insert_account(&mut self, new: NewAccount) -> Result<Account, StoreError> {
            self.record("insert_account");
            self.inner.insert_account(new).await
        }

        async fn find_account(&mut self, id: Uuid) -> Result<Option<Account>, StoreError> {
            self.record("find_account");
            self.inner.find_account(id).await
        }

        async fn find_account_by_email(
            &mut self,
            email: &str,
        ) -> Result<Option<Account>, StoreError> {
            self.record("find_account_by_email");
            self.inner.find_account_by_email(email).await
        }

        async fn update_account_name(&mut self, id: Uuid, name: &str) -> Result<bool, StoreError> {
            self.record("update_account_name");
            self.inner.update_account_name(id, name).await
        }

        async fn update_password_hash(
            &mut self,
            id: Uuid,
            password_hash: &str,
        ) -> Result<bool, StoreError> {
            self.record("update_password_hash");
            self.inner.update_password_hash(id, password_hash).await
        }

        async fn delete_account(&mut self, id: Uuid) -> Result<bool, StoreError> {
            self.record("delete_account");
            self.injected(Fault::AccountDelete)?;
            self.inner.delete_account(id).await
        }
    }

    #[async_trait]
    impl WalletStore for ScriptedTx {
        async fn insert_wallet(
            &mut self,
            account_id: Uuid,
            balance: Decimal,
        ) -> Result<Wallet, StoreError> {
            self.record("insert_wallet");
            self.injected(Fault::WalletInsert)?;
            self.inner.insert_wallet(account_id, balance).await
        }

        async fn find_wallet_by_account(
            &mut self,
            account_id: Uuid,
        ) -> Result<Option<Wallet>, StoreError> {
            self.record("find_wallet_by_account");
            self.inner.find_wallet_by_account(account_id).await
        }

        async fn delete_wallet_by_account(
            &mut self,
            account_id: Uuid,
        ) -> Result<bool, StoreError> {
            self.record("delete_wallet_by_account");
            self.inner.delete_wallet_by_account(account_id).await
        }
    }

    #[async_trait]
    impl StoreTransaction for ScriptedTx {
        async fn find_account_with_wallet(
            &mut self,
            id: Uuid,
        ) -> Result<Option<AccountWithWallet>, StoreError> {
            self.record("find_account_with_wallet");
            self.inner.find_account_with_wallet(id).await
        }

        async fn list_accounts_with_wallets(
            &mut self,
        ) -> Result<Vec<AccountWithWallet>, StoreError> {
            self.record("list_accounts_with_wallets");
            self.inner.list_accounts_with_wallets().await
        }

        async fn commit(self: Box<Self>) -> Result<(), StoreError> {
            self.record("commit");
            self.inner.commit().await
        }

        async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
            self.record("rollback");
            self.inner.rollback().await
        }
    }

    fn scripted(memory: &MemoryStorage, fault: Fault) -> (AccountService, Arc<ScriptedStorage>) {
        let storage = Arc::new(ScriptedStorage::new(memory.clone(), fault));
        (service_with(storage.clone()), storage)
    }

    #[tokio::test]
    async fn wallet_failure_rolls_back_the_account_insert() {
        let memory = MemoryStorage::new();
        let (svc, _) = scripted(&memory, Fault::WalletInsert);

        let result = svc.create_account("Ada", "Str0ng!Pw", "ada@x.com").await;
        assert!(matches!(
            result,
            Err(AccountError::Storage(StoreError::Corrupt(_)))
        ));

        let mut tx = memory.begin().await.unwrap();
        assert!(tx.list_accounts_with_wallets().await.unwrap().is_empty());
        assert!(tx.find_account_by_email("ada@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn account_delete_failure_keeps_the_wallet() {
        let memory = MemoryStorage::new();
        let created = service_with(Arc::new(memory.clone()))
            .create_account("Ada", "Str0ng!Pw", "ada@x.com")
            .await
            .unwrap();

        let (svc, storage) = scripted(&memory, Fault::AccountDelete);
        let result = svc.delete_account(created.id).await;
        assert!(matches!(
            result,
            Err(AccountError::Storage(StoreError::Corrupt(_)))
        ));

        // The wallet delete ran before the failing account delete.
        let events = storage.events();
        let wallet_delete = events.iter().position(|e| *e == "delete_wallet_by_account");
        let account_delete = events.iter().position(|e| *e == "delete_account");
        assert!(wallet_delete.is_some());
        assert!(wallet_delete < account_delete);
        assert!(!events.contains(&"commit"));

        let mut tx = memory.begin().await.unwrap();
        let (account, wallet) = tx
            .find_account_with_wallet(created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.email, "ada@x.com");
        assert_eq!(wallet.map(|w| w.id), Some(created.wallet.id));
    }

    #[tokio::test]
    async fn password_change_hashes_between_transactions() {
        let memory = MemoryStorage::new();
        let created = service_with(Arc::new(memory.clone()))
            .create_account("Ada", "Str0ng!Pw", "ada@x.com")
            .await
            .unwrap();

        let (svc, storage) = scripted(&memory, Fault::None);
        svc.change_password(created.id, "N3w!Passw0rd").await.unwrap();

        // The read transaction is closed before hashing; the write transaction
        // only updates the digest.
        assert_eq!(
            storage.events(),
            vec![
                "begin",
                "find_account",
                "rollback",
                "begin",
                "update_password_hash",
                "commit"
            ]
        );
        svc.authenticate("ada@x.com", "N3w!Passw0rd").await.unwrap();
    }
}
