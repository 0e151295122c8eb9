//! PostgreSQL storage backend.

use crate::domain::account::{Account, NewAccount, Wallet};
use crate::storage::{
    AccountStore, AccountWithWallet, Storage, StoreError, StoreTransaction, WalletStore,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const CREATE_WALLETS_TABLE: &str = "CREATE TABLE IF NOT EXISTS wallets (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL UNIQUE REFERENCES users(id),
    balance NUMERIC(18, 2) NOT NULL CHECK (balance >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const ACCOUNT_COLUMNS: &str = "id, name, email, password, created_at";
const WALLET_COLUMNS: &str = "id, user_id, balance, created_at";

// Wallet columns are aliased so the account columns keep their plain names.
const JOINED_SELECT: &str = "SELECT u.id, u.name, u.email, u.password, u.created_at, \
     w.id AS wallet_id, w.balance AS wallet_balance, w.created_at AS wallet_created_at \
     FROM users u LEFT JOIN wallets w ON w.user_id = u.id";

/// Storage backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Connects and makes sure the `users` and `wallets` tables exist.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let storage = Self::from_pool(pool);
        storage.ensure_schema().await?;
        Ok(storage)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_WALLETS_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Wraps a sqlx transaction; sqlx rolls it back if it is dropped uncommitted.
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    Ok(Account {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password")?,
        created_at: row.try_get("created_at")?,
    })
}

fn wallet_from_row(row: &PgRow) -> Result<Wallet, StoreError> {
    Ok(Wallet {
        id: row.try_get("id")?,
        account_id: row.try_get("user_id")?,
        balance: row.try_get("balance")?,
        created_at: row.try_get("created_at")?,
    })
}

fn joined_from_row(row: &PgRow) -> Result<AccountWithWallet, StoreError> {
    let account = account_from_row(row)?;
    let wallet = match row.try_get::<Option<Uuid>, _>("wallet_id")? {
        Some(id) => Some(Wallet {
            id,
            account_id: account.id,
            balance: row.try_get("wallet_balance")?,
            created_at: row.try_get("wallet_created_at")?,
        }),
        None => None,
    };
    Ok((account, wallet))
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return StoreError::UniqueViolation(constraint);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl AccountStore for PgTransaction {
    async fn insert_account(&mut self, new: NewAccount) -> Result<Account, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password) VALUES ($1, $2, $3, $4) RETURNING {}",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.password_hash)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_write_error)?;
        account_from_row(&row)
    }

    async fn find_account(&mut self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_account_by_email(&mut self, email: &str) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn update_account_name(&mut self, id: Uuid, name: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_password_hash(
        &mut self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_account(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl WalletStore for PgTransaction {
    async fn insert_wallet(
        &mut self,
        account_id: Uuid,
        balance: Decimal,
    ) -> Result<Wallet, StoreError> {
        let sql = format!(
            "INSERT INTO wallets (id, user_id, balance) VALUES ($1, $2, $3) RETURNING {}",
            WALLET_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(account_id)
            .bind(balance)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_write_error)?;
        wallet_from_row(&row)
    }

    async fn find_wallet_by_account(
        &mut self,
        account_id: Uuid,
    ) -> Result<Option<Wallet>, StoreError> {
        let sql = format!("SELECT {} FROM wallets WHERE user_id = $1", WALLET_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(account_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(wallet_from_row).transpose()
    }

    async fn delete_wallet_by_account(&mut self, account_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM wallets WHERE user_id = $1")
            .bind(account_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn find_account_with_wallet(
        &mut self,
        id: Uuid,
    ) -> Result<Option<AccountWithWallet>, StoreError> {
        let sql = format!("{} WHERE u.id = $1", JOINED_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(joined_from_row).transpose()
    }

    async fn list_accounts_with_wallets(&mut self) -> Result<Vec<AccountWithWallet>, StoreError> {
        let sql = format!("{} ORDER BY u.created_at ASC, u.id ASC", JOINED_SELECT);
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(joined_from_row).collect()
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
