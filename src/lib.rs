pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{AccessGuard, AccountService};
pub use crypto::{CredentialCodec, TokenCodec};
pub use domain::{AccountError, GuardError};
pub use infra::config::AppConfig;
pub use storage::{MemoryStorage, PgStorage, Storage};
