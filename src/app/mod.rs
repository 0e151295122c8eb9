pub mod access_guard;
pub mod account_service;

pub use access_guard::AccessGuard;
pub use account_service::AccountService;
