pub mod auth;
pub mod router;
pub mod types;
pub mod validation;
pub mod handlers {
    pub mod common;
    pub mod health;
    pub mod login;
    pub mod users;
}

pub use auth::CurrentAccount;
pub use router::{create_router, ApiDoc};
pub use types::AppState;
