pub mod auth;
mod models;
mod sqlite_user_store;
mod token;
mod user_store;

pub use models::{NewUser, User, UserRole};
pub use sqlite_user_store::SqliteUserStore;
pub use token::{Claims, TokenService};
pub use user_store::UserStore;
