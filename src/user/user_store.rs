use super::auth::UserCredentials;
use super::models::{NewUser, User};
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates a new user together with its password credentials.
    /// Returns Ok(None) if the email is already taken.
    /// Returns Err if there is a database error.
    fn create_user(&self, new_user: NewUser, password: &str) -> Result<Option<User>>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>>;

    /// Returns the user's password credentials.
    /// Returns Ok(None) if the user has none.
    fn get_credentials(&self, user_id: i64) -> Result<Option<UserCredentials>>;
}
