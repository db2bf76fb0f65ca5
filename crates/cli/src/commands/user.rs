//! User management commands.
//!
//! Users are authenticated by the identity gateway; the shop keeps a record
//! of each so orders can show who placed them.
//!
//! # Usage
//!
//! ```bash
//! vs-cli user create -e ada@example.com -f Ada -l Lovelace -r admin
//! ```

use thiserror::Error;

use vintage_shop_core::user::NewUser;
use vintage_shop_core::{Email, UserId, UserRole};
use vintage_shop_storefront::db::{PgUserRepository, RepositoryError, UserRepository};

use super::CommandError;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: customer, admin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a user record and return its ID.
///
/// # Errors
///
/// Returns an error for an invalid role or email, a duplicate email, or a
/// database failure.
pub async fn create(
    email: &str,
    first_name: Option<String>,
    last_name: Option<String>,
    role: &str,
) -> Result<UserId, UserError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|e| UserError::InvalidEmail(e.to_string()))?;

    let users = PgUserRepository::new(super::connect().await?);

    tracing::info!("Creating user: {} ({})", email, role);
    let user = users
        .create(NewUser {
            id: None,
            email: email.clone(),
            first_name,
            last_name,
            role,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(email.to_string()),
            other => other.into(),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user.id)
}
