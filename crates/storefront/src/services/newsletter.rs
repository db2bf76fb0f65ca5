//! Newsletter sign-up.

use chrono::Utc;
use tracing::instrument;

use vintage_shop_core::Email;

use super::ServiceError;
use crate::db::{RepositoryError, Repositories};
use crate::models::newsletter::Subscriber;

/// Newsletter service.
pub struct NewsletterService<'a> {
    repos: &'a Repositories,
}

impl<'a> NewsletterService<'a> {
    /// Create a new newsletter service.
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Subscribe an email address.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a malformed address and
    /// `ServiceError::Conflict` if it is already subscribed.
    #[instrument(skip_all)]
    pub async fn subscribe(&self, email: &str) -> Result<Subscriber, ServiceError> {
        let email = Email::parse(email)?;

        let subscriber = self
            .repos
            .newsletter
            .subscribe(&email, Utc::now())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    ServiceError::Conflict("This email is already subscribed".to_owned())
                }
                other => other.into(),
            })?;

        tracing::info!(domain = %email.domain(), "Newsletter subscription added");
        Ok(subscriber)
    }
}
