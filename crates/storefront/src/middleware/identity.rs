//! Identity extractors.
//!
//! The gateway in front of the API authenticates callers and forwards who
//! they are in the `x-user-id` and `x-user-role` headers. These extractors
//! turn those headers into a [`CurrentUser`] or reject the request.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;

/// Extractor that requires an identified caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_headers(&parts.headers)?;
        set_sentry_user(&user.id, &user.role.to_string());
        Ok(Self(user))
    }
}

/// Extractor that requires an identified caller with the admin role.
///
/// Unknown callers get 401, known non-admins get 403.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin route refused");
            return Err(AppError::Forbidden(format!("user {} is not an admin", user.id)));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Request, StatusCode};
    use vintage_shop_core::UserId;

    use super::*;
    use crate::models::identity::{USER_ID_HEADER, USER_ROLE_HEADER};

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/admin/verify");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_require_user() {
        let id = UserId::generate();
        let mut ok = parts(&[(USER_ID_HEADER, &id.to_string())]);
        let RequireUser(user) = RequireUser::from_request_parts(&mut ok, &()).await.unwrap();
        assert_eq!(user.id, id);

        let mut missing = parts(&[]);
        let err = RequireUser::from_request_parts(&mut missing, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_admin() {
        let id = UserId::generate().to_string();

        let mut admin = parts(&[(USER_ID_HEADER, &id), (USER_ROLE_HEADER, "admin")]);
        assert!(RequireAdmin::from_request_parts(&mut admin, &()).await.is_ok());

        let mut customer = parts(&[(USER_ID_HEADER, &id), (USER_ROLE_HEADER, "customer")]);
        let err = RequireAdmin::from_request_parts(&mut customer, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let mut anonymous = parts(&[(USER_ROLE_HEADER, "admin")]);
        let err = RequireAdmin::from_request_parts(&mut anonymous, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
