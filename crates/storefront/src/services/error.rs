//! Service error types.

use thiserror::Error;

use vintage_shop_core::catalog::ProductInputError;
use vintage_shop_core::order::OrderError;
use vintage_shop_core::settings::SettingsInputError;
use vintage_shop_core::{EmailError, PriceError, StatusParseError};

use super::images::ImageStoreError;
use crate::db::RepositoryError;

/// Errors that can occur in storefront services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The referenced entity does not exist (or is not visible to the caller).
    #[error("{0} not found")]
    NotFound(String),

    /// The request clashes with the current state.
    #[error("{0}")]
    Conflict(String),

    /// The request is malformed.
    #[error("{0}")]
    Validation(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),

    /// Image storage failed.
    #[error("image store error: {0}")]
    ImageStore(ImageStoreError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("record".to_owned()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

impl From<ImageStoreError> for ServiceError {
    fn from(err: ImageStoreError) -> Self {
        match err {
            ImageStoreError::UnsupportedType(_) | ImageStoreError::TooMany(_) => {
                Self::Validation(err.to_string())
            }
            ImageStoreError::Io(_) => Self::ImageStore(err),
        }
    }
}

impl From<OrderError> for ServiceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::LineNotFound(product) => Self::NotFound(format!("product {product} in order")),
            OrderError::NotCancellable(_) => Self::Conflict(err.to_string()),
            OrderError::NoLines | OrderError::InvalidQuantity { .. } => {
                Self::Validation(err.to_string())
            }
        }
    }
}

impl From<ProductInputError> for ServiceError {
    fn from(err: ProductInputError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<SettingsInputError> for ServiceError {
    fn from(err: SettingsInputError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EmailError> for ServiceError {
    fn from(err: EmailError) -> Self {
        Self::Validation(format!("invalid email: {err}"))
    }
}

impl From<PriceError> for ServiceError {
    fn from(err: PriceError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StatusParseError> for ServiceError {
    fn from(err: StatusParseError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use vintage_shop_core::{OrderStatus, ProductId};

    use super::*;

    #[test]
    fn test_repository_errors_map_to_domain_kinds() {
        assert!(matches!(
            ServiceError::from(RepositoryError::NotFound),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::Conflict("stale".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::DataCorruption("bad".into())),
            ServiceError::Repository(_)
        ));
    }

    #[test]
    fn test_order_errors_map_to_domain_kinds() {
        assert!(matches!(
            ServiceError::from(OrderError::NotCancellable(OrderStatus::Shipped)),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(OrderError::LineNotFound(ProductId::generate())),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(OrderError::NoLines),
            ServiceError::Validation(_)
        ));
    }
}
