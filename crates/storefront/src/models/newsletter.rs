//! Newsletter subscription records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vintage_shop_core::Email;

/// A newsletter subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub email: Email,
    pub subscribed_at: DateTime<Utc>,
}
