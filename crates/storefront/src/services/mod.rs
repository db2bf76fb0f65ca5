//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `orders` - Cart merging, line edits, status lifecycle and archives
//! - `catalog` - Product listing, lookup and maintenance
//! - `settings` - The site settings singleton
//! - `newsletter` - Newsletter sign-up
//! - `dashboard` - Admin dashboard figures
//! - `images` - Storage for uploaded images
//!
//! Services borrow the [`Repositories`](crate::db::Repositories) from the
//! application state and are cheap to build per request.

pub mod catalog;
pub mod dashboard;
mod error;
pub mod images;
pub mod newsletter;
pub mod orders;
pub mod settings;

pub use catalog::CatalogService;
pub use dashboard::{DashboardService, DashboardStats};
pub use error::ServiceError;
pub use images::{FsImageStore, ImageStore, ImageStoreError, ImageUpload, MemoryImageStore};
pub use newsletter::NewsletterService;
pub use orders::OrderService;
pub use settings::{HeroUploads, SettingsService};
