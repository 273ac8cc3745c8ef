//! Portfolio Access Layer.
//!
//! The only component that talks to the Record Store (hosted relational
//! table) and the Media Host (hosted media CDN). Everything above it works
//! with [`PortfolioAccess`] and [`CatalogView`] and never sees transport
//! failures directly:
//!
//! - reads degrade to empty results,
//! - `update` and `remove` report `false`,
//! - `add` is the one operation that fails loudly.
//!
//! The backends sit behind the [`RecordStore`] and [`MediaHost`] traits.
//! [`postgrest`] and [`cloudinary`] hold the HTTPS implementations;
//! [`memory`] holds in-process ones with fault injection for tests and
//! offline runs.

pub mod access;
pub mod catalog;
pub mod cloudinary;
pub mod config;
pub mod deletion;
pub mod error;
pub mod media_host;
pub mod memory;
pub mod postgrest;
pub mod record_store;

pub use access::{BulkRemoval, PortfolioAccess};
pub use catalog::{CatalogSnapshot, CatalogView, CatalogWatcher};
pub use config::{AccessConfig, ConfigError, MediaHostConfig, StoreConfig};
pub use deletion::{DeletionOutcome, DeletionState};
pub use error::{AccessError, MediaHostError, StoreError};
pub use media_host::{DestroyOutcome, MediaHost, MediaUpload, UploadedAsset};
pub use record_store::RecordStore;
