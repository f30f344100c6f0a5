// vflow Library Entry Point

pub mod constants;
pub mod error;
pub mod config;
pub mod tools;
pub mod hash;
pub mod catalog;
pub mod shoot;
pub mod selector;
pub mod plan;
pub mod metadata;
pub mod ingest;

pub use catalog::{MediaCatalog, MediaFile};
pub use error::{Result, VflowError};
pub use plan::{CopyPlan, DestinationRoot, ReconciliationReport};
pub use selector::SelectorToken;
pub use shoot::{partition, ShootBucket};
