//! Client-side list state: filters, view tabs and the cached record page.
//!
//! Every store is an explicit context object. `FilterStore` and
//! `ViewTabStore` are plain state wrapped in an [`Observable`] by the
//! registry; `RecordStore` owns its lock and talks to the transport itself.

pub mod collection;
pub mod entity;
pub mod filter;
pub mod observer;
pub mod record;
pub mod tabs;

pub use collection::{FetchOutcome, MatchedRecord, RecordEvent, RecordState, RecordStore};
pub use entity::{DeleteMode, EntityConfig, Endpoints};
pub use filter::{DEFAULT_MAX_FILTERS, FilterDefinition, FilterStore, FilterValue, SelectOption};
pub use observer::{Observable, SubscriptionId, Subscribers};
pub use record::{Record, RecordId};
pub use tabs::{TabCatalog, TabGroup, ViewTab, ViewTabStore};
