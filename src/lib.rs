pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod modules;
pub mod notify;
pub mod paths;
pub mod registry;
pub mod session;
pub mod store;

pub use api::{ApiResponse, FormData, HttpTransport, Transport};
pub use config::{Config, ServiceFamily};
pub use error::{BackofficeError, Result};
pub use modules::Module;
pub use notify::{Notifier, RecordingNotifier, Toast, ToastLevel, TracingNotifier};
pub use registry::{ModuleStores, StoreRegistry, get_or_init_registry};
pub use session::ListSession;
pub use store::{
    DeleteMode, EntityConfig, FetchOutcome, FilterDefinition, FilterStore, FilterValue, Record,
    RecordEvent, RecordId, RecordState, RecordStore, SelectOption, TabCatalog, ViewTab,
    ViewTabStore,
};
