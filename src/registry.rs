//! Process-wide store registry.
//!
//! Holds exactly one set of stores per module for the lifetime of the
//! process, so every consumer of a module reads and patches the same state.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::api::{HttpTransport, Transport};
use crate::config::{Config, ServiceFamily};
use crate::error::{BackofficeError, Result};
use crate::modules::Module;
use crate::notify::Notifier;
use crate::store::{FilterStore, Observable, RecordStore, ViewTabStore};

/// The three stores backing one module's list view
pub struct ModuleStores {
    pub module: Module,
    pub filters: Observable<FilterStore>,
    pub tabs: Observable<ViewTabStore>,
    pub records: RecordStore,
}

impl ModuleStores {
    pub fn new(
        module: Module,
        page_size: u32,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            module,
            filters: Observable::new(module.filter_store()),
            tabs: Observable::new(module.tab_store()),
            records: RecordStore::new(module.entity_config(page_size), transport, notifier),
        }
    }
}

pub struct StoreRegistry {
    transports: HashMap<ServiceFamily, Arc<dyn Transport>>,
    notifier: Arc<dyn Notifier>,
    page_size: u32,
    stores: DashMap<Module, Arc<ModuleStores>>,
}

impl StoreRegistry {
    pub fn new(notifier: Arc<dyn Notifier>, page_size: u32) -> Self {
        Self {
            transports: HashMap::new(),
            notifier,
            page_size: page_size.max(1),
            stores: DashMap::new(),
        }
    }

    /// One HTTP transport per service family that has a base URL configured
    pub fn from_config(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let mut registry = Self::new(notifier, config.page_size);
        for family in ServiceFamily::ALL {
            if config.api_domain(family).is_some() {
                let transport = HttpTransport::from_config(config, family)?;
                registry = registry.with_transport(family, Arc::new(transport));
            }
        }
        Ok(registry)
    }

    pub fn with_transport(mut self, family: ServiceFamily, transport: Arc<dyn Transport>) -> Self {
        self.transports.insert(family, transport);
        self
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn has_transport(&self, family: ServiceFamily) -> bool {
        self.transports.contains_key(&family)
    }

    /// The module's stores, created on first use
    pub fn stores(&self, module: Module) -> Result<Arc<ModuleStores>> {
        if let Some(stores) = self.stores.get(&module) {
            return Ok(Arc::clone(stores.value()));
        }

        let family = module.family();
        let transport = self.transports.get(&family).cloned().ok_or_else(|| {
            BackofficeError::Config(format!(
                "no {family} backend configured for {module}. Set {} or run \
                 `backoffice config set api.{family} <url>`",
                family.env_var()
            ))
        })?;

        let entry = self.stores.entry(module).or_insert_with(|| {
            debug!(%module, "creating module stores");
            Arc::new(ModuleStores::new(
                module,
                self.page_size,
                transport,
                Arc::clone(&self.notifier),
            ))
        });
        Ok(Arc::clone(entry.value()))
    }
}

static REGISTRY: OnceCell<StoreRegistry> = OnceCell::const_new();

/// Get or build the global registry.
///
/// If `init` fails the error is returned and the cell stays empty, so a
/// later call can retry.
pub async fn get_or_init_registry<F>(init: F) -> Result<&'static StoreRegistry>
where
    F: FnOnce() -> Result<StoreRegistry>,
{
    REGISTRY.get_or_try_init(|| async { init() }).await
}
