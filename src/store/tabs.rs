//! View-tab store.
//!
//! A module shows a bounded row of saved views ("All", "My Records",
//! "Recently Added"...). Exactly one is active. The default view and the
//! module's "all" sentinel can never be closed.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A named saved view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewTab {
    pub label: String,
    pub value: String,
}

impl ViewTab {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A titled group of views in the "add view" picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabGroup {
    pub label: String,
    pub options: Vec<ViewTab>,
}

/// Every view a module offers. The first group seeds a fresh store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabCatalog {
    pub groups: Vec<TabGroup>,
}

impl TabCatalog {
    pub fn new(groups: Vec<TabGroup>) -> Self {
        Self { groups }
    }

    pub fn first_group(&self) -> Option<&TabGroup> {
        self.groups.first()
    }

    pub fn find(&self, value: &str) -> Option<&ViewTab> {
        self.groups
            .iter()
            .flat_map(|g| g.options.iter())
            .find(|t| t.value == value)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.options.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTabStore {
    tabs: Vec<ViewTab>,
    active_tab: Option<String>,
    default_tab: Option<String>,
    /// Default requested at construction, promoted by `initialize`
    preferred_default: Option<String>,
    /// Hardcoded per-module view that is never removable
    sentinel: Option<String>,
    max_tabs: usize,
}

impl ViewTabStore {
    pub fn new(max_tabs: usize) -> Self {
        Self {
            tabs: Vec::new(),
            active_tab: None,
            default_tab: None,
            preferred_default: None,
            sentinel: None,
            max_tabs,
        }
    }

    pub fn with_sentinel(mut self, value: impl Into<String>) -> Self {
        self.sentinel = Some(value.into());
        self
    }

    /// Default to promote when the store is first initialized
    pub fn with_default_tab(mut self, value: impl Into<String>) -> Self {
        self.preferred_default = Some(value.into());
        self
    }

    pub fn tabs(&self) -> &[ViewTab] {
        &self.tabs
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    pub fn default_tab(&self) -> Option<&str> {
        self.default_tab.as_deref()
    }

    pub fn sentinel(&self) -> Option<&str> {
        self.sentinel.as_deref()
    }

    pub fn max_tabs(&self) -> usize {
        self.max_tabs
    }

    pub fn contains(&self, value: &str) -> bool {
        self.tabs.iter().any(|t| t.value == value)
    }

    pub fn is_full(&self) -> bool {
        self.tabs.len() >= self.max_tabs
    }

    /// A tab the user may not close
    pub fn is_protected(&self, value: &str) -> bool {
        self.sentinel.as_deref() == Some(value) || self.default_tab.as_deref() == Some(value)
    }

    /// Replace the shown tabs and cut the list to capacity. The default tab
    /// always survives: it moves to the front when the new list drops it or
    /// places it past the cut.
    pub fn set_tabs(&mut self, mut tabs: Vec<ViewTab>) {
        let displaced_default = self.default_tab.as_deref().and_then(|default| {
            match tabs.iter().position(|t| t.value == default) {
                Some(index) if index < self.max_tabs => None,
                Some(index) => Some(tabs.remove(index)),
                None => self.tabs.iter().find(|t| t.value == default).cloned(),
            }
        });

        self.tabs = tabs;
        if let Some(default) = displaced_default {
            self.tabs.insert(0, default);
        }
        if self.tabs.len() > self.max_tabs {
            warn!(
                count = self.tabs.len(),
                max = self.max_tabs,
                "too many tabs, keeping the first ones"
            );
            self.tabs.truncate(self.max_tabs);
        }

        if let Some(active) = self.active_tab.as_deref()
            && !self.contains(active)
        {
            self.active_tab = self.fallback_tab();
        }
    }

    /// Select a shown tab. Returns false for a tab that is not shown.
    pub fn set_active_tab(&mut self, value: &str) -> bool {
        if !self.contains(value) {
            warn!(tab = %value, "cannot activate a tab that is not shown");
            return false;
        }
        self.active_tab = Some(value.to_string());
        true
    }

    /// Mark a shown tab as the non-removable fallback
    pub fn set_default_tab(&mut self, value: &str) -> bool {
        if !self.contains(value) {
            warn!(tab = %value, "cannot make a tab that is not shown the default");
            return false;
        }
        self.default_tab = Some(value.to_string());
        true
    }

    /// Show a tab and activate it.
    ///
    /// Adding a shown tab only activates it. Returns false, leaving the store
    /// unchanged, when the store is already at capacity.
    pub fn add_tab(&mut self, tab: ViewTab) -> bool {
        if self.contains(&tab.value) {
            self.active_tab = Some(tab.value);
            return true;
        }

        if self.is_full() {
            warn!(tab = %tab.value, max = self.max_tabs, "tab limit reached, not adding");
            return false;
        }

        self.active_tab = Some(tab.value.clone());
        self.tabs.push(tab);
        true
    }

    /// Close a tab. Protected tabs are left alone.
    ///
    /// Closing the active tab activates the new first tab; closing the last
    /// tab leaves no active tab. Returns whether a tab was removed.
    pub fn remove_tab(&mut self, value: &str) -> bool {
        if self.is_protected(value) || !self.contains(value) {
            return false;
        }

        self.tabs.retain(|t| t.value != value);
        if self.active_tab.as_deref() == Some(value) {
            self.active_tab = self.tabs.first().map(|t| t.value.clone());
        }
        true
    }

    /// Seed an empty store from the catalog's first group and activate the
    /// default. Returns false if the store already had tabs.
    pub fn initialize(&mut self, catalog: &TabCatalog) -> bool {
        if !self.tabs.is_empty() {
            return false;
        }
        let Some(group) = catalog.first_group() else {
            return false;
        };

        self.tabs = group.options.iter().take(self.max_tabs).cloned().collect();

        if let Some(preferred) = self.preferred_default.clone() {
            if !self.contains(&preferred) {
                match catalog.find(&preferred) {
                    Some(tab) => {
                        self.tabs.insert(0, tab.clone());
                        self.tabs.truncate(self.max_tabs);
                    }
                    None => warn!(tab = %preferred, "default tab is not in the catalog"),
                }
            }
            if self.contains(&preferred) {
                self.default_tab = Some(preferred);
            }
        }

        self.active_tab = self.fallback_tab();
        !self.tabs.is_empty()
    }

    fn fallback_tab(&self) -> Option<String> {
        self.default_tab
            .clone()
            .filter(|d| self.contains(d))
            .or_else(|| self.tabs.first().map(|t| t.value.clone()))
    }
}
