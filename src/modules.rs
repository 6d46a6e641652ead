//! The business modules of the back office and their list settings.
//!
//! Each module gets the same generic stores; what differs is the backend it
//! lives on, its endpoints, how deletes show up, and the views and filters
//! it offers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ServiceFamily;
use crate::error::{BackofficeError, Result};
use crate::store::{
    DEFAULT_MAX_FILTERS, DeleteMode, EntityConfig, FilterDefinition, FilterStore, TabCatalog,
    TabGroup, ViewTab, ViewTabStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Accounts,
    Contacts,
    Deals,
    Leads,
    Calls,
    Meetings,
    Tasks,
    Vehicles,
    Brands,
    Bookings,
    Affiliates,
    Products,
    Orders,
    Customers,
    Invoices,
    Quotations,
}

type Pairs = &'static [(&'static str, &'static str)];

fn views(pairs: Pairs) -> Vec<ViewTab> {
    pairs
        .iter()
        .map(|(label, value)| ViewTab::new(*label, *value))
        .collect()
}

fn group(label: &str, pairs: Pairs) -> TabGroup {
    TabGroup {
        label: label.to_string(),
        options: views(pairs),
    }
}

impl Module {
    pub const ALL: [Module; 16] = [
        Module::Accounts,
        Module::Contacts,
        Module::Deals,
        Module::Leads,
        Module::Calls,
        Module::Meetings,
        Module::Tasks,
        Module::Vehicles,
        Module::Brands,
        Module::Bookings,
        Module::Affiliates,
        Module::Products,
        Module::Orders,
        Module::Customers,
        Module::Invoices,
        Module::Quotations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Module::Accounts => "accounts",
            Module::Contacts => "contacts",
            Module::Deals => "deals",
            Module::Leads => "leads",
            Module::Calls => "calls",
            Module::Meetings => "meetings",
            Module::Tasks => "tasks",
            Module::Vehicles => "vehicles",
            Module::Brands => "brands",
            Module::Bookings => "bookings",
            Module::Affiliates => "affiliates",
            Module::Products => "products",
            Module::Orders => "orders",
            Module::Customers => "customers",
            Module::Invoices => "invoices",
            Module::Quotations => "quotations",
        }
    }

    /// Which backend serves this module
    pub fn family(self) -> ServiceFamily {
        match self {
            Module::Accounts
            | Module::Contacts
            | Module::Deals
            | Module::Leads
            | Module::Calls
            | Module::Meetings
            | Module::Tasks
            | Module::Invoices
            | Module::Quotations => ServiceFamily::Crm,
            Module::Products | Module::Orders | Module::Customers => ServiceFamily::Ecommerce,
            Module::Vehicles | Module::Brands | Module::Bookings | Module::Affiliates => {
                ServiceFamily::Rental
            }
        }
    }

    /// Path segment of the module's REST resource
    pub fn resource(self) -> &'static str {
        match self {
            Module::Vehicles => "cars",
            other => other.name(),
        }
    }

    /// CRM lists show deleted rows greyed out, so they keep them locally
    pub fn delete_mode(self) -> DeleteMode {
        match self {
            Module::Accounts | Module::Contacts | Module::Deals | Module::Leads => {
                DeleteMode::Soft
            }
            _ => DeleteMode::Hard,
        }
    }

    pub fn max_tabs(self) -> usize {
        match self {
            Module::Accounts | Module::Contacts | Module::Deals | Module::Leads => 6,
            Module::Calls | Module::Meetings | Module::Tasks => 5,
            Module::Products | Module::Orders | Module::Customers => 5,
            _ => 4,
        }
    }

    pub fn max_filters(self) -> usize {
        DEFAULT_MAX_FILTERS
    }

    /// The hardcoded "everything" view that can never be closed
    pub fn sentinel(self) -> &'static str {
        match self {
            Module::Accounts => "all_accounts",
            Module::Contacts => "all_contacts",
            Module::Deals => "all_deals",
            Module::Leads => "all_leads",
            Module::Calls => "all_calls",
            Module::Meetings => "all_meetings",
            Module::Tasks => "all_tasks",
            Module::Vehicles => "all_cars",
            Module::Brands => "all_brands",
            Module::Bookings => "all_bookings",
            Module::Affiliates => "all_affiliates",
            Module::Products => "all_products",
            Module::Orders => "all_orders",
            Module::Customers => "all_customers",
            Module::Invoices => "all_invoices",
            Module::Quotations => "all_quotations",
        }
    }

    /// The view selected on first load
    pub fn default_tab(self) -> &'static str {
        self.sentinel()
    }

    fn default_views(self) -> Pairs {
        match self {
            Module::Accounts => &[
                ("All Accounts", "all_accounts"),
                ("My Accounts", "my_accounts"),
                ("Recently Added", "recently_added"),
                ("Favorites", "favorites"),
            ],
            Module::Contacts => &[
                ("All Contacts", "all_contacts"),
                ("My Contacts", "my_contacts"),
                ("Recently Added", "recently_added"),
                ("Favorites", "favorites"),
            ],
            Module::Deals => &[
                ("All Deals", "all_deals"),
                ("My Deals", "my_deals"),
                ("Open Deals", "open_deals"),
                ("Closing This Month", "closing_this_month"),
            ],
            Module::Leads => &[
                ("All Leads", "all_leads"),
                ("My Leads", "my_leads"),
                ("Unconverted", "unconverted"),
                ("Recently Added", "recently_added"),
            ],
            Module::Calls => &[
                ("All Calls", "all_calls"),
                ("My Calls", "my_calls"),
                ("Scheduled", "scheduled"),
            ],
            Module::Meetings => &[
                ("All Meetings", "all_meetings"),
                ("My Meetings", "my_meetings"),
                ("Today", "today"),
            ],
            Module::Tasks => &[
                ("All Tasks", "all_tasks"),
                ("My Tasks", "my_tasks"),
                ("Overdue", "overdue"),
            ],
            Module::Vehicles => &[
                ("All Cars", "all_cars"),
                ("Available", "available"),
                ("Booked", "booked"),
            ],
            Module::Brands => &[("All Brands", "all_brands"), ("Active", "active")],
            Module::Bookings => &[
                ("All Bookings", "all_bookings"),
                ("Upcoming", "upcoming"),
                ("Ongoing", "ongoing"),
            ],
            Module::Affiliates => &[
                ("All Affiliates", "all_affiliates"),
                ("Active", "active"),
                ("Pending Approval", "pending"),
            ],
            Module::Products => &[
                ("All Products", "all_products"),
                ("In Stock", "in_stock"),
                ("Out of Stock", "out_of_stock"),
            ],
            Module::Orders => &[
                ("All Orders", "all_orders"),
                ("Pending", "pending"),
                ("Shipped", "shipped"),
            ],
            Module::Customers => &[
                ("All Customers", "all_customers"),
                ("Recently Added", "recently_added"),
            ],
            Module::Invoices => &[
                ("All Invoices", "all_invoices"),
                ("Unpaid", "unpaid"),
                ("Paid", "paid"),
            ],
            Module::Quotations => &[
                ("All Quotations", "all_quotations"),
                ("Draft", "draft"),
                ("Sent", "sent"),
            ],
        }
    }

    fn extra_views(self) -> Pairs {
        match self {
            Module::Accounts | Module::Contacts | Module::Leads => &[
                ("Recently Modified", "recently_modified"),
                ("Unassigned", "unassigned"),
                ("Deleted", "deleted"),
            ],
            Module::Deals => &[
                ("Won", "won"),
                ("Lost", "lost"),
                ("Favorites", "favorites"),
                ("Deleted", "deleted"),
            ],
            Module::Calls | Module::Meetings | Module::Tasks => {
                &[("Completed", "completed"), ("Deleted", "deleted")]
            }
            Module::Vehicles => &[("In Maintenance", "maintenance"), ("Deleted", "deleted")],
            Module::Bookings => &[("Completed", "completed"), ("Cancelled", "cancelled")],
            Module::Invoices | Module::Quotations => &[("Overdue", "overdue")],
            _ => &[("Favorites", "favorites"), ("Deleted", "deleted")],
        }
    }

    /// Views offered in the "add view" picker. The first group seeds a
    /// fresh tab store.
    pub fn tab_catalog(self) -> TabCatalog {
        TabCatalog::new(vec![
            group("Default Views", self.default_views()),
            group("More Views", self.extra_views()),
        ])
    }

    fn filter_pairs(self) -> Pairs {
        match self {
            Module::Accounts => &[
                ("Industry", "industry"),
                ("Owner", "owner"),
                ("Type", "type"),
                ("City", "city"),
                ("Created", "created_at"),
                ("Annual Revenue", "annual_revenue"),
            ],
            Module::Contacts => &[
                ("Account", "account"),
                ("Owner", "owner"),
                ("Source", "source"),
                ("City", "city"),
                ("Created", "created_at"),
            ],
            Module::Deals => &[
                ("Stage", "stage"),
                ("Owner", "owner"),
                ("Account", "account"),
                ("Closing Date", "closing_date"),
                ("Amount", "amount"),
                ("Pipeline", "pipeline"),
            ],
            Module::Leads => &[
                ("Status", "status"),
                ("Source", "source"),
                ("Owner", "owner"),
                ("Rating", "rating"),
                ("Created", "created_at"),
            ],
            Module::Calls | Module::Meetings => &[
                ("Owner", "owner"),
                ("Related To", "related_to"),
                ("Date", "date"),
                ("Status", "status"),
            ],
            Module::Tasks => &[
                ("Owner", "owner"),
                ("Priority", "priority"),
                ("Due Date", "due_date"),
                ("Status", "status"),
            ],
            Module::Vehicles => &[
                ("Brand", "brand"),
                ("Category", "category"),
                ("Fuel", "fuel_type"),
                ("Transmission", "transmission"),
                ("Seats", "seats"),
                ("Affiliate", "affiliate"),
            ],
            Module::Brands => &[("Name", "name"), ("Status", "status")],
            Module::Bookings => &[
                ("Vehicle", "vehicle"),
                ("Customer", "customer"),
                ("Pickup Date", "pickup_date"),
                ("Status", "status"),
            ],
            Module::Affiliates => &[("City", "city"), ("Status", "status"), ("Plan", "plan")],
            Module::Products => &[
                ("Category", "category"),
                ("Price", "price"),
                ("Stock", "stock"),
                ("Status", "status"),
            ],
            Module::Orders => &[
                ("Customer", "customer"),
                ("Status", "status"),
                ("Payment", "payment_status"),
                ("Date", "date"),
            ],
            Module::Customers => &[("City", "city"), ("Created", "created_at")],
            Module::Invoices | Module::Quotations => &[
                ("Account", "account"),
                ("Status", "status"),
                ("Issue Date", "issue_date"),
                ("Amount", "amount"),
            ],
        }
    }

    /// Every filter field the module offers
    pub fn filters(self) -> Vec<FilterDefinition> {
        self.filter_pairs()
            .iter()
            .map(|(label, value)| FilterDefinition::new(*label, *value))
            .collect()
    }

    pub fn find_filter(self, key: &str) -> Option<FilterDefinition> {
        self.filters().into_iter().find(|f| f.value == key)
    }

    /// Filters shown before the user picks any
    pub fn default_filters(self) -> Vec<FilterDefinition> {
        self.filters().into_iter().take(2).collect()
    }

    pub fn entity_config(self, page_size: u32) -> EntityConfig {
        EntityConfig::new(self.name(), self.resource())
            .with_delete_mode(self.delete_mode())
            .with_page_size(page_size)
    }

    /// A fresh, uninitialized tab store for this module
    pub fn tab_store(self) -> ViewTabStore {
        ViewTabStore::new(self.max_tabs())
            .with_sentinel(self.sentinel())
            .with_default_tab(self.default_tab())
    }

    pub fn filter_store(self) -> FilterStore {
        FilterStore::new(self.max_filters())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Module {
    type Err = BackofficeError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Module::ALL
            .into_iter()
            .find(|m| m.name() == wanted || (wanted == "cars" && *m == Module::Vehicles))
            .ok_or_else(|| BackofficeError::UnknownModule(s.to_string()))
    }
}
