//! Registry + session + record store over real HTTP.

mod common;

use std::sync::Arc;
use std::time::Duration;

use backoffice::store::RecordEvent;
use backoffice::{
    FetchOutcome, FilterValue, HttpTransport, ListSession, Module, Record, RecordId,
    RecordingNotifier, SelectOption, ServiceFamily, StoreRegistry, ToastLevel,
};
use common::MockBackend;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

struct Harness {
    backend: MockBackend,
    registry: StoreRegistry,
    notifier: RecordingNotifier,
}

async fn harness() -> Harness {
    let backend = MockBackend::start().await;
    let notifier = RecordingNotifier::new();
    let mut registry = StoreRegistry::new(Arc::new(notifier.clone()), 10);
    for family in ServiceFamily::ALL {
        let transport = HttpTransport::new(&backend.base_url, None, Duration::from_secs(5)).unwrap();
        registry = registry.with_transport(family, Arc::new(transport));
    }
    Harness {
        backend,
        registry,
        notifier,
    }
}

impl Harness {
    fn session(&self, module: Module) -> ListSession {
        let session = ListSession::new(self.registry.stores(module).unwrap());
        session.mount();
        session
    }
}

fn cars(count: i64) -> Value {
    Value::Array(
        (1..=count)
            .map(|id| {
                json!({
                    "id": id,
                    "plate": format!("CAR-{id:03}"),
                    "fuel_type": if id % 2 == 0 { "ev" } else { "petrol" },
                    "brand_details": {"name": "Volvo"}
                })
            })
            .collect(),
    )
}

fn ids(session: &ListSession) -> Vec<RecordId> {
    session
        .stores()
        .records
        .records()
        .iter()
        .filter_map(Record::id)
        .collect()
}

#[tokio::test]
async fn paginates_through_backend() {
    let h = harness().await;
    h.backend.seed("cars", cars(25));
    let session = h.session(Module::Vehicles);

    assert_eq!(session.refresh().await, FetchOutcome::Applied { count: 10 });
    assert_eq!(session.go_to_page(3).await, FetchOutcome::Applied { count: 5 });

    let state = session.stores().records.snapshot();
    assert_eq!((state.page, state.pages, state.limit), (3, 3, 10));
    assert_eq!(state.total, Some(25));
    assert_eq!(state.records[0].id(), Some(RecordId::Int(21)));
    assert_eq!(
        state.records[0].get("brand_details"),
        Some(&json!({"name": "Volvo"}))
    );
    assert_eq!(
        h.backend.last_request().body,
        json!({"page": 3, "limit": 10, "view": "all_cars"})
    );
}

#[tokio::test]
async fn filters_and_view_shape_the_request() {
    let h = harness().await;
    h.backend.seed("cars", cars(6));
    let session = h.session(Module::Vehicles);
    session.go_to_page(2).await;

    assert!(session.apply_filter("fuel_type", SelectOption::new("EV", "ev").into()));
    assert_eq!(session.stores().records.page(), 1);
    assert_eq!(session.refresh().await, FetchOutcome::Applied { count: 3 });
    assert_eq!(ids(&session), vec![RecordId::Int(2), RecordId::Int(4), RecordId::Int(6)]);
    assert_eq!(
        h.backend.last_request().body,
        json!({"page": 1, "limit": 10, "fuel_type": "ev", "view": "all_cars"})
    );

    session.clear_filters();
    assert!(session.apply_filter(
        "fuel_type",
        FilterValue::Choices(vec![SelectOption::new("Petrol", "petrol")])
    ));
    assert_eq!(session.refresh().await, FetchOutcome::Applied { count: 3 });
    assert_eq!(h.backend.last_request().body["fuel_type"], json!(["petrol"]));
}

#[tokio::test]
async fn sessions_share_the_registry_stores() {
    let h = harness().await;
    h.backend.seed("cars", cars(3));
    let first = h.session(Module::Vehicles);
    first.refresh().await;

    let second = h.session(Module::Vehicles);
    assert!(Arc::ptr_eq(first.stores(), second.stores()));
    assert_eq!(second.stores().records.len(), 3);
    assert!(!Arc::ptr_eq(first.stores(), &h.registry.stores(Module::Bookings).unwrap()));
}

#[tokio::test]
async fn unreachable_backend_reports_load_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let notifier = RecordingNotifier::new();
    let transport =
        HttpTransport::new(&format!("http://{addr}"), None, Duration::from_secs(2)).unwrap();
    let registry = StoreRegistry::new(Arc::new(notifier.clone()), 10)
        .with_transport(ServiceFamily::Rental, Arc::new(transport));
    let session = ListSession::new(registry.stores(Module::Bookings).unwrap());
    session.mount();

    let FetchOutcome::Failed { message } = session.refresh().await else {
        panic!("fetch against a closed port should fail");
    };
    assert!(message.starts_with("Failed to load bookings"));
    assert!(!session.stores().records.is_loading());
    assert_eq!(session.stores().records.error(), Some(message.clone()));
    assert_eq!(notifier.messages(ToastLevel::Error), vec![message]);
}

#[tokio::test]
async fn unauthorized_fetch_sets_error_and_toasts() {
    let backend = MockBackend::start_with_token("right").await;
    backend.seed("deals", json!([{"id": 1}]));
    let notifier = RecordingNotifier::new();
    let transport = HttpTransport::new(&backend.base_url, Some("wrong".into()), Duration::from_secs(5)).unwrap();
    let registry = StoreRegistry::new(Arc::new(notifier.clone()), 10)
        .with_transport(ServiceFamily::Crm, Arc::new(transport));
    let session = ListSession::new(registry.stores(Module::Deals).unwrap());
    session.mount();

    let outcome = session.refresh().await;

    assert_eq!(
        outcome,
        FetchOutcome::Failed {
            message: "Unauthorized".into()
        }
    );
    assert!(session.stores().records.is_empty());
    assert_eq!(session.stores().records.error().as_deref(), Some("Unauthorized"));
    assert_eq!(notifier.messages(ToastLevel::Error), vec!["Unauthorized".to_string()]);
}

#[tokio::test]
async fn soft_delete_and_restore_round_trip() {
    let h = harness().await;
    h.backend.seed("leads", json!([{"id": 1, "name": "Ada"}, {"id": 2, "name": "Grace"}]));
    let session = h.session(Module::Leads);
    session.refresh().await;

    assert!(session.delete(&RecordId::Int(2)).await);
    assert_eq!(session.stores().records.len(), 2);
    assert!(session.stores().records.get_record(&RecordId::Int(2)).unwrap().is_deleted());
    assert_eq!(h.backend.records("leads")[1]["deleted"], json!(1));

    assert!(session.restore(&RecordId::Int(2)).await);
    assert!(!session.stores().records.get_record(&RecordId::Int(2)).unwrap().is_deleted());
    assert_eq!(
        h.notifier.messages(ToastLevel::Success),
        vec!["Deleted successfully".to_string(), "Restored successfully".to_string()]
    );
}

#[tokio::test]
async fn hard_delete_then_restore_from_deleted_view() {
    let h = harness().await;
    h.backend.seed("cars", cars(3));
    let session = h.session(Module::Vehicles);
    session.refresh().await;

    assert!(session.delete(&RecordId::Int(2)).await);
    assert_eq!(ids(&session), vec![RecordId::Int(1), RecordId::Int(3)]);

    assert_eq!(
        session.change_tab("deleted").await,
        Some(FetchOutcome::Applied { count: 1 })
    );
    assert!(session.restore(&RecordId::Int(2)).await);
    assert!(session.stores().records.is_empty());

    session.change_tab("all_cars").await;
    assert_eq!(session.stores().records.len(), 3);
}

#[tokio::test]
async fn rejected_delete_leaves_store_unchanged() {
    let h = harness().await;
    h.backend.seed("cars", cars(2));
    let session = h.session(Module::Vehicles);
    session.refresh().await;
    let before = session.stores().records.records();

    // The backend no longer knows the record
    h.backend.seed("cars", json!([]));
    assert!(!session.delete(&RecordId::Int(1)).await);

    assert_eq!(session.stores().records.records(), before);
    assert_eq!(
        h.notifier.messages(ToastLevel::Error),
        vec!["cars 1 not found".to_string()]
    );
}

#[tokio::test]
async fn create_update_favorite_and_status() {
    let h = harness().await;
    h.backend.seed("products", json!([{"id": 7, "name": "Mug", "status": 1, "favorite": false}]));
    let session = h.session(Module::Products);
    session.refresh().await;

    let mut fields = Map::new();
    fields.insert("name".into(), json!("Teapot"));
    let created = session.create(fields).await.unwrap();
    assert_eq!(created.id(), Some(RecordId::Int(1001)));
    assert_eq!(ids(&session), vec![RecordId::Int(1001), RecordId::Int(7)]);

    let mut changes = Record::default();
    changes.set("id", json!(7));
    changes.set("name", json!("Big Mug"));
    assert!(session.update(changes).await);

    let id = RecordId::Int(7);
    assert!(session.favorite(&id).await);
    assert!(session.toggle_status(&id, "status").await);

    let mug = session.stores().records.get_record(&id).unwrap();
    assert_eq!(mug.get("name"), Some(&json!("Big Mug")));
    assert!(mug.is_favorite());
    assert_eq!(mug.get("status"), Some(&json!(0)));

    let server = &h.backend.records("products")[0];
    assert_eq!(server["name"], json!("Big Mug"));
    assert_eq!(server["favorite"], json!(true));
    assert_eq!(server["status"], json!(0));
}

#[tokio::test]
async fn subscribers_see_every_transition() {
    let h = harness().await;
    h.backend.seed("cars", cars(1));
    let session = h.session(Module::Vehicles);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    session
        .stores()
        .records
        .subscribe(move |event| sink.lock().push(event.clone()));

    session.refresh().await;
    assert!(session.favorite(&RecordId::Int(1)).await);

    assert_eq!(
        *events.lock(),
        vec![
            RecordEvent::FetchStarted,
            RecordEvent::FetchApplied { count: 1 },
            RecordEvent::RecordsChanged,
        ]
    );
}
