//! Trigger layer and global interceptor against a running simulator.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use error_simulator::client::{
    install_global, ActionCatalog, ActionState, ApiClient, ErrorEvent, ErrorInterceptor,
    ErrorReporter, ErrorSource, Renderer, TriggerLayer,
};

use common::{fast_config, TestServer};

#[derive(Default)]
struct Recorder(Mutex<Vec<ErrorEvent>>);

impl ErrorReporter for Recorder {
    fn report(&self, event: &ErrorEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

impl Recorder {
    fn count(&self, source: ErrorSource) -> usize {
        self.0.lock().unwrap().iter().filter(|e| e.source == source).count()
    }
}

#[derive(Default)]
struct Refreshes(usize);

impl Renderer for Refreshes {
    fn refresh(&mut self, _catalog: &ActionCatalog) {
        self.0 += 1;
    }
}

fn api(server: &TestServer) -> ApiClient {
    ApiClient::new(&server.api_url(), Duration::from_secs(10)).unwrap()
}

#[tokio::test]
async fn test_server_actions_record_status_and_trace_id() {
    let server = TestServer::start(fast_config()).await;
    let recorder = Arc::new(Recorder::default());
    let interceptor = Arc::new(ErrorInterceptor::new(recorder.clone()));
    let mut layer = TriggerLayer::new(api(&server), interceptor, Refreshes::default());

    let health = layer.invoke("health").await.unwrap();
    assert_eq!(health.state(), ActionState::Success);
    assert!(health.last_response().unwrap().starts_with("200 healthy (traceId: "));

    let auth = layer.invoke("auth-failure").await.unwrap();
    assert_eq!(auth.state(), ActionState::Error);
    let summary = auth.last_response().unwrap();
    assert!(summary.starts_with("401 Unauthorized (traceId: "), "{}", summary);
    assert!(!summary.contains("traceId: none"));

    let forbidden = layer.invoke("forbidden").await.unwrap();
    assert_eq!(forbidden.state(), ActionState::Error);

    // Two refreshes per invocation: entering loading and finishing.
    assert_eq!(layer.renderer().0, 6);
    // Server failures are handled by the trigger layer.
    assert!(recorder.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_resource_fault_against_server() {
    let server = TestServer::start(fast_config()).await;
    let recorder = Arc::new(Recorder::default());
    let interceptor = Arc::new(ErrorInterceptor::new(recorder.clone()));
    let mut layer = TriggerLayer::new(api(&server), interceptor, Refreshes::default());

    let action = layer.invoke("resource-load").await.unwrap();
    assert_eq!(action.state(), ActionState::Error);
    assert!(action.last_response().unwrap().contains("404"));

    let events = recorder.0.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].error_type, "ImageLoadError");
    assert!(events[0].target.as_deref().unwrap().ends_with("/api/assets/missing-image.png"));
}

#[tokio::test]
async fn test_global_interceptor_reports_each_fault_once() {
    let server = TestServer::start(fast_config()).await;
    let recorder = Arc::new(Recorder::default());

    let interceptor = install_global(recorder.clone());
    let again = install_global(Arc::new(Recorder::default()));
    assert!(Arc::ptr_eq(&interceptor, &again));

    let mut layer = TriggerLayer::new(api(&server), interceptor, Refreshes::default());
    let faults = [
        "undefined-access",
        "promise-rejection",
        "json-parse",
        "network-error",
        "cors-error",
        "resource-load",
    ];
    for id in faults {
        let action = layer.invoke(id).await.unwrap();
        assert_eq!(action.state(), ActionState::Error, "{}", id);
    }
    for id in faults {
        layer.invoke(id).await.unwrap();
    }

    // Panic, json-parse, network-error and cors-error, twice each.
    assert_eq!(recorder.count(ErrorSource::UncaughtException), 8);
    assert_eq!(recorder.count(ErrorSource::UnhandledRejection), 2);
    assert_eq!(recorder.count(ErrorSource::ResourceLoad), 2);

    let panics = recorder
        .0
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.error_type == "Panic")
        .count();
    assert_eq!(panics, 2);
}
