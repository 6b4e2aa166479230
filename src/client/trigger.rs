//! Action invocation and state transitions.

use std::sync::Arc;

use tracing::Instrument;

use crate::client::api::ApiClient;
use crate::client::catalog::{ActionCatalog, ActionDescriptor, ActionState, ActionTarget};
use crate::client::faults::{self, FaultResult};
use crate::client::interceptor::ErrorInterceptor;

/// Draws the catalog. State is mutated outside the renderer's own loop, so
/// the trigger layer calls `refresh` after every transition.
pub trait Renderer: Send {
    fn refresh(&mut self, catalog: &ActionCatalog);
}

#[derive(Debug, thiserror::Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

pub struct TriggerLayer<R: Renderer> {
    catalog: ActionCatalog,
    api: ApiClient,
    interceptor: Arc<ErrorInterceptor>,
    renderer: R,
}

impl<R: Renderer> TriggerLayer<R> {
    pub fn new(api: ApiClient, interceptor: Arc<ErrorInterceptor>, renderer: R) -> Self {
        Self {
            catalog: ActionCatalog::standard(),
            api,
            interceptor,
            renderer,
        }
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Run one action to completion: idle → loading → success | error.
    pub async fn invoke(&mut self, id: &str) -> Result<&ActionDescriptor, UnknownAction> {
        let target = self
            .catalog
            .get(id)
            .map(ActionDescriptor::target)
            .ok_or_else(|| UnknownAction(id.to_string()))?;

        self.catalog.mark_loading(id);
        self.renderer.refresh(&self.catalog);

        let span = tracing::info_span!("client.action", action.id = %id);
        let (state, summary) = self.run(target).instrument(span).await;

        tracing::debug!(action = %id, %state, %summary, "Action finished");
        self.catalog.mark_finished(id, state, summary);
        self.renderer.refresh(&self.catalog);

        self.catalog.get(id).ok_or_else(|| UnknownAction(id.to_string()))
    }

    async fn run(&self, target: ActionTarget) -> (ActionState, String) {
        match target {
            // Failures of server calls are handled here and never reach the
            // interceptor.
            ActionTarget::Endpoint(path) => match self.api.get(path).await {
                Ok(reply) if reply.status.is_success() => (ActionState::Success, reply.summary()),
                Ok(reply) => (ActionState::Error, reply.summary()),
                Err(e) => (ActionState::Error, format!("{}: {}", e.name(), e)),
            },
            ActionTarget::Fault(fault) => {
                match faults::inject(fault, &self.api, &self.interceptor).await {
                    Ok(result @ FaultResult::Delivered { .. }) => (ActionState::Error, result.summary()),
                    Ok(result) => (ActionState::Success, result.summary()),
                    Err(e) => {
                        self.interceptor.handle_error(&e);
                        (ActionState::Error, format!("{}: {}", e.name(), e))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::reporter::{ErrorEvent, ErrorReporter, ErrorSource};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ErrorEvent>>);

    impl ErrorReporter for Recorder {
        fn report(&self, event: &ErrorEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[derive(Default)]
    struct StateLog(Vec<ActionState>);

    impl Renderer for StateLog {
        fn refresh(&mut self, catalog: &ActionCatalog) {
            if let Some(action) = catalog.iter().find(|a| a.state() != ActionState::Idle) {
                self.0.push(action.state());
            }
        }
    }

    fn layer() -> (Arc<Recorder>, TriggerLayer<StateLog>) {
        let recorder = Arc::new(Recorder::default());
        let interceptor = Arc::new(ErrorInterceptor::new(recorder.clone()));
        let api = ApiClient::new("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
        (recorder, TriggerLayer::new(api, interceptor, StateLog::default()))
    }

    #[tokio::test]
    async fn test_thrown_fault_reaches_interceptor_once() {
        let (recorder, mut layer) = layer();
        let action = layer.invoke("json-parse").await.unwrap();
        assert_eq!(action.state(), ActionState::Error);
        assert!(action.last_response().unwrap().starts_with("SyntaxError"));

        assert_eq!(layer.renderer().0, vec![ActionState::Loading, ActionState::Error]);

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, ErrorSource::UncaughtException);
    }

    #[tokio::test]
    async fn test_panic_fault_reaches_local_interceptor() {
        let (recorder, mut layer) = layer();
        let action = layer.invoke("undefined-access").await.unwrap();
        assert_eq!(action.state(), ActionState::Error);
        assert!(action.last_response().unwrap().starts_with("uncaught-exception captured"));

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].error_type, "Panic");
    }

    #[tokio::test]
    async fn test_server_failure_is_not_reported() {
        let (recorder, mut layer) = layer();
        let action = layer.invoke("health").await.unwrap();
        assert_eq!(action.state(), ActionState::Error);
        assert!(action.last_response().unwrap().starts_with("NetworkError"));
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let (_, mut layer) = layer();
        let err = layer.invoke("no-such-action").await.unwrap_err();
        assert_eq!(err.to_string(), "unknown action 'no-such-action'");
        assert!(layer.renderer().0.is_empty());
    }
}
