//! Client-side fault injection.
//!
//! Each fault reproduces one browser-side failure without the backend
//! being at fault, and lets it escape to the interceptor through the
//! channel a real page would use.

use std::sync::Arc;

use crate::client::api::{ApiClient, ClientError};
use crate::client::interceptor::{
    caller_delivers_panic, ErrorInterceptor, ResourceKind, ResourceLoadFailure,
};
use crate::client::reporter::ErrorSource;

/// Address with nothing listening (the discard port).
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9/unreachable";

/// Foreign origin for the cross-origin fault.
pub const FOREIGN_ORIGIN_URL: &str = "https://cors-blocked.example.com/api/data";

/// Image path under the API base URL that never exists.
pub const MISSING_IMAGE_PATH: &str = "/assets/missing-image.png";

const MALFORMED_JSON: &str = "{ \"order\": 42, \"items\": [ }";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientFault {
    /// Read through a missing value (panics).
    UndefinedAccess,
    /// Fail a task nobody awaits.
    PromiseRejection,
    /// Parse a malformed JSON document.
    JsonParse,
    /// Connect to an address nothing listens on.
    NetworkError,
    /// Request a foreign origin.
    CorsError,
    /// Load an image that does not exist.
    ResourceLoad,
}

/// What an injected fault did, when it did not throw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultResult {
    /// The failure already reached the interceptor through a listener.
    Delivered { source: ErrorSource, message: String },
    /// The environment did not fail as expected (e.g. the image exists).
    NotTriggered(String),
}

impl FaultResult {
    pub fn summary(&self) -> String {
        match self {
            FaultResult::Delivered { source, message } => format!("{} captured: {}", source, message),
            FaultResult::NotTriggered(reason) => format!("fault not triggered: {}", reason),
        }
    }
}

#[derive(Debug)]
struct WidgetSettings {
    theme: String,
}

/// Inject `fault`.
///
/// `Err` is a thrown error nobody caught; the caller routes it to
/// [`ErrorInterceptor::handle_error`].
pub async fn inject(
    fault: ClientFault,
    api: &ApiClient,
    interceptor: &Arc<ErrorInterceptor>,
) -> Result<FaultResult, ClientError> {
    match fault {
        ClientFault::UndefinedAccess => {
            let task = tokio::spawn(async {
                caller_delivers_panic(|| {
                    let settings: Option<WidgetSettings> = None;
                    settings
                        .map(|s| s.theme)
                        .expect("cannot read property 'theme' of undefined settings")
                })
            });
            match task.await {
                Ok(theme) => Ok(FaultResult::NotTriggered(format!("settings present: {}", theme))),
                Err(e) if e.is_panic() => {
                    let message = panic_text(e.into_panic());
                    interceptor.on_panic(message.clone(), None);
                    Ok(FaultResult::Delivered {
                        source: ErrorSource::UncaughtException,
                        message,
                    })
                }
                Err(e) => Ok(FaultResult::NotTriggered(e.to_string())),
            }
        }
        ClientFault::PromiseRejection => {
            let reason = "Simulated rejection: session refresh failed";
            interceptor
                .spawn_detached(async move { Err::<(), _>(reason) })
                .await
                .ok();
            Ok(FaultResult::Delivered {
                source: ErrorSource::UnhandledRejection,
                message: reason.to_string(),
            })
        }
        ClientFault::JsonParse => {
            let value: serde_json::Value = serde_json::from_str(MALFORMED_JSON)?;
            Ok(FaultResult::NotTriggered(format!("parsed {}", value)))
        }
        ClientFault::NetworkError => {
            let response = api.fetch_unguarded(UNREACHABLE_URL).await?;
            Ok(FaultResult::NotTriggered(format!(
                "{} answered {}",
                UNREACHABLE_URL,
                response.status()
            )))
        }
        ClientFault::CorsError => {
            let response = api.fetch(FOREIGN_ORIGIN_URL).await?;
            Ok(FaultResult::NotTriggered(format!(
                "{} answered {}",
                FOREIGN_ORIGIN_URL,
                response.status()
            )))
        }
        ClientFault::ResourceLoad => {
            let url = api.endpoint(MISSING_IMAGE_PATH);
            let reason = match api.fetch(&url).await {
                Ok(response) if response.status().is_success() => {
                    return Ok(FaultResult::NotTriggered(format!("{} loaded", url)));
                }
                Ok(response) => response.status().to_string(),
                Err(e) => e.to_string(),
            };
            let failure = ResourceLoadFailure {
                kind: ResourceKind::Image,
                url,
                reason,
            };
            interceptor.on_resource_error(&failure);
            Ok(FaultResult::Delivered {
                source: ErrorSource::ResourceLoad,
                message: format!("{} ({})", failure.url, failure.reason),
            })
        }
    }
}

fn panic_text(payload: Box<dyn std::any::Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::reporter::{ErrorEvent, ErrorReporter};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ErrorEvent>>);

    impl ErrorReporter for Recorder {
        fn report(&self, event: &ErrorEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn setup() -> (Arc<Recorder>, ApiClient, Arc<ErrorInterceptor>) {
        let recorder = Arc::new(Recorder::default());
        let interceptor = Arc::new(ErrorInterceptor::new(recorder.clone()));
        let api = ApiClient::new("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
        (recorder, api, interceptor)
    }

    #[tokio::test]
    async fn test_thrown_faults_are_left_to_the_caller() {
        let (recorder, api, interceptor) = setup();

        let err = inject(ClientFault::JsonParse, &api, &interceptor).await.unwrap_err();
        assert_eq!(err.name(), "SyntaxError");

        let err = inject(ClientFault::CorsError, &api, &interceptor).await.unwrap_err();
        assert_eq!(err.name(), "CrossOriginBlocked");

        let err = inject(ClientFault::NetworkError, &api, &interceptor).await.unwrap_err();
        assert_eq!(err.name(), "NetworkError");

        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undefined_access_reported_through_given_interceptor() {
        let (recorder, api, interceptor) = setup();
        let result = inject(ClientFault::UndefinedAccess, &api, &interceptor).await.unwrap();
        assert!(matches!(
            result,
            FaultResult::Delivered { source: ErrorSource::UncaughtException, .. }
        ));

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].error_type, "Panic");
        assert!(events[0].message.contains("'theme' of undefined settings"));
    }

    #[tokio::test]
    async fn test_rejection_is_delivered_once() {
        let (recorder, api, interceptor) = setup();
        let result = inject(ClientFault::PromiseRejection, &api, &interceptor).await.unwrap();
        assert!(matches!(
            result,
            FaultResult::Delivered { source: ErrorSource::UnhandledRejection, .. }
        ));
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resource_failure_reported_even_when_server_is_down() {
        let (recorder, api, interceptor) = setup();
        let result = inject(ClientFault::ResourceLoad, &api, &interceptor).await.unwrap();
        assert!(matches!(
            result,
            FaultResult::Delivered { source: ErrorSource::ResourceLoad, .. }
        ));

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].target.as_deref(),
            Some("http://127.0.0.1:1/api/assets/missing-image.png")
        );
    }

    #[test]
    fn test_summary() {
        let delivered = FaultResult::Delivered {
            source: ErrorSource::ResourceLoad,
            message: "img (404 Not Found)".into(),
        };
        assert_eq!(delivered.summary(), "resource-load captured: img (404 Not Found)");
        assert_eq!(
            FaultResult::NotTriggered("loaded".into()).summary(),
            "fault not triggered: loaded"
        );
    }
}
