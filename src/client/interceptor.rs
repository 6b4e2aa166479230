//! Global error interceptor.
//!
//! Turns every client failure that escapes component logic into exactly one
//! [`ErrorEvent`]:
//! - `handle_error`: the top-level handler errors are routed to, which
//!   re-surfaces the error on the console after reporting
//! - `on_unhandled_rejection`: failed detached tasks (see `spawn_detached`)
//! - `on_resource_error`: image, script and stylesheet load failures
//! - a panic hook, chained in front of the previous one, for panics nobody
//!   observes; panics raised under `caller_delivers_panic` are left to the
//!   code that joins the failed task
//!
//! The process-wide instance is registered once with [`install_global`].

use std::cell::Cell;
use std::fmt::Display;
use std::future::Future;
use std::panic;
use std::sync::{Arc, OnceLock};

use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::client::api::ClientError;
use crate::client::reporter::{ErrorEvent, ErrorReporter, ErrorSource};

/// Kind of element whose resource failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Script,
    /// `<link rel="stylesheet">`
    Stylesheet,
    Other,
}

impl ResourceKind {
    fn is_tracked(self) -> bool {
        !matches!(self, ResourceKind::Other)
    }
}

/// A resource that failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLoadFailure {
    pub kind: ResourceKind,
    pub url: String,
    pub reason: String,
}

pub struct ErrorInterceptor {
    reporter: Arc<dyn ErrorReporter>,
}

impl ErrorInterceptor {
    pub fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { reporter }
    }

    /// Report an error no component handled, then re-surface it on the
    /// console asynchronously.
    pub fn handle_error(&self, error: &ClientError) {
        self.reporter.report(&ErrorEvent::new(
            ErrorSource::UncaughtException,
            error.name(),
            error.to_string(),
        ));

        let rendered = format!("{}: {}", error.name(), error);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tracing::error!(target: "console", "Uncaught {}", rendered);
                });
            }
            Err(_) => tracing::error!(target: "console", "Uncaught {}", rendered),
        }
    }

    pub fn on_unhandled_rejection(&self, reason: &str) {
        self.reporter.report(&ErrorEvent::new(
            ErrorSource::UnhandledRejection,
            "UnhandledRejection",
            reason,
        ));
    }

    /// Report a resource load failure. Returns `false` when the element kind
    /// is not tracked and nothing was reported.
    pub fn on_resource_error(&self, failure: &ResourceLoadFailure) -> bool {
        if !failure.kind.is_tracked() {
            tracing::debug!(url = %failure.url, "Ignoring load failure of untracked element");
            return false;
        }
        let event = ErrorEvent::new(
            ErrorSource::ResourceLoad,
            format!("{:?}LoadError", failure.kind),
            format!("Failed to load {}: {}", failure.url, failure.reason),
        )
        .with_target(failure.url.clone());
        self.reporter.report(&event);
        true
    }

    pub(crate) fn on_panic(&self, message: String, location: Option<String>) {
        let mut event = ErrorEvent::new(ErrorSource::UncaughtException, "Panic", message);
        if let Some(location) = location {
            event = event.with_target(location);
        }
        self.reporter.report(&event);
    }

    /// Run `future` in the background with nobody awaiting its result; an
    /// `Err` becomes an unhandled rejection. The returned handle only tells
    /// when the task is done.
    pub fn spawn_detached<F, E>(self: &Arc<Self>, future: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display,
    {
        let interceptor = Arc::clone(self);
        tokio::spawn(
            async move {
                if let Err(reason) = future.await {
                    interceptor.on_unhandled_rejection(&reason.to_string());
                }
            }
            .instrument(tracing::Span::current()),
        )
    }
}

static GLOBAL: OnceLock<Arc<ErrorInterceptor>> = OnceLock::new();

thread_local! {
    static CALLER_DELIVERS: Cell<bool> = const { Cell::new(false) };
}

/// Run `work`, telling the panic hook that a panic raised by it is reported
/// by whoever observes the unwind. The hook still prints it.
pub(crate) fn caller_delivers_panic<T>(work: impl FnOnce() -> T) -> T {
    struct Reset;
    impl Drop for Reset {
        // Runs on return and while unwinding, after the hook has looked.
        fn drop(&mut self) {
            CALLER_DELIVERS.with(|flag| flag.set(false));
        }
    }

    CALLER_DELIVERS.with(|flag| flag.set(true));
    let _reset = Reset;
    work()
}

/// Register the process-wide interceptor and its panic hook.
///
/// Only the first call installs anything; later calls return the existing
/// instance and drop `reporter`.
pub fn install_global(reporter: Arc<dyn ErrorReporter>) -> Arc<ErrorInterceptor> {
    let mut installed = false;
    let interceptor = GLOBAL.get_or_init(|| {
        installed = true;
        let interceptor = Arc::new(ErrorInterceptor::new(reporter));
        install_panic_hook(Arc::clone(&interceptor));
        interceptor
    });

    if installed {
        tracing::debug!("Global error interceptor installed");
    } else {
        tracing::debug!("Global error interceptor already installed");
    }
    Arc::clone(interceptor)
}

/// The process-wide interceptor, if installed.
pub fn global() -> Option<Arc<ErrorInterceptor>> {
    GLOBAL.get().cloned()
}

fn install_panic_hook(interceptor: Arc<ErrorInterceptor>) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if CALLER_DELIVERS.with(Cell::get) {
            previous(info);
            return;
        }
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with a non-string payload".to_string());
        interceptor.on_panic(message, info.location().map(ToString::to_string));
        // The previous hook prints the panic, so it still shows on the console.
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ErrorEvent>>);

    impl ErrorReporter for Recorder {
        fn report(&self, event: &ErrorEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    impl Recorder {
        fn sources(&self) -> Vec<ErrorSource> {
            self.0.lock().unwrap().iter().map(|e| e.source).collect()
        }
    }

    fn interceptor() -> (Arc<Recorder>, Arc<ErrorInterceptor>) {
        let recorder = Arc::new(Recorder::default());
        let interceptor = Arc::new(ErrorInterceptor::new(recorder.clone()));
        (recorder, interceptor)
    }

    #[test]
    fn test_resource_filter() {
        let (recorder, interceptor) = interceptor();
        for kind in [
            ResourceKind::Image,
            ResourceKind::Script,
            ResourceKind::Stylesheet,
            ResourceKind::Other,
        ] {
            interceptor.on_resource_error(&ResourceLoadFailure {
                kind,
                url: "http://localhost/missing".into(),
                reason: "404 Not Found".into(),
            });
        }
        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].error_type, "ImageLoadError");
        assert_eq!(events[2].error_type, "StylesheetLoadError");
        assert_eq!(events[0].target.as_deref(), Some("http://localhost/missing"));
    }

    #[tokio::test]
    async fn test_handle_error_reports_once() {
        let (recorder, interceptor) = interceptor();
        let err = ClientError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        interceptor.handle_error(&err);

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, ErrorSource::UncaughtException);
        assert_eq!(events[0].error_type, "SyntaxError");
    }

    #[tokio::test]
    async fn test_detached_failure_becomes_rejection() {
        let (recorder, interceptor) = interceptor();
        interceptor
            .spawn_detached(async { Err::<(), _>("token refresh failed") })
            .await
            .unwrap();
        interceptor
            .spawn_detached(async { Ok::<(), String>(()) })
            .await
            .unwrap();

        assert_eq!(recorder.sources(), vec![ErrorSource::UnhandledRejection]);
        assert_eq!(recorder.0.lock().unwrap()[0].message, "token refresh failed");
    }

    #[tokio::test]
    async fn test_rapid_mixed_events_are_not_dropped_or_duplicated() {
        let (recorder, interceptor) = interceptor();
        let mut handles = Vec::new();
        for i in 0..50 {
            handles.push(interceptor.spawn_detached(async move { Err::<(), _>(format!("rejection {}", i)) }));
            interceptor.on_resource_error(&ResourceLoadFailure {
                kind: ResourceKind::Script,
                url: format!("http://localhost/app-{}.js", i),
                reason: "404 Not Found".into(),
            });
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let sources = recorder.sources();
        assert_eq!(sources.len(), 100);
        assert_eq!(
            sources.iter().filter(|s| **s == ErrorSource::UnhandledRejection).count(),
            50
        );
    }

    #[test]
    fn test_caller_delivery_flag_is_cleared_after_panic() {
        let result = std::panic::catch_unwind(|| {
            caller_delivers_panic(|| -> u32 { panic!("delivered by caller") })
        });
        assert!(result.is_err());
        assert!(!CALLER_DELIVERS.with(Cell::get));

        assert_eq!(caller_delivers_panic(|| 3), 3);
        assert!(!CALLER_DELIVERS.with(Cell::get));
    }
}
