//! Top-level panic handling.
//!
//! The one place an otherwise-unhandled failure is turned into a response.
//! A panic escaping any handler becomes a 500 with the standard envelope;
//! the panic is logged and attached to the active span, and the default
//! panic hook still prints it.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::http::response::ErrorEnvelope;
use crate::observability::metrics;
use crate::simulation::SimulationKind;

/// Where and how the last panic on this thread happened.
#[derive(Debug, Clone)]
struct PanicSite {
    location: Option<String>,
    backtrace: String,
}

thread_local! {
    static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

/// Chain a hook that remembers the panic location and backtrace for
/// [`catch_panic`]. The previous hook still runs. Safe to call repeatedly.
pub fn install_panic_capture() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let site = PanicSite {
                location: info.location().map(ToString::to_string),
                backtrace: Backtrace::force_capture().to_string(),
            };
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(site));
            previous(info);
        }));
    });
}

/// A panic caught on one thread, carried to another to be re-raised.
pub(crate) struct CapturedPanic {
    payload: Box<dyn Any + Send>,
    site: Option<PanicSite>,
}

impl CapturedPanic {
    /// Re-raise on the current thread. `resume_unwind` skips the hook, so the
    /// recorded site is restored here for [`catch_panic`].
    pub(crate) fn resume(self) -> ! {
        LAST_PANIC.with(|slot| *slot.borrow_mut() = self.site);
        panic::resume_unwind(self.payload)
    }
}

/// Run `work`, keeping the site the hook recorded if it panics.
pub(crate) fn capture_panic<T>(work: impl FnOnce() -> T) -> Result<T, CapturedPanic> {
    panic::catch_unwind(AssertUnwindSafe(work)).map_err(|payload| CapturedPanic {
        payload,
        site: LAST_PANIC.with(|slot| slot.borrow_mut().take()),
    })
}

/// Catch a panic unwinding out of the inner service.
pub async fn catch_panic(request: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => panic_response(payload),
    }
}

fn panic_response(payload: Box<dyn Any + Send>) -> Response {
    let message = panic_message(payload.as_ref());
    // Unwinding happens on the panicking thread, so the hook's record is ours.
    let site = LAST_PANIC.with(|slot| slot.borrow_mut().take());
    let location = site.as_ref().and_then(|s| s.location.clone());
    let backtrace = site.map(|s| s.backtrace);

    tracing::error!(
        panic.message = %message,
        panic.location = location.as_deref().unwrap_or("unknown"),
        backtrace = backtrace.as_deref().unwrap_or("unavailable"),
        "Unhandled panic in request handler"
    );

    let span = Span::current();
    span.set_attribute("exception.type", "panic");
    span.set_attribute("exception.message", message.clone());
    if let Some(backtrace) = backtrace {
        span.set_attribute("exception.stacktrace", backtrace);
    }

    let kind = SimulationKind::UnhandledError;
    metrics::record_panic();
    metrics::record_simulation(kind.as_str(), kind.status().as_u16());

    ErrorEnvelope::new(kind.default_label(), message).into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked with a non-string payload".to_string()
    }
}
