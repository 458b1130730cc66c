//! Per-thread context dictionary
//!
//! Each thread owns one flat dictionary whose entries are added to every
//! structured event logged from that thread. Worker threads typically reset
//! it at the start of a request with [`request_scope`] and bind
//! request-specific values while handling it.

use std::cell::RefCell;

use serde_json::Value;

use crate::logger::Fields;

thread_local! {
    static THREAD_CONTEXT: RefCell<Fields> = RefCell::new(Fields::new());
}

/// Snapshot of this thread's context dictionary
pub fn current_context() -> Fields {
    THREAD_CONTEXT.with(|context| context.borrow().clone())
}

pub fn bind<K, V>(key: K, value: V)
where
    K: Into<String>,
    V: Into<Value>,
{
    THREAD_CONTEXT.with(|context| {
        context.borrow_mut().insert(key.into(), value.into());
    });
}

/// Bind every entry of `values`; existing keys keep their position.
pub fn bind_values(values: Fields) {
    THREAD_CONTEXT.with(|context| context.borrow_mut().extend(values));
}

pub fn unbind(key: &str) -> Option<Value> {
    THREAD_CONTEXT.with(|context| context.borrow_mut().shift_remove(key))
}

/// Replace the whole dictionary, returning the previous one.
pub fn new_context(values: Fields) -> Fields {
    THREAD_CONTEXT.with(|context| context.replace(values))
}

pub fn clear_context() {
    new_context(Fields::new());
}

/// Restores the dictionary that was active before [`request_scope`].
#[must_use = "the previous context is restored when the scope is dropped"]
pub struct RequestScope {
    previous: Option<Fields>,
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            new_context(previous);
        }
    }
}

/// Start a fresh dictionary holding only `values` until the scope drops.
///
/// Values bound while the scope is alive are discarded with it.
///
/// ```
/// use structlog_logging::context;
/// use structlog_logging::fields;
///
/// let _request = context::request_scope(fields! { "request_id" => "abc123" });
/// context::bind("user", "alice");
/// assert_eq!(context::current_context().len(), 2);
/// ```
pub fn request_scope(values: Fields) -> RequestScope {
    RequestScope {
        previous: Some(new_context(values)),
    }
}
