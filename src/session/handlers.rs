//! Registry of handlers for hub-initiated invocations.
//!
//! Method names are matched case-insensitively. Every handler registered
//! for a name runs, in registration order; one that fails or panics is
//! logged and the rest still run.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::error::Error as StdError;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{trace, warn};

// ============================================================================
// Types
// ============================================================================

/// Error a handler may return.
pub type HandlerError = Box<dyn StdError + Send + Sync>;

/// Outcome of a handler call.
pub type HandlerResult = Result<(), HandlerError>;

/// Callback receiving the argument list of a hub invocation.
pub type InvocationHandler = Arc<dyn Fn(&[Value]) -> HandlerResult + Send + Sync>;

// ============================================================================
// HandlerRegistry
// ============================================================================

/// Lower-cased method name → handlers in registration order.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    handlers: RwLock<FxHashMap<String, Vec<InvocationHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler for `method`.
    pub fn register(&self, method: &str, handler: InvocationHandler) {
        self.handlers
            .write()
            .entry(normalize(method))
            .or_default()
            .push(handler);
    }

    /// Returns the number of handlers registered for `method`.
    #[cfg(test)]
    pub fn count(&self, method: &str) -> usize {
        self.handlers
            .read()
            .get(&normalize(method))
            .map_or(0, Vec::len)
    }

    /// Runs every handler for `target` with `arguments`.
    ///
    /// Handlers are called outside the registry lock, so a handler may
    /// register further handlers. Returns the number of handlers called.
    pub fn dispatch(&self, target: &str, arguments: &[Value]) -> usize {
        let handlers = match self.handlers.read().get(&normalize(target)) {
            Some(handlers) => handlers.clone(),
            None => return 0,
        };

        for handler in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(arguments))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(method = %target, error = %e, ?arguments, "Handler error");
                }
                Err(panic) => {
                    warn!(
                        method = %target,
                        error = %panic_message(panic.as_ref()),
                        ?arguments,
                        "Handler panicked"
                    );
                }
            }
        }

        trace!(method = %target, count = handlers.len(), "Invocation dispatched");
        handlers.len()
    }
}

fn normalize(method: &str) -> String {
    method.to_lowercase()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::json;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> InvocationHandler) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = Arc::clone(&log);
        let make = move |name: &str| -> InvocationHandler {
            let log = Arc::clone(&log_clone);
            let name = name.to_string();
            Arc::new(move |_args: &[Value]| {
                log.lock().push(name.clone());
                Ok(())
            })
        };
        (log, make)
    }

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let registry = HandlerRegistry::new();
        let (log, make) = recorder();
        registry.register("Ping", make("ping"));

        assert_eq!(registry.dispatch("ping", &[]), 1);
        assert_eq!(registry.dispatch("PING", &[]), 1);
        assert_eq!(*log.lock(), ["ping", "ping"]);
    }

    #[test]
    fn test_registrations_accumulate_in_order() {
        let registry = HandlerRegistry::new();
        let (log, make) = recorder();
        registry.register("AttackUpdate", make("first"));
        registry.register("attackupdate", make("second"));

        assert_eq!(registry.count("ATTACKUPDATE"), 2);
        registry.dispatch("AttackUpdate", &[]);
        assert_eq!(*log.lock(), ["first", "second"]);
    }

    #[test]
    fn test_failing_handler_does_not_stop_others() {
        let registry = HandlerRegistry::new();
        let (log, make) = recorder();

        registry.register(
            "x",
            Arc::new(|_: &[Value]| -> HandlerResult { Err("boom".into()) }),
        );
        registry.register(
            "x",
            Arc::new(|_: &[Value]| -> HandlerResult { panic!("handler exploded") }),
        );
        registry.register("x", make("survivor"));

        assert_eq!(registry.dispatch("x", &[json!(1)]), 3);
        assert_eq!(*log.lock(), ["survivor"]);
    }

    #[test]
    fn test_arguments_are_passed_through() {
        let registry = HandlerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        registry.register(
            "ReceiveMessage",
            Arc::new(move |args: &[Value]| {
                seen_clone.lock().extend_from_slice(args);
                Ok(())
            }),
        );
        registry.dispatch("receivemessage", &[json!("hello"), json!(2)]);

        assert_eq!(*seen.lock(), [json!("hello"), json!(2)]);
    }

    #[test]
    fn test_unregistered_target() {
        let registry = HandlerRegistry::new();
        assert_eq!(registry.dispatch("nobody", &[]), 0);
        assert_eq!(registry.count("nobody"), 0);
    }

    #[test]
    fn test_handler_may_register_during_dispatch() {
        let registry = Arc::new(HandlerRegistry::new());
        let registry_clone = Arc::clone(&registry);

        registry.register(
            "bootstrap",
            Arc::new(move |_: &[Value]| {
                registry_clone.register("late", Arc::new(|_: &[Value]| Ok(())));
                Ok(())
            }),
        );
        registry.dispatch("bootstrap", &[]);

        assert_eq!(registry.count("late"), 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }
}
