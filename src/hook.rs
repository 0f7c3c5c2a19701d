//! Hook registry for the guarded call and trip notifications.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::breaker::Breaker;

/// Hook that performs the guarded operation.
pub type CallHook<E> = Arc<dyn Fn(&Breaker<E>) + Send + Sync + 'static>;

/// Hook notified when the breaker trips, with the most recent failure's error.
pub type TripHook<E> = Arc<dyn Fn(&Breaker<E>, Option<&E>) + Send + Sync + 'static>;

/// A registry for circuit breaker hooks.
///
/// Hooks are cloned out of the registry before they run, so a hook may
/// replace hooks or re-enter the breaker freely. Unset hooks are no-ops.
pub struct HookRegistry<E> {
    on_call: RwLock<Option<CallHook<E>>>,
    on_trip: RwLock<Option<TripHook<E>>>,
}

impl<E> Default for HookRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> HookRegistry<E> {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self {
            on_call: RwLock::new(None),
            on_trip: RwLock::new(None),
        }
    }

    /// Sets the hook that performs the guarded operation.
    ///
    /// The hook must eventually call [`Breaker::success`] or
    /// [`Breaker::failure`] exactly once per invocation. If it never does,
    /// the call timeout reports the failure instead. The timeout is armed
    /// before the hook runs, so reporting from inside the hook is safe.
    pub fn set_on_call<F>(&self, f: F)
    where
        F: Fn(&Breaker<E>) + Send + Sync + 'static,
    {
        *self.on_call.write() = Some(Arc::new(f));
    }

    /// Sets the hook to call when the breaker trips.
    pub fn set_on_trip<F>(&self, f: F)
    where
        F: Fn(&Breaker<E>, Option<&E>) + Send + Sync + 'static,
    {
        *self.on_trip.write() = Some(Arc::new(f));
    }

    /// Removes both hooks.
    pub fn clear(&self) {
        *self.on_call.write() = None;
        *self.on_trip.write() = None;
    }

    pub(crate) fn execute_call_hook(&self, breaker: &Breaker<E>) {
        let hook = self.on_call.read().clone();
        if let Some(hook) = hook {
            hook(breaker);
        }
    }

    pub(crate) fn execute_trip_hook(&self, breaker: &Breaker<E>, error: Option<&E>) {
        let hook = self.on_trip.read().clone();
        if let Some(hook) = hook {
            hook(breaker, error);
        }
    }
}
