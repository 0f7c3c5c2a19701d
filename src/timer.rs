//! Single-slot deferred action.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Identifies one arming of a [`Timer`]. Tickets from cancelled or replaced
/// arms are rejected by [`Timer::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket(u64);

/// Owns at most one pending deferred action.
///
/// Arming always cancels the previous action first. A spawned task may have
/// already woken when it is cancelled, so it must [`claim`](Timer::claim) its
/// ticket under the owner's lock before doing anything.
pub(crate) struct Timer {
    runtime: Handle,
    pending: Option<AbortHandle>,
    generation: u64,
}

impl Timer {
    pub(crate) fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            pending: None,
            generation: 0,
        }
    }

    /// Cancels the pending action, if any, and invalidates outstanding tickets.
    pub(crate) fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
            tracing::trace!(generation = self.generation, "Timer cancelled");
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Runs `fire` after `delay`, replacing any pending action.
    pub(crate) fn schedule<F>(&mut self, delay: Duration, fire: F)
    where
        F: FnOnce(Ticket) + Send + 'static,
    {
        self.cancel();

        let ticket = Ticket(self.generation);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            fire(ticket);
        });
        self.pending = Some(task.abort_handle());

        tracing::trace!(generation = ticket.0, ?delay, "Timer armed");
    }

    /// Consumes `ticket` if it belongs to the current arm.
    pub(crate) fn claim(&mut self, ticket: Ticket) -> bool {
        if self.pending.is_some() && ticket.0 == self.generation {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub(crate) fn current_ticket(&self) -> Ticket {
        Ticket(self.generation)
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
