//! The lifecycle event bus.
//!
//! Synchronous, ordered, in-process publish/subscribe. Handlers run in
//! registration order and each is awaited before the next is called; the
//! first handler error aborts the emission and propagates to the emitter.
//! There is no replay, no wildcard subscription and no delivery across
//! process restarts.

use crate::Result;
use devws_store::Project;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A named signal emitted at a defined point in a project's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// `project:init`
    Init,
    /// `project:beforeStart`
    BeforeStart,
    /// `project:start`
    Start,
    /// `project:afterStart`
    AfterStart,
    /// `project:rebuild`
    Rebuild,
    /// `project:build`
    Build,
    /// `project:beforeStop`
    BeforeStop,
    /// `project:stop`
    Stop,
}

impl LifecycleEvent {
    /// The wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Init => "project:init",
            LifecycleEvent::BeforeStart => "project:beforeStart",
            LifecycleEvent::Start => "project:start",
            LifecycleEvent::AfterStart => "project:afterStart",
            LifecycleEvent::Rebuild => "project:rebuild",
            LifecycleEvent::Build => "project:build",
            LifecycleEvent::BeforeStop => "project:beforeStop",
            LifecycleEvent::Stop => "project:stop",
        }
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra payload carried alongside the project.
#[derive(Debug, Clone, Copy)]
pub struct EventContext {
    /// The event being emitted
    pub event: LifecycleEvent,
    /// Whether a rebuild was requested (meaningful for `project:rebuild`)
    pub rebuild: bool,
}

/// Future returned by an event handler.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

type Handler =
    Arc<dyn for<'a> Fn(&'a mut Project, &'a EventContext) -> HandlerFuture<'a> + Send + Sync>;

/// Unsubscribe token returned by [`EventBus::on`].
#[derive(Debug, Clone, Copy)]
pub struct Subscription {
    event: LifecycleEvent,
    id: u64,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    handlers: HashMap<LifecycleEvent, Vec<(u64, Handler)>>,
}

/// In-process lifecycle event bus.
#[derive(Default)]
pub struct EventBus {
    state: Mutex<BusState>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event. Handlers for one event run in
    /// registration order and may mutate the project.
    pub fn on<F>(&self, event: LifecycleEvent, handler: F) -> Subscription
    where
        F: for<'a> Fn(&'a mut Project, &'a EventContext) -> HandlerFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        let mut state = self.state.lock().expect("event bus lock poisoned");
        state.next_id += 1;
        let id = state.next_id;
        state
            .handlers
            .entry(event)
            .or_default()
            .push((id, Arc::new(handler)));
        Subscription { event, id }
    }

    /// Remove a previously registered handler. Removing an already removed
    /// subscription is a no-op.
    pub fn off(&self, subscription: Subscription) {
        let mut state = self.state.lock().expect("event bus lock poisoned");
        if let Some(handlers) = state.handlers.get_mut(&subscription.event) {
            handlers.retain(|(id, _)| *id != subscription.id);
        }
    }

    /// Emit an event, awaiting every handler in registration order. Resolves
    /// only after all handlers completed; a handler error halts the
    /// remaining handlers and propagates.
    pub async fn emit(&self, event: LifecycleEvent, project: &mut Project) -> Result<()> {
        self.emit_with(event, project, false).await
    }

    /// [`emit`](Self::emit) carrying the rebuild flag.
    pub async fn emit_with(
        &self,
        event: LifecycleEvent,
        project: &mut Project,
        rebuild: bool,
    ) -> Result<()> {
        // Snapshot the handler list so a handler may subscribe/unsubscribe
        // without deadlocking; this emission sees the registrations that
        // existed when it started.
        let handlers: Vec<Handler> = {
            let state = self.state.lock().expect("event bus lock poisoned");
            state
                .handlers
                .get(&event)
                .map(|hs| hs.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };

        debug!("Emitting {} to {} handler(s)", event, handlers.len());
        let ctx = EventContext { event, rebuild };
        for handler in handlers {
            handler(project, &ctx).await?;
        }
        Ok(())
    }
}
