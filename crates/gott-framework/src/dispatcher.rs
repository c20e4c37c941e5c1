//! Update dispatcher.
//!
//! The [`Dispatcher`] owns handler groups keyed by an `i32` group number.
//! Every update walks the groups in ascending order and, inside a group, the
//! handlers in registration order. What happens after a handler ran depends
//! on its [`Outcome`](crate::Outcome):
//!
//! ```text
//! group 0: [auth_gate] ──ContinueGroup──▶ [next handler in group 0]
//!              │
//!              └──Handled / SkipGroup──▶ group 1: [...]
//!              └──EndGroups────────────▶ done
//! ```
//!
//! Groups let independent concerns (logging, auth gating, business logic)
//! be layered with a predictable priority.
//!
//! # Concurrency
//!
//! Handlers may be registered or removed while [`Dispatcher::run`] is active.
//! Each update walks a snapshot of the registry taken when its dispatch
//! starts, so registration never mutates a sequence under iteration and
//! takes effect from the next update.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Instrument, debug, debug_span, error, info, trace};

use gott_core::{BoxedBot, Context, Update, UpdateReceiver};

use crate::handler::{BoxedHandler, Handler, HandlerId, Outcome};

/// Callback invoked when a handler returns an error.
pub type ErrorHandler = Arc<dyn Fn(&BoxedBot, &Update, &anyhow::Error) + Send + Sync>;

/// Routes updates through ordered handler groups.
#[derive(Default)]
pub struct Dispatcher {
    groups: RwLock<BTreeMap<i32, Vec<BoxedHandler>>>,
    error_handler: RwLock<Option<ErrorHandler>>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the error callback (builder pattern).
    pub fn with_error_handler<F>(self, f: F) -> Self
    where
        F: Fn(&BoxedBot, &Update, &anyhow::Error) + Send + Sync + 'static,
    {
        self.set_error_handler(f);
        self
    }

    /// Sets the error callback. Without one, handler errors are logged.
    pub fn set_error_handler<F>(&self, f: F)
    where
        F: Fn(&BoxedBot, &Update, &anyhow::Error) + Send + Sync + 'static,
    {
        *self.error_handler.write() = Some(Arc::new(f));
    }

    // ─── Registration ─────────────────────────────────────────────────────────

    /// Appends a handler to `group`, creating the group if needed.
    ///
    /// Identifiers are not checked for duplicates.
    pub fn add_handler_to_group(&self, group: i32, handler: impl Handler) -> HandlerId {
        self.add_boxed_to_group(group, Arc::new(handler))
    }

    /// Appends an already shared handler to `group`.
    pub fn add_boxed_to_group(&self, group: i32, handler: BoxedHandler) -> HandlerId {
        let id = handler.id();
        self.groups.write().entry(group).or_default().push(handler);
        debug!(group, handler_id = %id, "Handler registered");
        id
    }

    /// Appends a handler to group 0.
    pub fn add_handler(&self, handler: impl Handler) -> HandlerId {
        self.add_handler_to_group(0, handler)
    }

    /// Removes the first handler with the given identifier, scanning groups
    /// in ascending order.
    ///
    /// The group itself stays registered even when it becomes empty.
    pub fn remove_handler(&self, id: &HandlerId) -> bool {
        let mut groups = self.groups.write();
        for (group, handlers) in groups.iter_mut() {
            if let Some(pos) = handlers.iter().position(|h| &h.id() == id) {
                handlers.remove(pos);
                debug!(group = *group, handler_id = %id, "Handler removed");
                return true;
            }
        }
        false
    }

    /// Removes a whole group. Returns `false` if it did not exist.
    pub fn remove_group(&self, group: i32) -> bool {
        let removed = self.groups.write().remove(&group).is_some();
        if removed {
            debug!(group, "Handler group removed");
        }
        removed
    }

    /// Returns the registered group numbers in ascending order.
    pub fn group_numbers(&self) -> Vec<i32> {
        self.groups.read().keys().copied().collect()
    }

    /// Returns the total number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.groups.read().values().map(Vec::len).sum()
    }

    // ─── Dispatch ─────────────────────────────────────────────────────────────

    /// Runs one update through the handler groups.
    ///
    /// Returns the number of handlers invoked.
    pub async fn process_update(&self, bot: &BoxedBot, update: Update) -> usize {
        let span = debug_span!("dispatch", update_type = %update.update_type());
        self.walk_groups(bot, update).instrument(span).await
    }

    async fn walk_groups(&self, bot: &BoxedBot, update: Update) -> usize {
        let snapshot: Vec<(i32, Vec<BoxedHandler>)> = self
            .groups
            .read()
            .iter()
            .map(|(group, handlers)| (*group, handlers.clone()))
            .collect();

        let ctx = Arc::new(Context::new(update));
        let mut invoked = 0;

        'groups: for (group, handlers) in snapshot {
            for handler in handlers {
                if !handler.check_update(ctx.update()) {
                    continue;
                }

                invoked += 1;
                let result = handler.handle_update(Arc::clone(bot), Arc::clone(&ctx)).await;
                trace!(group, handler_id = %handler.id(), ?result, "Handler finished");

                match result {
                    Ok(Outcome::Handled | Outcome::SkipGroup) => continue 'groups,
                    Ok(Outcome::EndGroups) => {
                        debug!(group, "Dispatch ended by handler");
                        break 'groups;
                    }
                    Ok(Outcome::ContinueGroup) => {}
                    Err(err) => self.report_error(bot, ctx.update(), group, &handler, &err),
                }
            }
        }

        invoked
    }

    fn report_error(
        &self,
        bot: &BoxedBot,
        update: &Update,
        group: i32,
        handler: &BoxedHandler,
        err: &anyhow::Error,
    ) {
        let callback = self.error_handler.read().clone();
        match callback {
            Some(callback) => callback(bot, update, err),
            None => error!(
                group,
                handler_id = %handler.id(),
                update_type = %update.update_type(),
                "Handler failed: {err:#}"
            ),
        }
    }

    /// Consumes updates one at a time until the channel closes.
    pub async fn run(&self, bot: BoxedBot, mut updates: UpdateReceiver) {
        info!(bot_id = bot.id(), "Dispatcher started");
        while let Some(update) = updates.recv().await {
            self.process_update(&bot, update).await;
        }
        info!(bot_id = bot.id(), "Update channel closed, dispatcher stopped");
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("groups", &self.group_numbers())
            .field("handler_count", &self.handler_count())
            .finish()
    }
}
