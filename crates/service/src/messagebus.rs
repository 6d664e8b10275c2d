//! Message bus dispatching commands and events to their handlers.
//!
//! A single [`MessageBus::handle`] call processes a FIFO queue seeded with
//! one inbound message. Events raised by each successful handler are drained
//! from the unit of work and appended to the back of the queue, so one
//! command can fan out into a cascade of follow-up events.
//!
//! Commands have exactly one handler, run once, and any failure aborts the
//! whole call. Events have zero or more handlers, each retried under the
//! bus's [`RetryPolicy`]; a handler that exhausts its attempts is logged and
//! skipped without affecting its siblings.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use common::BatchRef;
use domain::{Command, CommandKind, Event, EventKind, Message};

use crate::error::{Result, ServiceError};
use crate::retry::RetryPolicy;
use crate::unit_of_work::UnitOfWork;

/// Value returned by a successful command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The order line was allocated to this batch.
    Allocated(BatchRef),

    /// The command completed with nothing to report.
    Completed,
}

impl CommandOutcome {
    /// Returns the batch reference for an allocation outcome.
    pub fn batchref(&self) -> Option<&BatchRef> {
        match self {
            CommandOutcome::Allocated(batchref) => Some(batchref),
            CommandOutcome::Completed => None,
        }
    }
}

/// Handles one kind of command inside a unit of work.
#[async_trait]
pub trait CommandHandler<U: UnitOfWork>: Send + Sync {
    /// Returns the handler name used in logs.
    fn name(&self) -> &'static str;

    /// Handles the command.
    async fn handle(&self, command: &Command, uow: &mut U) -> Result<CommandOutcome>;
}

/// Reacts to one kind of event inside a unit of work.
#[async_trait]
pub trait EventHandler<U: UnitOfWork>: Send + Sync {
    /// Returns the handler name used in logs.
    fn name(&self) -> &'static str;

    /// Handles the event.
    async fn handle(&self, event: &Event, uow: &mut U) -> Result<()>;
}

/// Immutable mapping from message kinds to handlers.
pub struct HandlerRegistry<U: UnitOfWork> {
    commands: HashMap<CommandKind, Arc<dyn CommandHandler<U>>>,
    events: HashMap<EventKind, Vec<Arc<dyn EventHandler<U>>>>,
}

impl<U: UnitOfWork> HandlerRegistry<U> {
    /// Starts building a registry.
    pub fn builder() -> HandlerRegistryBuilder<U> {
        HandlerRegistryBuilder {
            commands: HashMap::new(),
            events: HashMap::new(),
            duplicate: None,
        }
    }

    /// Returns the handler for a command kind.
    pub fn command_handler(&self, kind: CommandKind) -> Option<&Arc<dyn CommandHandler<U>>> {
        self.commands.get(&kind)
    }

    /// Returns the handlers for an event kind, in registration order.
    pub fn event_handlers(&self, kind: EventKind) -> &[Arc<dyn EventHandler<U>>] {
        self.events.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Builder for [`HandlerRegistry`].
pub struct HandlerRegistryBuilder<U: UnitOfWork> {
    commands: HashMap<CommandKind, Arc<dyn CommandHandler<U>>>,
    events: HashMap<EventKind, Vec<Arc<dyn EventHandler<U>>>>,
    duplicate: Option<CommandKind>,
}

impl<U: UnitOfWork> HandlerRegistryBuilder<U> {
    /// Registers the handler for a command kind.
    ///
    /// Registering a second handler for the same kind makes [`build`] fail.
    ///
    /// [`build`]: HandlerRegistryBuilder::build
    pub fn command(mut self, kind: CommandKind, handler: Arc<dyn CommandHandler<U>>) -> Self {
        if self.commands.insert(kind, handler).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(kind);
        }
        self
    }

    /// Appends a handler for an event kind.
    pub fn event(mut self, kind: EventKind, handler: Arc<dyn EventHandler<U>>) -> Self {
        self.events.entry(kind).or_default().push(handler);
        self
    }

    /// Finishes the registry.
    pub fn build(self) -> Result<HandlerRegistry<U>> {
        if let Some(kind) = self.duplicate {
            return Err(ServiceError::DuplicateCommandHandler(kind));
        }
        Ok(HandlerRegistry {
            commands: self.commands,
            events: self.events,
        })
    }
}

/// Dispatches messages to registered handlers.
pub struct MessageBus<U: UnitOfWork> {
    registry: HandlerRegistry<U>,
    retry: RetryPolicy,
}

impl<U: UnitOfWork> MessageBus<U> {
    /// Creates a bus over a finished registry.
    pub fn new(registry: HandlerRegistry<U>, retry: RetryPolicy) -> Self {
        Self { registry, retry }
    }

    /// Handles a message and every event it causes.
    ///
    /// Returns the results of the commands processed, in processing order.
    /// A failing command aborts the call and drops whatever is still queued.
    #[tracing::instrument(
        skip_all,
        fields(message = message.name(), correlation_id = %uuid::Uuid::new_v4())
    )]
    pub async fn handle(&self, message: Message, uow: &mut U) -> Result<Vec<CommandOutcome>> {
        let started = Instant::now();
        let mut queue = VecDeque::from([message]);
        let mut results = Vec::new();

        while let Some(message) = queue.pop_front() {
            metrics::counter!("messagebus_messages_total", "kind" => message.name()).increment(1);
            match message {
                Message::Command(command) => {
                    let outcome = self.handle_command(&command, uow, &mut queue).await?;
                    results.push(outcome);
                }
                Message::Event(event) => {
                    self.handle_event(&event, uow, &mut queue).await;
                }
            }
        }

        metrics::histogram!("messagebus_handle_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(results)
    }

    async fn handle_command(
        &self,
        command: &Command,
        uow: &mut U,
        queue: &mut VecDeque<Message>,
    ) -> Result<CommandOutcome> {
        let kind = command.kind();
        let handler = self
            .registry
            .command_handler(kind)
            .ok_or(ServiceError::NoCommandHandler(kind))?;

        tracing::debug!(command = %kind, handler = handler.name(), "handling command");

        match handler.handle(command, uow).await {
            Ok(outcome) => {
                queue.extend(uow.collect_new_events().into_iter().map(Message::Event));
                uow.rollback().await;
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(command = %kind, handler = handler.name(), error = %e, "command handler failed");
                metrics::counter!("messagebus_command_failures_total").increment(1);
                uow.rollback().await;
                Err(e)
            }
        }
    }

    async fn handle_event(&self, event: &Event, uow: &mut U, queue: &mut VecDeque<Message>) {
        let kind = event.kind();
        let attempts = self.retry.attempts();

        for handler in self.registry.event_handlers(kind) {
            let mut attempt = 1;
            loop {
                tracing::debug!(event = %kind, handler = handler.name(), attempt, "handling event");

                match handler.handle(event, uow).await {
                    Ok(()) => {
                        queue.extend(uow.collect_new_events().into_iter().map(Message::Event));
                        uow.rollback().await;
                        break;
                    }
                    Err(e) => {
                        uow.rollback().await;

                        if attempt >= attempts {
                            tracing::error!(
                                event = %kind,
                                handler = handler.name(),
                                attempts,
                                error = %e,
                                "event handler failed, giving up"
                            );
                            metrics::counter!("messagebus_event_handler_failures_total")
                                .increment(1);
                            break;
                        }

                        let delay = self.retry.delay_after(attempt);
                        tracing::warn!(
                            event = %kind,
                            handler = handler.name(),
                            attempt,
                            ?delay,
                            error = %e,
                            "event handler failed, retrying"
                        );
                        metrics::counter!("messagebus_event_handler_retries_total").increment(1);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                }
            }
        }
    }
}
