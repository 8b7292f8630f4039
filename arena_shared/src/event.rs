//! Event dispatch table.
//!
//! Maps an event name to exactly one handler. Handlers take the owner's
//! context and a typed payload; the raw JSON is validated against the
//! handler's payload type here, at the boundary, so handlers never see a
//! malformed message.
//! - Client: inbound server events -> session context.
//! - Tests: drive handlers directly without a live channel.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use tracing::trace;

use crate::net::Envelope;

/// Dispatch failures. None of these are fatal to the owner.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("handler for '{0}' already registered")]
    DuplicateHandler(String),
    #[error("no handler for '{0}'")]
    Unhandled(String),
    #[error("invalid '{event}' payload: {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

type BoxedHandler<C> = Box<dyn Fn(&mut C, Value) -> Result<(), serde_json::Error> + Send + Sync>;

/// Name -> handler table, built once and then only read.
pub struct EventTable<C> {
    handlers: HashMap<&'static str, BoxedHandler<C>>,
}

impl<C> Default for EventTable<C> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<C> EventTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `event`. A name can only be bound once.
    pub fn on<P, F>(&mut self, event: &'static str, handler: F) -> Result<(), DispatchError>
    where
        C: 'static,
        P: DeserializeOwned + 'static,
        F: Fn(&mut C, P) + Send + Sync + 'static,
    {
        if self.handlers.contains_key(event) {
            return Err(DispatchError::DuplicateHandler(event.to_string()));
        }
        self.handlers.insert(
            event,
            Box::new(move |ctx: &mut C, data: Value| -> Result<(), serde_json::Error> {
                let payload = serde_json::from_value::<P>(data)?;
                handler(ctx, payload);
                Ok(())
            }),
        );
        Ok(())
    }

    /// Validates and routes one envelope.
    pub fn dispatch(&self, ctx: &mut C, envelope: Envelope) -> Result<(), DispatchError> {
        let Envelope { event, data } = envelope;
        let Some(handler) = self.handlers.get(event.as_str()) else {
            return Err(DispatchError::Unhandled(event));
        };
        trace!(event = %event, "dispatch");
        handler(ctx, data).map_err(|source| DispatchError::InvalidPayload { event, source })
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
