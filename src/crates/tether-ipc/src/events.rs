//! Wire model for graph execution event streams
//!
//! The engine emits a sequence of events while a graph runs. Each frame is a
//! JSON object whose `event` field names what happened; the reserved name
//! `on_custom_event` marks user-emitted events, every other name belongs to
//! the engine's own vocabulary, including names this crate has never seen.

use crate::error::Result;
use futures::Stream;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Event name reserved for user-emitted custom events
pub const CUSTOM_EVENT: &str = "on_custom_event";

/// Wire protocol versions for the event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamProtocolVersion {
    V1,
    V2,
}

impl StreamProtocolVersion {
    /// The only version this bridge speaks
    pub const SUPPORTED: StreamProtocolVersion = StreamProtocolVersion::V2;
}

impl Default for StreamProtocolVersion {
    fn default() -> Self {
        StreamProtocolVersion::V2
    }
}

impl fmt::Display for StreamProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamProtocolVersion::V1 => write!(f, "v1"),
            StreamProtocolVersion::V2 => write!(f, "v2"),
        }
    }
}

/// An event from the engine's own vocabulary
///
/// `data` is opaque engine JSON. Fields beyond the envelope (tags, metadata,
/// parent run ids, anything a newer engine adds) ride along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardStreamEvent {
    /// Engine event name, e.g. `on_chain_start`
    pub event: String,

    /// Event payload
    #[serde(default)]
    pub data: serde_json::Value,

    /// Run this event belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Name of the node or runnable that produced the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Envelope fields this crate does not model
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A user-emitted custom event
///
/// Carried under the reserved `on_custom_event` name; `name` is the
/// user-chosen event name and `data` the user's payload, passed through
/// unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomStreamEvent {
    /// Always [`CUSTOM_EVENT`]
    pub event: String,

    /// User payload
    pub data: serde_json::Value,

    /// Run this event belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// User-chosen event name
    pub name: String,

    /// Envelope fields this crate does not model
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A single event on a graph execution stream
///
/// Discriminated on the `event` field: the reserved custom name selects
/// [`CustomStreamEvent`], every other name decodes as
/// [`StandardStreamEvent`] so unknown engine vocabulary keeps flowing.
/// A frame without an `event` field, or one whose body does not fit its
/// variant, is a decode error rather than a silent default.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Custom(CustomStreamEvent),
    Standard(StandardStreamEvent),
}

impl StreamEvent {
    /// The event name
    pub fn event(&self) -> &str {
        match self {
            StreamEvent::Custom(event) => &event.event,
            StreamEvent::Standard(event) => &event.event,
        }
    }

    /// The run id, when present
    pub fn run_id(&self) -> Option<&str> {
        match self {
            StreamEvent::Custom(event) => event.run_id.as_deref(),
            StreamEvent::Standard(event) => event.run_id.as_deref(),
        }
    }

    /// The node or custom event name, when present
    pub fn name(&self) -> Option<&str> {
        match self {
            StreamEvent::Custom(event) => Some(&event.name),
            StreamEvent::Standard(event) => event.name.as_deref(),
        }
    }

    /// The event payload
    pub fn data(&self) -> &serde_json::Value {
        match self {
            StreamEvent::Custom(event) => &event.data,
            StreamEvent::Standard(event) => &event.data,
        }
    }
}

impl<'de> Deserialize<'de> for StreamEvent {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let event = match value.get("event").and_then(serde_json::Value::as_str) {
            Some(event) => event.to_string(),
            None => return Err(D::Error::missing_field("event")),
        };

        if event == CUSTOM_EVENT {
            serde_json::from_value(value)
                .map(StreamEvent::Custom)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(StreamEvent::Standard)
                .map_err(D::Error::custom)
        }
    }
}

/// Lazy, in-order sequence of stream events
///
/// Items arrive as the engine produces them. The first error is terminal for
/// this stream: after yielding it the stream ends, and later polls return
/// `None`. Dropping the stream closes the underlying connection.
pub struct EventStream {
    inner: Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>,
    terminated: bool,
}

impl EventStream {
    /// Wrap a raw event stream
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<StreamEvent>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            terminated: false,
        }
    }
}

impl Stream for EventStream {
    type Item = Result<StreamEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Err(err))) => {
                this.terminated = true;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.terminated = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("terminated", &self.terminated)
            .finish()
    }
}
