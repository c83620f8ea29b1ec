//! Inbound user events delivered by the dispatcher.

use bytes::Bytes;

/// A photo attached to an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Raw encoded image bytes as received.
    pub bytes: Bytes,
    /// File extension reported by the transport (e.g. `jpg`), if any.
    pub format_hint: Option<String>,
}

impl Photo {
    /// Wrap raw bytes with an optional extension hint.
    pub fn new(bytes: impl Into<Bytes>, format_hint: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            format_hint,
        }
    }
}

/// Payload of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A menu label or free text.
    Text(String),
    /// An uploaded photo.
    Photo(Photo),
}

impl EventKind {
    /// Short name used in log fields.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Photo(_) => "photo",
        }
    }
}

/// One user event routed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Stable external user identifier.
    pub user_id: String,
    /// Event payload.
    pub kind: EventKind,
}

impl InboundEvent {
    /// Build a text event.
    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            kind: EventKind::Text(text.into()),
        }
    }

    /// Build a photo event.
    pub fn photo(user_id: impl Into<String>, photo: Photo) -> Self {
        Self {
            user_id: user_id.into(),
            kind: EventKind::Photo(photo),
        }
    }
}
