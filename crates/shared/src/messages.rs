//! Event and reply types for engine <-> front-end communication.
//!
//! These types are used by the engine (receiving `Envelope`, sending
//! `Reply`) and by transport adapters, which translate them to and from the
//! concrete chat platform's wire format.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Removing or renaming variants is a breaking change

use serde::{Deserialize, Serialize};

use armory_domain::UserId;

// =============================================================================
// Inbound events (front-end -> engine)
// =============================================================================

/// A single user event as seen by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Free text typed by the user (includes presses of reply-keyboard
    /// buttons, which arrive as their label text).
    Text { content: String },
    /// A bounded menu selection from a choice surface, distinct from free
    /// text. Carries the selected option's value, not its label.
    Choice { value: String },
    /// An image-bearing event; `asset` is an opaque transport handle.
    Image { asset: String },
    /// A slash command, name without the leading slash.
    Command { name: String },
}

/// An inbound event together with who sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub user_id: UserId,
    /// Display name captured from the platform; recorded as build author.
    pub display_name: String,
    pub event: InboundEvent,
}

impl Envelope {
    pub fn new(user_id: UserId, display_name: impl Into<String>, event: InboundEvent) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            event,
        }
    }
}

// =============================================================================
// Outbound replies (engine -> front-end)
// =============================================================================

/// A persistent button keyboard attached to a text or image reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<String>>,
}

impl Keyboard {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// One button per row.
    pub fn single_column<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: items.into_iter().map(|i| vec![i.into()]).collect(),
        }
    }

    /// Two buttons per row, the layout used for long option lists.
    pub fn paired<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for item in items {
            match rows.last_mut() {
                Some(row) if row.len() < 2 => row.push(item.into()),
                _ => rows.push(vec![item.into()]),
            }
        }
        Self { rows }
    }

    /// Append a single-button row.
    pub fn with_row(mut self, button: impl Into<String>) -> Self {
        self.rows.push(vec![button.into()]);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One selectable option on an ephemeral choice surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Stable value echoed back in `InboundEvent::Choice`.
    pub value: String,
    /// Human-readable label shown to the user.
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Messages from the engine to a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// Plain text, optionally with a button keyboard.
    Text {
        body: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyboard: Option<Keyboard>,
    },
    /// An image with caption; `asset` is an engine-side asset path.
    Image {
        asset: String,
        caption: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyboard: Option<Keyboard>,
    },
    /// An ephemeral choice surface tied to one message.
    Choices {
        prompt: String,
        options: Vec<ChoiceOption>,
    },
}

impl Reply {
    pub fn text(body: impl Into<String>) -> Self {
        Reply::Text {
            body: body.into(),
            keyboard: None,
        }
    }

    pub fn text_with_keyboard(body: impl Into<String>, keyboard: Keyboard) -> Self {
        Reply::Text {
            body: body.into(),
            keyboard: Some(keyboard),
        }
    }

    pub fn image(asset: impl Into<String>, caption: impl Into<String>, keyboard: Option<Keyboard>) -> Self {
        Reply::Image {
            asset: asset.into(),
            caption: caption.into(),
            keyboard,
        }
    }

    pub fn choices(prompt: impl Into<String>, options: Vec<ChoiceOption>) -> Self {
        Reply::Choices {
            prompt: prompt.into(),
            options,
        }
    }
}
