//! Conversation-related types.
//!
//! A [`Conversation`] is one append-only list of items. The model sees it
//! through [`Conversation::history`], the user interface through
//! [`Conversation::transcript`]. Both views always agree because a turn is
//! committed as a whole.

use bookbot_model::ModelMessage;

use crate::turn::{Turn, TurnOutcome};

/// Who sent a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person using the assistant.
    User,
    /// The assistant.
    Assistant,
}

/// A message in the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    /// Who sent it.
    pub role: Role,
    /// The text.
    pub content: String,
}

impl Message {
    pub(crate) fn to_model_message(&self) -> ModelMessage {
        match self.role {
            Role::User => ModelMessage::User(self.content.clone()),
            Role::Assistant => ModelMessage::Assistant(self.content.clone()),
        }
    }
}

/// An item in the conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    message: Message,
    outcome: Option<TurnOutcome>,
}

impl Item {
    /// Returns the message of this item.
    #[inline]
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Returns what the turn produced. Only assistant items have one.
    #[inline]
    pub fn outcome(&self) -> Option<&TurnOutcome> {
        self.outcome.as_ref()
    }
}

/// Represents a conversation.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Conversation {
    items: Vec<Item>,
}

impl Conversation {
    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing has been said yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The messages replayed to the model, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &Message> {
        self.items.iter().map(|item| &item.message)
    }

    /// The items shown to the user, oldest first.
    #[inline]
    pub fn transcript(&self) -> &[Item] {
        &self.items
    }

    /// Appends the user message and the assistant reply of `turn`, and
    /// returns the assistant item.
    pub fn commit(&mut self, turn: Turn) -> &Item {
        let Turn {
            utterance,
            reply,
            outcome,
        } = turn;
        self.items.reserve(2);
        self.items.push(Item {
            message: Message {
                role: Role::User,
                content: utterance,
            },
            outcome: None,
        });
        self.items.push(Item {
            message: Message {
                role: Role::Assistant,
                content: reply,
            },
            outcome: Some(outcome),
        });
        &self.items[self.items.len() - 1]
    }
}
