//! The unit of work flowing through the message bus.

use serde::{Deserialize, Serialize};

use crate::allocation::{Command, Event};

/// Either a command or an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Message {
    Command(Command),
    Event(Event),
}

impl Message {
    /// Returns the command or event type name.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Command(cmd) => cmd.command_type(),
            Message::Event(event) => event.event_type(),
        }
    }

    /// Returns true if this message is a command.
    pub fn is_command(&self) -> bool {
        matches!(self, Message::Command(_))
    }
}

impl From<Command> for Message {
    fn from(cmd: Command) -> Self {
        Message::Command(cmd)
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}
