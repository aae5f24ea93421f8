//! Outbound text queued by the engine for the transport layer.
//!
//! The engine never renders or writes to a socket. It queues [`Outbound`]
//! lines; whoever owns the connection drains them through a [`NoticeSink`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Bold,
    Warning,
}

/// A line addressed to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub tone: Tone,
    pub text: String,
}

impl Notice {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Plain,
            text: text.into(),
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Bold,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Warning,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Shown to this player only.
    Player(Notice),
    /// Shown to everyone else in the player's location.
    Room(String),
}

/// Receiver for drained outbound text (socket writer, broadcast fan-out).
pub trait NoticeSink {
    fn to_player(&mut self, notice: Notice);
    fn to_room(&mut self, actor: &str, location: Option<u32>, text: String);
}

/// Translation lookup: key plus arguments to a formatted string.
pub trait Localizer {
    fn translate(&self, locale: Option<&str>, key: &str, args: &[&str]) -> String;
}

/// Sink that keeps everything in memory; used by tests and the CLI.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub player: Vec<Notice>,
    pub room: Vec<(String, Option<u32>, String)>,
}

impl NoticeSink for CollectingSink {
    fn to_player(&mut self, notice: Notice) {
        self.player.push(notice);
    }

    fn to_room(&mut self, actor: &str, location: Option<u32>, text: String) {
        self.room.push((actor.to_string(), location, text));
    }
}
