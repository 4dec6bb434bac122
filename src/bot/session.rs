//! Per-user session state.
//!
//! Mode-specific fields live inside the `Mode` variants, so assigning a new
//! mode drops the previous mode's state wholesale. At most one mode is ever
//! active per session.

use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::openai::ChatTurn;

/// The active conversational mode for one user.
#[derive(Debug, Clone, Default)]
pub enum Mode {
    #[default]
    Idle,
    /// Open chat; the full dialog is resent on every exchange.
    Chat { history: Vec<ChatTurn> },
    Persona(PersonaState),
    Quiz(QuizState),
    Translate(TranslateState),
    /// Voice dialog; history mirrors the open-chat contract.
    Voice { history: Vec<ChatTurn> },
}

#[derive(Debug, Clone)]
pub enum PersonaState {
    Choosing,
    Talking { key: String },
}

#[derive(Debug, Clone)]
pub enum TranslateState {
    Choosing,
    Translating { key: String },
}

#[derive(Debug, Clone)]
pub enum QuizState {
    ChoosingTopic,
    Answering {
        topic: String,
        /// Correct letter of the currently displayed question; `None` until
        /// a question has been generated and parsed.
        expected: Option<String>,
        correct: u32,
        total: u32,
    },
}

#[derive(Debug, Default)]
pub struct Session {
    pub mode: Mode,
    /// Last rendered menu/keyboard message, deleted or edited on the next
    /// exchange so stale keyboards don't pile up.
    pub menu_message_id: Option<i32>,
    /// Bumped on every handled event. Pending deferred transitions compare
    /// against it and cancel themselves when the user acted first.
    pub epoch: u64,
}

/// All sessions, keyed by chat id. The lock is held only across state
/// mutation, never across network calls.
#[derive(Default)]
pub struct Sessions {
    inner: Mutex<HashMap<i64, Session>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the user's session (created lazily), bumping the
    /// event epoch first.
    pub async fn update<R>(&self, chat_id: i64, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut map = self.inner.lock().await;
        let session = map.entry(chat_id).or_default();
        session.epoch += 1;
        f(session)
    }

    /// Follow-up mutation within an already-counted event; does not bump
    /// the epoch.
    pub async fn with_session<R>(&self, chat_id: i64, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut map = self.inner.lock().await;
        let session = map.entry(chat_id).or_default();
        f(session)
    }

    /// Read-only access without bumping the epoch.
    pub async fn peek<R>(&self, chat_id: i64, f: impl FnOnce(&Session) -> R) -> R {
        let mut map = self.inner.lock().await;
        let session = map.entry(chat_id).or_default();
        f(session)
    }

    pub async fn epoch(&self, chat_id: i64) -> u64 {
        self.peek(chat_id, |s| s.epoch).await
    }
}

impl Session {
    /// Drop all mode state and return to the idle/main-menu baseline.
    pub fn reset(&mut self) {
        self.mode = Mode::Idle;
    }
}
