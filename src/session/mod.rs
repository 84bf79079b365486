//! The session service.
//!
//! [`GameService`] owns every lifecycle operation. Each session is an
//! independently-owned unit of mutable state: a per-session async mutex
//! serializes all read-modify-write cycles, and the store's version check
//! backstops any writer that slipped past it. There is no background round
//! timer: clients fire `end_round` when their synchronized clock crosses
//! the deadline, and the status guard makes racing calls harmless.

mod lifecycle;

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};

use crate::content::ContentSource;
use crate::error::{GameError, GameResult};
use crate::matching::EquivalenceDictionary;
use crate::store::SessionStore;
use crate::types::{unix_millis, PlayerColors, PlayerId, Session, SessionId};

/// Safe character set for join codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 5;

/// Generate a random session join code (5 characters)
fn generate_join_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Display palette for player identity colors
const COLOR_PALETTE: &[&str] = &[
    "#E4572E", "#17BEBB", "#FFC914", "#76B041", "#9B5DE5", "#00BBF9", "#F15BB5", "#3D5A80",
];

fn random_colors() -> PlayerColors {
    let mut rng = rand::rng();
    let body = rng.random_range(0..COLOR_PALETTE.len());
    let mut accent = rng.random_range(0..COLOR_PALETTE.len());
    if accent == body {
        accent = (accent + 1) % COLOR_PALETTE.len();
    }
    PlayerColors {
        body: COLOR_PALETTE[body].to_string(),
        accent: COLOR_PALETTE[accent].to_string(),
    }
}

/// State-changed notification fanned out by the push layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Joined,
    Left,
    Ready,
    RoundStarted,
    RoundEnded,
    Sync,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    pub session_id: SessionId,
    pub kind: EventKind,
    pub player_id: Option<PlayerId>,
}

pub struct GameService {
    store: Arc<dyn SessionStore>,
    content: Arc<dyn ContentSource>,
    events: broadcast::Sender<SessionEvent>,
    /// One mutex per session; every lifecycle op holds it for the whole
    /// load-mutate-save cycle
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
    /// Round dictionary memo, keyed by session and invalidated when the
    /// round number moves
    dictionaries: Mutex<HashMap<SessionId, (u32, Arc<EquivalenceDictionary>)>>,
}

impl GameService {
    pub fn new(store: Arc<dyn SessionStore>, content: Arc<dyn ContentSource>) -> Self {
        let (events, _rx) = broadcast::channel(256);
        Self {
            store,
            content,
            events,
            locks: Mutex::new(HashMap::new()),
            dictionaries: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Send errors only mean nobody is listening
    pub(crate) fn emit(&self, session_id: &str, kind: EventKind, player_id: Option<&str>) {
        let _ = self.events.send(SessionEvent {
            session_id: session_id.to_string(),
            kind,
            player_id: player_id.map(str::to_string),
        });
    }

    pub(crate) async fn session_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub(crate) async fn load_required(&self, id: &str) -> GameResult<Session> {
        self.store
            .load(id)
            .await?
            .ok_or_else(|| GameError::NotFound(format!("session {id}")))
    }

    /// Commit a mutated snapshot: one version bump per operation, and the
    /// mutation only counts once the store accepted it.
    pub(crate) async fn commit(&self, session: &mut Session) -> GameResult<()> {
        session.version += 1;
        session.updated_at = unix_millis();
        self.store.save(session).await
    }

    /// The equivalence dictionary for the session's active round, rebuilt
    /// whenever the round context changes. A session without a loaded
    /// context gets an empty dictionary (stem-equality matching only).
    pub(crate) async fn dictionary_for(&self, session: &Session) -> Arc<EquivalenceDictionary> {
        let mut memo = self.dictionaries.lock().await;
        if let Some((round, dict)) = memo.get(&session.id) {
            if *round == session.round {
                return dict.clone();
            }
        }
        let dict = Arc::new(
            session
                .round_context
                .as_ref()
                .map(EquivalenceDictionary::build)
                .unwrap_or_default(),
        );
        memo.insert(session.id.clone(), (session.round, dict.clone()));
        dict
    }

    pub(crate) async fn forget_session_runtime(&self, id: &str) {
        self.dictionaries.lock().await.remove(id);
    }

    pub(crate) fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    pub(crate) fn content(&self) -> &dyn ContentSource {
        self.content.as_ref()
    }

    pub(crate) fn new_join_code(&self) -> String {
        generate_join_code()
    }

    pub(crate) fn new_player_colors(&self) -> PlayerColors {
        random_colors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_codes_use_the_safe_alphabet() {
        for _ in 0..100 {
            let code = generate_join_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_CHARS.contains(&b)));
        }
    }

    #[test]
    fn player_colors_are_distinct() {
        for _ in 0..100 {
            let colors = random_colors();
            assert_ne!(colors.body, colors.accent);
        }
    }
}
