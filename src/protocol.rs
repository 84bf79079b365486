//! Wire-facing types: request bodies and the sanitized session projection.
//!
//! While a round is being played, a player must not see what anyone else
//! has written so far: projections carry only an answer count for other
//! players and reveal the texts once the round is over.

use serde::{Deserialize, Serialize};

use crate::session::EventKind;
use crate::types::*;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub config: Option<SessionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinRequest {
    /// Present on reconnect attempts
    pub player_id: Option<PlayerId>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub player_id: PlayerId,
    pub session: SessionView,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRoundRequest {
    pub category: Option<String>,
    pub round_millis: Option<i64>,
    pub total_rounds: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswersRequest {
    pub player_id: PlayerId,
    pub words: Vec<String>,
    #[serde(default)]
    pub forced_pass: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaveRequest {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetCategoryRequest {
    pub category: String,
}

/// Authoritative clock sample for RTT calibration
#[derive(Debug, Clone, Serialize)]
pub struct TimeResponse {
    pub server_now: i64,
}

/// One player as seen by a (possibly different) player
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub colors: PlayerColors,
    pub score: u32,
    pub status: PlayerStatus,
    /// Hidden (empty) for other players while the round is being played
    pub current_answers: Vec<String>,
    pub answer_count: usize,
    pub round_history: Vec<PlayerRoundEntry>,
}

/// Session snapshot sanitized for one viewer.
///
/// `server_now` rides along on every projection so clients can run
/// timestamp calibration without an extra round trip.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: SessionId,
    pub status: SessionStatus,
    pub round: u32,
    pub total_rounds: u32,
    pub selected_category: Option<CategoryId>,
    pub current_prompt_id: Option<PromptId>,
    pub question: Option<String>,
    pub countdown_starts_at: Option<i64>,
    pub round_starts_at: Option<i64>,
    pub round_ends_at: Option<i64>,
    pub countdown_millis: i64,
    pub round_millis: i64,
    pub config: SessionConfig,
    pub players: Vec<PlayerView>,
    pub round_history: Vec<RoundSummary>,
    pub server_now: i64,
}

impl SessionView {
    pub fn project(session: &Session, viewer: Option<&str>) -> Self {
        let in_play = session.status == SessionStatus::Playing;
        let mut players: Vec<PlayerView> = session
            .players
            .values()
            .map(|p| {
                let own = viewer == Some(p.id.as_str());
                let visible = own || !in_play;
                PlayerView {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    colors: p.colors.clone(),
                    score: p.score,
                    status: p.status,
                    current_answers: if visible {
                        p.current_answers.clone()
                    } else {
                        Vec::new()
                    },
                    answer_count: p.current_answers.len(),
                    round_history: p.round_history.clone(),
                }
            })
            .collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));

        Self {
            id: session.id.clone(),
            status: session.status,
            round: session.round,
            total_rounds: session.total_rounds,
            selected_category: session.selected_category.clone(),
            current_prompt_id: session.current_prompt_id.clone(),
            question: session
                .round_context
                .as_ref()
                .map(|ctx| ctx.question.clone()),
            countdown_starts_at: session.countdown_starts_at,
            round_starts_at: session.round_starts_at,
            round_ends_at: session.round_ends_at,
            countdown_millis: session.countdown_millis,
            round_millis: session.round_millis,
            config: session.config.clone(),
            players,
            round_history: session.round_history.clone(),
            server_now: unix_millis(),
        }
    }
}

/// Messages pushed over the websocket
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        session: SessionView,
    },
    /// A state-changed notification plus the fresh sanitized snapshot
    State {
        event: EventKind,
        session: SessionView,
    },
    Error {
        code: String,
        msg: String,
    },
}

/// Messages accepted over the websocket
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for a fresh snapshot (also serves as an RTT calibration probe)
    Sync,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Player, PlayerColors, PlayerStatus, Session, SessionConfig};

    fn player(id: &str, answers: &[&str]) -> Player {
        Player {
            id: id.to_string(),
            name: format!("name-{id}"),
            colors: PlayerColors {
                body: "#000000".into(),
                accent: "#ffffff".into(),
            },
            score: 0,
            status: PlayerStatus::Playing,
            current_answers: answers.iter().map(|s| s.to_string()).collect(),
            round_history: Vec::new(),
        }
    }

    fn playing_session() -> Session {
        let mut session = Session::new("ABCDE".into(), SessionConfig::default());
        session.status = SessionStatus::Playing;
        session
            .players
            .insert("ana".into(), player("ana", &["GATO"]));
        session
            .players
            .insert("beto".into(), player("beto", &["PERRO", "SOL"]));
        session
    }

    #[test]
    fn hides_other_answers_while_playing() {
        let view = SessionView::project(&playing_session(), Some("ana"));
        let ana = view.players.iter().find(|p| p.id == "ana").unwrap();
        let beto = view.players.iter().find(|p| p.id == "beto").unwrap();

        assert_eq!(ana.current_answers, vec!["GATO"]);
        assert!(beto.current_answers.is_empty());
        assert_eq!(beto.answer_count, 2);
    }

    #[test]
    fn reveals_answers_once_round_is_over() {
        let mut session = playing_session();
        session.status = SessionStatus::RoundEnded;
        let view = SessionView::project(&session, Some("ana"));
        let beto = view.players.iter().find(|p| p.id == "beto").unwrap();
        assert_eq!(beto.current_answers, vec!["PERRO", "SOL"]);
    }

    #[test]
    fn anonymous_viewer_sees_counts_only_while_playing() {
        let view = SessionView::project(&playing_session(), None);
        assert!(view.players.iter().all(|p| p.current_answers.is_empty()));
        assert!(view.server_now > 0);
    }
}
