use super::{EventKind, GameService};
use crate::error::{GameError, GameResult};
use crate::matching::score_round;
use crate::types::*;
use std::collections::HashMap;

impl GameService {
    /// Open a new session with a unique join code.
    pub async fn create_session(&self, config: Option<SessionConfig>) -> GameResult<Session> {
        // Collision on a 5-char code is rare; loop until the store is clean
        let id = loop {
            let code = self.new_join_code();
            if !self.store().exists(&code).await? {
                break code;
            }
        };

        let mut session = Session::new(id, config.unwrap_or_default());
        self.commit(&mut session).await?;
        tracing::info!(session = %session.id, "session created");
        Ok(session)
    }

    /// Add a player, or restore one that reconnects with a known id.
    pub async fn join(
        &self,
        session_id: &str,
        player_id: Option<&str>,
        name: &str,
    ) -> GameResult<(Session, PlayerId)> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load_required(session_id).await?;
        if session.status == SessionStatus::Closed {
            return Err(GameError::InvalidTransition(
                "session is closed".to_string(),
            ));
        }

        // Known id means reconnect: hand back current state, never an error
        if let Some(id) = player_id {
            let restored = if session.status == SessionStatus::Playing {
                PlayerStatus::Playing
            } else {
                PlayerStatus::Connected
            };
            let known = match session.players.get_mut(id) {
                Some(player) => {
                    player.status = restored;
                    true
                }
                None => false,
            };
            if known {
                let id = id.to_string();
                self.commit(&mut session).await?;
                self.emit(session_id, EventKind::Joined, Some(&id));
                tracing::info!(session = %session_id, player = %id, "player reconnected");
                return Ok((session, id));
            }
        }

        let name = name.trim();
        let name_chars = name.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name_chars) {
            return Err(GameError::Validation(format!(
                "name must be {NAME_MIN_CHARS}-{NAME_MAX_CHARS} characters"
            )));
        }
        if session.active_player_count() >= session.config.max_players {
            return Err(GameError::Validation("session is full".to_string()));
        }

        let player = Player {
            id: ulid::Ulid::new().to_string(),
            name: name.to_string(),
            colors: self.new_player_colors(),
            score: 0,
            status: PlayerStatus::Connected,
            current_answers: Vec::new(),
            round_history: Vec::new(),
        };
        let id = player.id.clone();
        session.players.insert(id.clone(), player);

        self.commit(&mut session).await?;
        self.emit(session_id, EventKind::Joined, Some(&id));
        tracing::info!(session = %session_id, player = %id, name, "player joined");
        Ok((session, id))
    }

    /// Begin a round: resolve the category, draw a prompt, compute the
    /// countdown/round deadlines and install the round's dictionary.
    pub async fn start_round(
        &self,
        session_id: &str,
        category: Option<&str>,
        round_millis: Option<i64>,
        total_rounds: Option<u32>,
    ) -> GameResult<Session> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load_required(session_id).await?;
        if !matches!(
            session.status,
            SessionStatus::Waiting | SessionStatus::RoundEnded
        ) {
            return Err(GameError::InvalidTransition(format!(
                "cannot start a round while {:?}",
                session.status
            )));
        }
        if session.active_player_count() < session.config.min_players {
            return Err(GameError::InvalidTransition(format!(
                "need at least {} active players",
                session.config.min_players
            )));
        }

        // Category precedence: explicit request, then the session's
        // previous selection, then a random pick
        let category_id = match category {
            Some(name) => self
                .content()
                .resolve_category(name)
                .await?
                .ok_or_else(|| GameError::Validation(format!("unknown category {name:?}")))?,
            None => match &session.selected_category {
                Some(selected) => selected.clone(),
                None => self.content().random_category().await?,
            },
        };

        let card = self
            .content()
            .draw_prompt(&category_id)
            .await?
            .ok_or_else(|| GameError::NotFound(format!("no prompts in category {category_id}")))?;

        session.round_millis = sanitize_round_millis(round_millis);
        if let Some(requested) = total_rounds {
            // never retroactively finish an in-flight game
            session.total_rounds = sanitize_total_rounds(Some(requested)).max(session.round + 1);
        }

        let now = unix_millis();
        session.countdown_starts_at = Some(now);
        session.round_starts_at = Some(now + session.countdown_millis);
        session.round_ends_at = Some(now + session.countdown_millis + session.round_millis);

        session.round += 1;
        session.status = SessionStatus::Playing;
        session.selected_category = Some(category_id);
        session.current_prompt_id = Some(card.id.clone());
        session.round_context = Some(RoundContext {
            prompt_id: card.id,
            question: card.question,
            canonical_answers: card.canonical_answers,
        });

        for player in session.players.values_mut() {
            if player.is_active() {
                player.current_answers.clear();
                player.status = PlayerStatus::Playing;
            }
        }

        self.commit(&mut session).await?;
        // warm the memo so end_round scores against this round's context
        self.dictionary_for(&session).await;
        self.emit(session_id, EventKind::RoundStarted, None);
        tracing::info!(
            session = %session_id,
            round = session.round,
            of = session.total_rounds,
            "round started"
        );
        Ok(session)
    }

    /// Record a player's answers for the active round; last write wins.
    pub async fn submit_answers(
        &self,
        session_id: &str,
        player_id: &str,
        words: Vec<String>,
        forced_pass: bool,
    ) -> GameResult<Session> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load_required(session_id).await?;
        if session.status != SessionStatus::Playing {
            // normal race: the round ended while the submit was in flight
            return Err(GameError::InvalidTransition(
                "no round is being played".to_string(),
            ));
        }

        let max_words = session.config.max_words_per_player;
        let max_chars = session.config.max_word_length;
        let player = session
            .players
            .get_mut(player_id)
            .ok_or_else(|| GameError::NotFound(format!("player {player_id}")))?;
        if !player.is_active() {
            return Err(GameError::InvalidTransition(
                "player has left the session".to_string(),
            ));
        }

        player.current_answers = words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(|w| w.chars().take(max_chars).collect::<String>())
            .take(max_words)
            .collect();
        player.status = if forced_pass {
            PlayerStatus::Ready
        } else {
            PlayerStatus::Playing
        };

        self.commit(&mut session).await?;
        self.emit(
            session_id,
            if forced_pass {
                EventKind::Ready
            } else {
                EventKind::Sync
            },
            Some(player_id),
        );
        Ok(session)
    }

    /// Close out the active round: run the scoring pass, append history and
    /// advance the state machine. Only the first caller wins; anyone racing
    /// in afterward gets a typed rejection and resyncs.
    pub async fn end_round(&self, session_id: &str) -> GameResult<Session> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load_required(session_id).await?;
        if session.status != SessionStatus::Playing {
            return Err(GameError::InvalidTransition(
                "no round is being played".to_string(),
            ));
        }

        let dict = self.dictionary_for(&session).await;
        let answers: HashMap<PlayerId, Vec<String>> = session
            .active_players()
            .map(|p| (p.id.clone(), p.current_answers.clone()))
            .collect();
        let mut results = score_round(&answers, &dict);

        let round = session.round;
        let mut deltas = HashMap::new();
        for player in session.players.values_mut() {
            if !player.is_active() {
                continue;
            }
            let outcome = results.remove(&player.id).unwrap_or_else(|| {
                crate::matching::RoundScore {
                    answers: Vec::new(),
                    delta: 0,
                }
            });
            deltas.insert(player.id.clone(), outcome.delta);
            player.score += outcome.delta;
            player.round_history.push(PlayerRoundEntry {
                round,
                answers: outcome.answers,
                delta: outcome.delta,
            });
            player.current_answers.clear();
            player.status = PlayerStatus::Connected;
        }

        session.round_history.push(RoundSummary {
            round,
            prompt_id: session.current_prompt_id.clone().unwrap_or_default(),
            question: session
                .round_context
                .as_ref()
                .map(|ctx| ctx.question.clone())
                .unwrap_or_default(),
            deltas,
            ended_at: unix_millis(),
        });

        if session.round >= session.total_rounds {
            session.game_history.push(GameSummary {
                rounds_played: session.round,
                final_scores: session
                    .players
                    .values()
                    .map(|p| (p.id.clone(), p.score))
                    .collect(),
                finished_at: unix_millis(),
            });
            session.status = SessionStatus::Finished;
        } else {
            session.status = SessionStatus::RoundEnded;
        }
        session.clear_timers();

        self.commit(&mut session).await?;
        self.forget_session_runtime(session_id).await;
        self.emit(session_id, EventKind::RoundEnded, None);
        tracing::info!(session = %session_id, round, status = ?session.status, "round ended");
        Ok(session)
    }

    /// Mark a player disconnected, keeping the record for reconnection.
    pub async fn leave(&self, session_id: &str, player_id: &str) -> GameResult<Session> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load_required(session_id).await?;
        // already gone (or never here) is not an error
        let was_active = match session.players.get_mut(player_id) {
            Some(player) if player.is_active() => {
                player.status = PlayerStatus::Disconnected;
                true
            }
            _ => false,
        };
        if was_active {
            self.commit(&mut session).await?;
            self.emit(session_id, EventKind::Left, Some(player_id));
            tracing::info!(session = %session_id, player = %player_id, "player left");
        }
        Ok(session)
    }

    /// Pick the category used by subsequent rounds.
    pub async fn set_category(&self, session_id: &str, name: &str) -> GameResult<Session> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load_required(session_id).await?;
        match session.status {
            SessionStatus::Closed => {
                return Err(GameError::InvalidTransition(
                    "session is closed".to_string(),
                ))
            }
            SessionStatus::Playing => {
                return Err(GameError::InvalidTransition(
                    "cannot change category mid-round".to_string(),
                ))
            }
            _ => {}
        }

        let category_id = self
            .content()
            .resolve_category(name)
            .await?
            .ok_or_else(|| GameError::Validation(format!("unknown category {name:?}")))?;
        session.selected_category = Some(category_id);

        self.commit(&mut session).await?;
        self.emit(session_id, EventKind::Sync, None);
        Ok(session)
    }

    /// Apply a partial config update. Out-of-range values fall back to
    /// defaults instead of failing, so room setup survives malformed input.
    pub async fn update_config(&self, session_id: &str, patch: ConfigPatch) -> GameResult<Session> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load_required(session_id).await?;
        if session.status == SessionStatus::Closed {
            return Err(GameError::InvalidTransition(
                "session is closed".to_string(),
            ));
        }

        let current = session.config.clone();
        session.config = SessionConfig {
            min_players: patch.min_players.unwrap_or(current.min_players),
            max_players: patch.max_players.unwrap_or(current.max_players),
            max_words_per_player: patch
                .max_words_per_player
                .unwrap_or(current.max_words_per_player),
            max_word_length: patch.max_word_length.unwrap_or(current.max_word_length),
            hurry_up_millis: patch.hurry_up_millis.unwrap_or(current.hurry_up_millis),
        }
        .sanitized();

        if let Some(countdown) = patch.countdown_millis {
            session.countdown_millis = if (1_000..=30_000).contains(&countdown) {
                countdown
            } else {
                DEFAULT_COUNTDOWN_MILLIS
            };
        }
        if let Some(requested) = patch.round_millis {
            session.round_millis = sanitize_round_millis(Some(requested));
        }
        if let Some(requested) = patch.total_rounds {
            session.total_rounds =
                sanitize_total_rounds(Some(requested)).max(session.round.max(1));
        }

        self.commit(&mut session).await?;
        self.emit(session_id, EventKind::Sync, None);
        Ok(session)
    }

    /// Return to the lobby: round counter, scores and histories zeroed.
    /// The finished-game archive is the one thing that survives.
    pub async fn reset(&self, session_id: &str) -> GameResult<Session> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load_required(session_id).await?;
        if session.status == SessionStatus::Closed {
            return Err(GameError::InvalidTransition(
                "session is closed".to_string(),
            ));
        }

        session.status = SessionStatus::Waiting;
        session.round = 0;
        session.current_prompt_id = None;
        session.round_context = None;
        session.round_history.clear();
        session.clear_timers();
        for player in session.players.values_mut() {
            player.score = 0;
            player.round_history.clear();
            player.current_answers.clear();
            if player.is_active() {
                player.status = PlayerStatus::Connected;
            }
        }

        self.commit(&mut session).await?;
        self.forget_session_runtime(session_id).await;
        self.emit(session_id, EventKind::Sync, None);
        tracing::info!(session = %session_id, "session reset");
        Ok(session)
    }

    /// Tear the session down; the caller garbage-collects it afterward.
    pub async fn close(&self, session_id: &str) -> GameResult<Session> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.load_required(session_id).await?;
        session.status = SessionStatus::Closed;
        session.clear_timers();
        for player in session.players.values_mut() {
            player.status = PlayerStatus::Disconnected;
        }

        self.commit(&mut session).await?;
        self.forget_session_runtime(session_id).await;
        self.emit(session_id, EventKind::Sync, None);
        tracing::info!(session = %session_id, "session closed");
        Ok(session)
    }

    /// Delete a closed session's stored row.
    pub async fn remove(&self, session_id: &str) -> GameResult<()> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        self.store().delete(session_id).await?;
        self.forget_session_runtime(session_id).await;
        Ok(())
    }

    /// Read-only snapshot for the request layer.
    pub async fn get_session(&self, session_id: &str) -> GameResult<Session> {
        self.load_required(session_id).await
    }
}
