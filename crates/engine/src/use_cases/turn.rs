//! Turn orchestration.
//!
//! One turn: load the session, recompute the action list, resolve the
//! player's input, advance the beat, enrich the graph, move the player,
//! generate narration, and persist. The state is written back exactly once,
//! at the end of a successful active turn; terminal and invalid turns leave
//! the stored session untouched. The whole turn runs under a deadline.

use std::sync::Arc;
use std::time::Duration;

use storyloom_domain::{Direction, SessionId, SessionState, DEFAULT_HISTORY_CAP};

use crate::infrastructure::ports::StoreError;

use super::extraction::{EntityExtractor, GraphEnricher};
use super::movement::move_player;
use super::narration::{MapAnalyst, Narrator};
use super::persistence::SessionPersistence;
use super::resolver::{ActionResolver, Resolution};
use super::story::StoryGraph;
use super::transition::{BeatTransitionEngine, TerminalReason, TransitionState};

/// Default wall-clock budget for one turn.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(60);

/// Fallback narration when the LLM is unavailable.
const FALLBACK_NARRATIVE: &str = "The story presses on, though the details blur for a moment.";

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("turn exceeded its deadline of {0:?}")]
    Timeout(Duration),
}

/// What one turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub narrative: String,
    pub available_actions: Vec<String>,
    pub transition: TransitionState,
}

pub struct TurnRunner {
    persistence: Arc<SessionPersistence>,
    graph: StoryGraph,
    resolver: Arc<ActionResolver>,
    engine: BeatTransitionEngine,
    extractor: Arc<EntityExtractor>,
    enricher: Arc<GraphEnricher>,
    narrator: Narrator,
    analyst: MapAnalyst,
    history_cap: usize,
    timeout: Duration,
}

impl TurnRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        persistence: Arc<SessionPersistence>,
        graph: StoryGraph,
        resolver: Arc<ActionResolver>,
        engine: BeatTransitionEngine,
        extractor: Arc<EntityExtractor>,
        enricher: Arc<GraphEnricher>,
        narrator: Narrator,
        analyst: MapAnalyst,
    ) -> Self {
        Self {
            persistence,
            graph,
            resolver,
            engine,
            extractor,
            enricher,
            narrator,
            analyst,
            history_cap: DEFAULT_HISTORY_CAP,
            timeout: DEFAULT_TURN_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    /// Run one turn for `session_id` with the player's raw `input`.
    pub async fn run(&self, session_id: &SessionId, input: &str) -> Result<TurnOutcome, TurnError> {
        tokio::time::timeout(self.timeout, self.run_inner(session_id, input))
            .await
            .map_err(|_| {
                tracing::error!(session = %session_id, "turn deadline exceeded");
                TurnError::Timeout(self.timeout)
            })?
    }

    async fn run_inner(
        &self,
        session_id: &SessionId,
        input: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let mut state = self
            .persistence
            .load(session_id)
            .await?
            .ok_or_else(|| TurnError::NotFound(*session_id))?;

        let actions = self
            .graph
            .available_actions(&state.current_beat, &state.current_scene)
            .await?;
        state.available_actions = actions.clone();

        // An empty action list means the beat progresses unconditionally and
        // input is not gated at all.
        let resolved = if actions.is_empty() {
            None
        } else {
            match self.resolver.resolve(input, &actions).await {
                Resolution::Matched(action) => Some(action),
                Resolution::Unresolved => {
                    tracing::info!(session = %session_id, input, "input matched no available action");
                    return Ok(TurnOutcome {
                        narrative: format!(
                            "That doesn't work here. You can: {}",
                            actions.join(", ")
                        ),
                        available_actions: actions,
                        transition: TransitionState::Terminal(TerminalReason::InvalidInput),
                    });
                }
            }
        };

        let transition = self.engine.advance(&mut state, resolved.as_deref()).await;
        if let TransitionState::Terminal(reason) = transition {
            tracing::info!(session = %session_id, reason = reason.as_str(), "story reached a terminal state");
            return Ok(TurnOutcome {
                narrative: terminal_narrative(reason),
                available_actions: actions,
                transition,
            });
        }

        self.enrich_graph(&mut state, input).await;
        state.record_input(input, self.history_cap);

        let map_context = self.observe_map(&mut state, input).await;

        let narrative = match self.narrator.narrate(&state, &map_context).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(session = %session_id, error = %e, "narration failed");
                FALLBACK_NARRATIVE.to_string()
            }
        };
        state.record_narrative(&narrative, self.history_cap);

        let next_actions = self
            .graph
            .available_actions(&state.current_beat, &state.current_scene)
            .await?;
        state.available_actions = next_actions.clone();

        self.persistence.save(&state).await?;

        Ok(TurnOutcome {
            narrative,
            available_actions: next_actions,
            transition,
        })
    }

    /// Extract entities from the input and merge them into the graph.
    /// Failures are logged; they never fail the turn.
    async fn enrich_graph(&self, state: &mut SessionState, input: &str) {
        match self.extractor.extract(input).await {
            Ok(data) => {
                // Captured into the state before the graph write so a failed
                // write does not lose the extraction.
                state.extracted_data = data.clone();
                if let Err(e) = self.enricher.apply(&data).await {
                    tracing::warn!(session = %state.session_id, error = %e, "graph enrichment failed");
                }
            }
            Err(e) => {
                tracing::warn!(session = %state.session_id, error = %e, "entity extraction failed");
            }
        }
    }

    /// Apply movement input and describe the surroundings. Both are
    /// non-fatal; a missing map just yields no context.
    async fn observe_map(&self, state: &mut SessionState, input: &str) -> String {
        let map = match self.graph.map_info(&state.current_map).await {
            Ok(Some(map)) => map,
            Ok(None) => {
                tracing::warn!(session = %state.session_id, map = state.current_map.as_str(), "current map not found");
                return String::new();
            }
            Err(e) => {
                tracing::warn!(session = %state.session_id, error = %e, "map lookup failed");
                return String::new();
            }
        };

        if let Some(direction) = Direction::parse(input) {
            let outcome = move_player(&map, &mut state.player, direction);
            tracing::debug!(session = %state.session_id, direction = direction.as_str(), ?outcome, "player moved");
        }

        match self.analyst.analyse(&map, &state.player).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(session = %state.session_id, error = %e, "map analysis failed");
                String::new()
            }
        }
    }
}

fn terminal_narrative(reason: TerminalReason) -> String {
    match reason {
        TerminalReason::NoNextBeat => "There is no more story to tell. The tale ends here.",
        TerminalReason::RepeatedBeat => "The story cannot move forward from here.",
        TerminalReason::InvalidInput => "That doesn't work here.",
    }
    .to_string()
}
