//! Beat transition engine.
//!
//! Advances the session's current beat along the story graph. A resolved
//! action selects the CONDITION edge carrying exactly that label; when no
//! such edge exists the unconditional NEXT edge is taken. The session is
//! never left silently on the old beat: every advance either moves the
//! state or reports why the story cannot continue.

use storyloom_domain::{SessionState, StoryNodeId};

use super::story::StoryGraph;

/// Why a session reached a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalReason {
    /// The current beat has no outgoing edge to follow.
    NoNextBeat,
    /// The graph routed the session back onto its current beat.
    RepeatedBeat,
    /// Player input did not resolve to any available action.
    InvalidInput,
}

impl TerminalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoNextBeat => "no_next_beat",
            Self::RepeatedBeat => "repeated_beat",
            Self::InvalidInput => "invalid_input",
        }
    }
}

/// Result of one advance over the story graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    /// The session moved to a new beat and the story continues.
    Active,
    /// The story cannot continue from here.
    Terminal(TerminalReason),
}

impl TransitionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

pub struct BeatTransitionEngine {
    graph: StoryGraph,
}

impl BeatTransitionEngine {
    pub fn new(graph: StoryGraph) -> Self {
        Self { graph }
    }

    /// Advance `state` one beat, following the CONDITION edge for `action`
    /// when one exists and the NEXT edge otherwise.
    ///
    /// The state is only mutated after the whole target (beat, scene, map)
    /// has been computed; on any terminal outcome or store failure it is
    /// left untouched. Store failures are logged and reported as
    /// `NoNextBeat` so a flaky backend ends the story instead of wedging it.
    pub async fn advance(&self, state: &mut SessionState, action: Option<&str>) -> TransitionState {
        let current = state.current_beat.clone();

        let next = match self.find_next(&current, action).await {
            Ok(Some(next)) => next,
            Ok(None) => return TransitionState::Terminal(TerminalReason::NoNextBeat),
            Err(e) => {
                tracing::error!(
                    session = %state.session_id,
                    beat = current.as_str(),
                    error = %e,
                    "store failure during beat transition"
                );
                return TransitionState::Terminal(TerminalReason::NoNextBeat);
            }
        };

        if next == current {
            return TransitionState::Terminal(TerminalReason::RepeatedBeat);
        }

        // Scene targets carry their own map; resolve it before touching the
        // state so a store failure cannot leave a half-applied transition.
        let scene_update = match &next {
            StoryNodeId::Scene(scene) => {
                let map = match self.graph.scene_map(scene).await {
                    Ok(map) => map,
                    Err(e) => {
                        tracing::error!(
                            session = %state.session_id,
                            scene = scene.as_str(),
                            error = %e,
                            "store failure resolving scene map"
                        );
                        return TransitionState::Terminal(TerminalReason::NoNextBeat);
                    }
                };
                if map.is_none() {
                    tracing::warn!(
                        session = %state.session_id,
                        scene = scene.as_str(),
                        "scene has no map edge, keeping current map"
                    );
                }
                Some((scene.clone(), map))
            }
            StoryNodeId::Beat(_) => None,
        };

        state.current_beat = next;
        if let Some((scene, map)) = scene_update {
            state.current_scene = scene;
            if let Some(map) = map {
                state.current_map = map;
            }
        }

        TransitionState::Active
    }

    async fn find_next(
        &self,
        current: &StoryNodeId,
        action: Option<&str>,
    ) -> Result<Option<StoryNodeId>, crate::infrastructure::ports::StoreError> {
        if let Some(action) = action {
            if let Some(target) = self.graph.condition_target(current, action).await? {
                return Ok(Some(target));
            }
        }
        self.graph.next_target(current).await
    }
}
