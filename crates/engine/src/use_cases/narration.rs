//! Narrative and map-analysis generation.

use std::sync::Arc;

use storyloom_domain::{MapInfo, Player, SessionState};

use crate::infrastructure::ports::{ChatMessage, LlmError, LlmPort, LlmRequest};
use crate::prompt_templates::defaults;

/// Generates the story continuation for a turn.
pub struct Narrator {
    llm: Arc<dyn LlmPort>,
}

impl Narrator {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        Self { llm }
    }

    /// Continue the story from the session's history and latest input.
    ///
    /// `map_context` is the analyst's read of the surroundings, empty when
    /// map analysis was skipped or failed.
    pub async fn narrate(
        &self,
        state: &SessionState,
        map_context: &str,
    ) -> Result<String, LlmError> {
        let mut prompt = String::new();
        if !state.history.is_empty() {
            prompt.push_str("Story so far:\n");
            for entry in &state.history {
                prompt.push_str(entry);
                prompt.push('\n');
            }
            prompt.push('\n');
        }
        if !map_context.is_empty() {
            prompt.push_str("Surroundings: ");
            prompt.push_str(map_context);
            prompt.push_str("\n\n");
        }
        prompt.push_str("Player action: ");
        prompt.push_str(&state.last_user_input);

        let request = LlmRequest::new(vec![ChatMessage::user(prompt)])
            .with_system_prompt(defaults::STORY_SYSTEM_PROMPT);
        let response = self.llm.generate(request).await?;
        Ok(response.content)
    }
}

/// Describes what the player can see and reach on the current map.
pub struct MapAnalyst {
    llm: Arc<dyn LlmPort>,
}

impl MapAnalyst {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        Self { llm }
    }

    pub async fn analyse(&self, map: &MapInfo, player: &Player) -> Result<String, LlmError> {
        let mut prompt = format!(
            "Map: {}\nDescription: {}\nContext: {}\n\nGrid ('#' is a wall):\n",
            map.name, map.description, map.context
        );
        for row in &map.grid {
            prompt.push_str(row);
            prompt.push('\n');
        }
        prompt.push_str(&format!(
            "\nPlayer is at ({}, {}) facing {} with a field of view of {} tiles.",
            player.position.x,
            player.position.y,
            player.direction.as_str(),
            player.field_of_view
        ));

        let request = LlmRequest::new(vec![ChatMessage::user(prompt)])
            .with_system_prompt(defaults::MAP_ANALYSIS_SYSTEM_PROMPT);
        let response = self.llm.generate(request).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{LlmResponse, MockLlmPort};
    use storyloom_domain::{
        BeatId, MapId, SceneId, SessionId, StartPosition, StoryNodeId,
    };

    fn sample_state() -> SessionState {
        let start = StartPosition {
            scene: SceneId::from("scene:station"),
            beat: StoryNodeId::Beat(BeatId::from("scene_beat:station_1")),
            map: MapId::from("map:station"),
        };
        let mut state = SessionState::bootstrap(SessionId::new(), &start);
        state.record_narrative("You arrive at the station.", 10);
        state.record_input("look around", 10);
        state
    }

    #[tokio::test]
    async fn narrate_includes_history_and_input() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .withf(|request: &LlmRequest| {
                let prompt = &request.messages[0].content;
                prompt.contains("You arrive at the station.")
                    && prompt.contains("Player action: look around")
                    && request.system_prompt.is_some()
            })
            .returning(|_| {
                Ok(LlmResponse {
                    content: "The concourse hums around you.".to_string(),
                })
            });
        let narrator = Narrator::new(Arc::new(llm));

        let text = narrator.narrate(&sample_state(), "").await.unwrap();
        assert_eq!(text, "The concourse hums around you.");
    }

    #[tokio::test]
    async fn analyse_renders_the_grid() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .withf(|request: &LlmRequest| {
                let prompt = &request.messages[0].content;
                prompt.contains("####") && prompt.contains("Player is at (1, 1)")
            })
            .returning(|_| {
                Ok(LlmResponse {
                    content: "An open concourse.".to_string(),
                })
            });
        let analyst = MapAnalyst::new(Arc::new(llm));

        let map = MapInfo {
            id: MapId::from("map:station"),
            name: "Station".into(),
            description: "An underground concourse.".into(),
            context: "Rush hour.".into(),
            grid: vec!["####".into(), "#..#".into(), "####".into()],
        };
        let state = sample_state();

        let text = analyst.analyse(&map, &state.player).await.unwrap();
        assert_eq!(text, "An open concourse.");
    }
}
