//! LLM prompt templates used by the engine.

/// Default values for all prompt templates.
pub mod defaults {
    /// System prompt for narrative generation.
    pub const STORY_SYSTEM_PROMPT: &str = r#"You are the narrator of an interactive story.

Continue the story in second person, present tense. Ground every response in
the scene context and the player's latest action. Keep responses to one or two
short paragraphs. Never speak for the player and never list choices; end at a
moment where the player can act."#;

    /// System prompt for grid map analysis.
    pub const MAP_ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a level analyst for a tile-based game.

You are given a map name, a description, and a grid where '#' marks a wall and
any other character is walkable. Describe what the player can see and reach
from their current position in at most three sentences. Mention blocked
directions only when the player just tried to move there."#;

    /// Prompt for extracting entities and relationships from player input.
    /// The schema slot constrains labels when the caller provides one.
    pub const EXTRACTION_PROMPT: &str = r#"You are a top-tier algorithm designed for extracting
information in structured formats to build a knowledge graph.

Extract the entities (nodes) and specify their type from the following text.
Also extract the relationships between these nodes.

Return result as JSON using the following format:
{"nodes": [ {"id": "0", "label": "Character", "properties": {"name": "Taehoon"} }],
"relationships": [{"type": "KNOWS", "start_node_id": "0", "end_node_id": "1", "properties": {"since": "met in the office"} }] }

Use only the following nodes and relationships (if provided):
{schema}

Assign a unique ID (string) to each node, and reuse it to define relationships.
Do respect the source and target node types for relationship and
the relationship direction.

Make sure you adhere to the following rules to produce valid JSON objects:
- Do not return any additional information other than the JSON in it.
- Omit any backticks around the JSON - simply output the JSON on its own.
- The JSON object must not wrapped into a list - it is its own JSON object.
- Property names must be enclosed in double quotes

Input text:

{text}"#;
}

/// Fill the `{schema}` and `{text}` slots of the extraction prompt.
pub fn render_extraction_prompt(text: &str, schema: &str) -> String {
    defaults::EXTRACTION_PROMPT
        .replace("{schema}", schema)
        .replace("{text}", text)
}
