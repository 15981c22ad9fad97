//! Entity/relationship extraction and graph enrichment.
//!
//! Player input is handed to the LLM with a structured-output prompt; the
//! result is parsed strictly into [`ExtractedData`] and then merged into the
//! graph. Labels, relationship types and property keys reach the query text
//! and are sanitized first; all values stay parameterized.

use std::sync::Arc;

use storyloom_domain::{ExtractedData, ExtractedNode, ExtractedRelationship};

use crate::infrastructure::ports::{
    params, ChatMessage, ExtractError, GraphStore, LlmPort, LlmRequest, StoreError, StoreValue,
};
use crate::prompt_templates::render_extraction_prompt;

/// Extracts knowledge-graph fragments from free-form player input.
pub struct EntityExtractor {
    llm: Arc<dyn LlmPort>,
    /// Optional schema constraint appended to the prompt.
    schema: String,
}

impl EntityExtractor {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        Self {
            llm,
            schema: String::new(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Extract nodes and relationships from `text`.
    ///
    /// Fails loudly on anything that is not the requested JSON shape; a
    /// missing `nodes` or `relationships` key defaults to empty, matching
    /// models that omit empty arrays.
    pub async fn extract(&self, text: &str) -> Result<ExtractedData, ExtractError> {
        if text.trim().is_empty() {
            return Err(ExtractError::EmptyInput);
        }

        let prompt = render_extraction_prompt(text, &self.schema);
        let request = LlmRequest::new(vec![ChatMessage::user(prompt)]).with_temperature(0.0);
        let response = self.llm.generate(request).await?;

        let raw = response.content.trim();
        serde_json::from_str::<ExtractedData>(raw)
            .map_err(|e| ExtractError::Malformed(format!("{e}: {raw}")))
    }
}

/// Merges extracted fragments into the story graph.
pub struct GraphEnricher {
    store: Arc<dyn GraphStore>,
}

impl GraphEnricher {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Upsert every extracted node, then every relationship.
    ///
    /// Nodes or relationships whose label/type does not sanitize to a valid
    /// identifier are skipped with a warning rather than failing the batch.
    pub async fn apply(&self, data: &ExtractedData) -> Result<(), StoreError> {
        for node in &data.nodes {
            self.upsert_node(node).await?;
        }
        for rel in &data.relationships {
            self.upsert_relationship(rel).await?;
        }
        Ok(())
    }

    async fn upsert_node(&self, node: &ExtractedNode) -> Result<(), StoreError> {
        let Some(label) = sanitize_identifier(&node.label) else {
            tracing::warn!(label = %node.label, id = %node.id, "skipping node with invalid label");
            return Ok(());
        };

        let mut text = format!("MERGE (n:{label} {{id: $id}})");
        let mut bindings = params([("id", node.id.as_str().into())]);
        let mut bound = 0;
        for (key, value) in &node.properties {
            let Some(key) = sanitize_identifier(key) else {
                tracing::warn!(key = %key, id = %node.id, "skipping invalid property key");
                continue;
            };
            let slot = format!("p{bound}");
            text.push_str(&format!(
                "{} n.{key} = ${slot}",
                if bound == 0 { " SET" } else { "," }
            ));
            bindings.push((slot, StoreValue::String(value.clone())));
            bound += 1;
        }

        self.store.run(&text, bindings).await
    }

    async fn upsert_relationship(&self, rel: &ExtractedRelationship) -> Result<(), StoreError> {
        let Some(rel_type) = sanitize_identifier(&rel.rel_type) else {
            tracing::warn!(rel_type = %rel.rel_type, "skipping relationship with invalid type");
            return Ok(());
        };

        let mut text = format!(
            "MATCH (a {{id: $start_id}}), (b {{id: $end_id}}) MERGE (a)-[r:{rel_type}]->(b)"
        );
        let mut bindings = params([
            ("start_id", rel.start_node_id.as_str().into()),
            ("end_id", rel.end_node_id.as_str().into()),
        ]);
        let mut bound = 0;
        for (key, value) in &rel.properties {
            let Some(key) = sanitize_identifier(key) else {
                tracing::warn!(key = %key, rel_type = %rel.rel_type, "skipping invalid property key");
                continue;
            };
            let slot = format!("p{bound}");
            text.push_str(&format!(
                "{} r.{key} = ${slot}",
                if bound == 0 { " SET" } else { "," }
            ));
            bindings.push((slot, StoreValue::String(value.clone())));
            bound += 1;
        }

        self.store.run(&text, bindings).await
    }
}

/// Restrict an LLM-produced identifier to `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Returns `None` when nothing usable remains, so callers can skip the
/// fragment instead of interpolating arbitrary text into query syntax.
pub fn sanitize_identifier(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    let valid_start = cleaned
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start {
        Some(cleaned)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{LlmError, LlmResponse, MockLlmPort};
    use crate::test_fixtures::InMemoryGraphStore;

    #[test]
    fn sanitize_keeps_plain_identifiers() {
        assert_eq!(sanitize_identifier("Character"), Some("Character".into()));
        assert_eq!(sanitize_identifier("KNOWS"), Some("KNOWS".into()));
        assert_eq!(sanitize_identifier("_private"), Some("_private".into()));
    }

    #[test]
    fn sanitize_strips_query_syntax() {
        assert_eq!(
            sanitize_identifier("Character) DETACH DELETE (n"),
            Some("CharacterDETACHDELETEn".into())
        );
        assert_eq!(sanitize_identifier("1starts_with_digit"), None);
        assert_eq!(sanitize_identifier("***"), None);
        assert_eq!(sanitize_identifier(""), None);
    }

    #[tokio::test]
    async fn extract_parses_structured_output() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().returning(|_| {
            Ok(LlmResponse {
                content: r#"{"nodes": [{"id": "0", "label": "Character",
                    "properties": {"name": "Taehoon"}}],
                    "relationships": [{"type": "KNOWS", "start_node_id": "0",
                    "end_node_id": "1", "properties": {}}]}"#
                    .to_string(),
            })
        });
        let extractor = EntityExtractor::new(Arc::new(llm));

        let data = extractor.extract("I greet Taehoon").await.unwrap();

        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].label, "Character");
        assert_eq!(data.relationships[0].rel_type, "KNOWS");
    }

    #[tokio::test]
    async fn extract_rejects_empty_input() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().never();
        let extractor = EntityExtractor::new(Arc::new(llm));

        assert!(matches!(
            extractor.extract("   ").await,
            Err(ExtractError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn extract_rejects_prose_output() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().returning(|_| {
            Ok(LlmResponse {
                content: "Sure! Here are the entities I found: ...".to_string(),
            })
        });
        let extractor = EntityExtractor::new(Arc::new(llm));

        assert!(matches!(
            extractor.extract("hello").await,
            Err(ExtractError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn extract_propagates_llm_failure() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .returning(|_| Err(LlmError::RequestFailed("down".into())));
        let extractor = EntityExtractor::new(Arc::new(llm));

        assert!(matches!(
            extractor.extract("hello").await,
            Err(ExtractError::Llm(_))
        ));
    }

    #[tokio::test]
    async fn enricher_skips_invalid_labels_and_writes_the_rest() {
        let store = Arc::new(InMemoryGraphStore::new());
        let enricher = GraphEnricher::new(store.clone());

        let data: ExtractedData = serde_json::from_str(
            r#"{"nodes": [
                {"id": "0", "label": "Character", "properties": {"name": "Guard"}},
                {"id": "1", "label": "***", "properties": {}}
            ], "relationships": []}"#,
        )
        .unwrap();

        enricher.apply(&data).await.unwrap();

        let writes = store.writes();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].0.contains("MERGE (n:Character {id: $id})"));
        assert!(writes[0].0.contains("SET n.name = $p0"));
    }

    #[tokio::test]
    async fn enricher_parameterizes_property_values() {
        let store = Arc::new(InMemoryGraphStore::new());
        let enricher = GraphEnricher::new(store.clone());

        let data: ExtractedData = serde_json::from_str(
            r#"{"nodes": [{"id": "0", "label": "Item",
                "properties": {"name": "a') DETACH DELETE (n"}}],
                "relationships": []}"#,
        )
        .unwrap();

        enricher.apply(&data).await.unwrap();

        let writes = store.writes();
        assert!(!writes[0].0.contains("DETACH"));
        let bound = writes[0]
            .1
            .iter()
            .find(|(name, _)| name == "p0")
            .map(|(_, v)| v.clone());
        assert_eq!(
            bound,
            Some(StoreValue::String("a') DETACH DELETE (n".into()))
        );
    }
}
