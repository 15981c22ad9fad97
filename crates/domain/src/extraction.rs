//! Structured entity/relationship records produced by the entity extractor.
//!
//! This is the wire schema the extraction prompt asks the LLM for; the
//! enrichment step upserts these into the graph. Properties are kept as
//! string maps, matching the flat property model of the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Entities and relationships extracted from one turn's input.
///
/// Overwritten each turn; captured into the session before the graph
/// mutation that consumes it, so a partial failure cannot lose it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(default)]
    pub nodes: Vec<ExtractedNode>,
    #[serde(default)]
    pub relationships: Vec<ExtractedRelationship>,
}

impl ExtractedData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRelationship {
    #[serde(rename = "type")]
    pub rel_type: String,
    pub start_node_id: String,
    pub end_node_id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}
