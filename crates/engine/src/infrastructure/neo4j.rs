//! Neo4j implementation of the graph store port.

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query, Row};

use crate::infrastructure::ports::{GraphStore, Params, Record, StoreError, StoreValue};

/// Node label under which session records are persisted.
const SESSION_LABEL: &str = "GameSession";

/// Graph store backed by a Neo4j (or Memgraph) bolt connection.
#[derive(Clone)]
pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    pub async fn connect(
        uri: &str,
        user: &str,
        password: &str,
        database: &str,
    ) -> anyhow::Result<Self> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .db(database)
            .build()?;

        let graph = Graph::connect(config).await?;
        tracing::info!("Connected to graph store at {}", uri);

        Ok(Self { graph })
    }

    pub fn from_graph(graph: Graph) -> Self {
        Self { graph }
    }

    /// Create uniqueness constraints, tolerating servers that already have
    /// them or don't support the syntax.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        let constraints = [
            "CREATE CONSTRAINT scene_id IF NOT EXISTS FOR (s:Scene) REQUIRE s.id IS UNIQUE",
            "CREATE CONSTRAINT beat_id IF NOT EXISTS FOR (b:SceneBeat) REQUIRE b.id IS UNIQUE",
            "CREATE CONSTRAINT map_id IF NOT EXISTS FOR (m:Map) REQUIRE m.id IS UNIQUE",
            "CREATE CONSTRAINT character_id IF NOT EXISTS FOR (c:Character) REQUIRE c.id IS UNIQUE",
            "CREATE CONSTRAINT session_id IF NOT EXISTS FOR (gs:GameSession) REQUIRE gs.id IS UNIQUE",
        ];

        for constraint in constraints {
            if let Err(e) = self.graph.run(neo4rs::query(constraint)).await {
                tracing::warn!("Constraint creation warning: {}", e);
            }
        }

        tracing::info!("Graph schema initialized");
        Ok(())
    }

    fn bind(mut query: Query, params: Params) -> Query {
        for (name, value) in params {
            query = match value {
                StoreValue::Null => query.param(&name, None::<String>),
                StoreValue::Bool(b) => query.param(&name, b),
                StoreValue::Int(i) => query.param(&name, i),
                StoreValue::Float(f) => query.param(&name, f),
                StoreValue::String(s) => query.param(&name, s),
                StoreValue::StringList(items) => query.param(&name, items),
            };
        }
        query
    }

    /// Read one projected column out of a row, trying each flat type the
    /// store model allows. A missing or null column decodes to `Null`.
    fn column_value(row: &Row, column: &str) -> StoreValue {
        if let Ok(s) = row.get::<String>(column) {
            return StoreValue::String(s);
        }
        if let Ok(b) = row.get::<bool>(column) {
            return StoreValue::Bool(b);
        }
        if let Ok(i) = row.get::<i64>(column) {
            return StoreValue::Int(i);
        }
        if let Ok(f) = row.get::<f64>(column) {
            return StoreValue::Float(f);
        }
        if let Ok(items) = row.get::<Vec<String>>(column) {
            return StoreValue::StringList(items);
        }
        StoreValue::Null
    }

    fn collect_columns(row: &Row, columns: &[&str]) -> Record {
        columns
            .iter()
            .map(|&column| (column.to_string(), Self::column_value(row, column)))
            .collect()
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn query(
        &self,
        text: &str,
        params: Params,
        columns: &[&str],
    ) -> Result<Vec<Record>, StoreError> {
        let query = Self::bind(neo4rs::query(text), params);
        let mut result = self
            .graph
            .execute(query)
            .await
            .map_err(|e| StoreError::database("query", e))?;

        let mut records = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| StoreError::database("query", e))?
        {
            records.push(Self::collect_columns(&row, columns));
        }
        Ok(records)
    }

    async fn run(&self, text: &str, params: Params) -> Result<(), StoreError> {
        let query = Self::bind(neo4rs::query(text), params);
        self.graph
            .run(query)
            .await
            .map_err(|e| StoreError::database("write", e))
    }

    async fn save(&self, key: &str, record: Record) -> Result<(), StoreError> {
        if record.is_empty() {
            return Ok(());
        }

        // Field names come from the fixed persistence schema, never from
        // user input, so interpolating them into the SET clause is safe.
        let assignments = record
            .keys()
            .map(|field| format!("gs.{field} = ${field}"))
            .collect::<Vec<_>>()
            .join(", ");
        let text = format!("MERGE (gs:{SESSION_LABEL} {{id: $id}}) SET {assignments}");

        let mut query = neo4rs::query(&text).param("id", key.to_string());
        query = Self::bind(query, record.into_iter().collect());

        self.graph
            .run(query)
            .await
            .map_err(|e| StoreError::database("save", e))
    }

    async fn load(&self, key: &str, fields: &[&str]) -> Result<Option<Record>, StoreError> {
        let projection = fields
            .iter()
            .map(|field| format!("gs.{field} AS {field}"))
            .collect::<Vec<_>>()
            .join(", ");
        let text = format!("MATCH (gs:{SESSION_LABEL} {{id: $id}}) RETURN {projection}");

        let query = neo4rs::query(&text).param("id", key.to_string());
        let mut result = self
            .graph
            .execute(query)
            .await
            .map_err(|e| StoreError::database("load", e))?;

        let row = result
            .next()
            .await
            .map_err(|e| StoreError::database("load", e))?;

        Ok(row.map(|row| Self::collect_columns(&row, fields)))
    }

    async fn close(&self) {
        // neo4rs closes the connection pool on drop.
        tracing::debug!("Graph store connection released");
    }
}
