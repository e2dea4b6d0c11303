//! SQLite-backed graph store.
//!
//! Uses `rusqlite` (with bundled SQLite) wrapped in an `Arc<Mutex<Connection>>`
//! to satisfy the `Send + Sync` requirements. All blocking calls are offloaded
//! to a thread-pool via `tokio::task::spawn_blocking`.
//!
//! # Schema
//!
//! - `nodes`: label, JSON property map, and the denormalised `user_id`
//!   (`unique_key`) that backs the `(label, user_id)` uniqueness constraint.
//! - `edges`: `(source, target, rel_type)` primary key; rows cascade away
//!   with either endpoint.
//!
//! Template property filters are evaluated with `json_extract`, so any
//! property can be matched, not only `user_id`.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use friendgraph::{
    validate_label, validate_template, Direction, Edge, EdgeOp, Node, NodeId, NodeTemplate, Page,
    Properties, RelType, USER_ID_KEY,
};
use rusqlite::{params, Connection, ErrorCode};

use super::{exactly_one, GraphError, GraphStore};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS nodes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    label       TEXT NOT NULL,
    properties  TEXT NOT NULL,
    unique_key  TEXT
);
-- NULL unique_key values never collide, so nodes without a user_id are unconstrained.
CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_unique_key ON nodes(label, unique_key);

CREATE TABLE IF NOT EXISTS edges (
    source    INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    target    INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    rel_type  TEXT NOT NULL,
    PRIMARY KEY (source, target, rel_type)
);
CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target, rel_type);
";

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// SQLite-backed implementation of [`GraphStore`].
///
/// Holds a single database connection protected by a `Mutex`. All operations
/// run inside `spawn_blocking` to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `path` and apply the schema.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database (data is lost when dropped).
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking thread-pool.
    async fn call<T, F>(&self, f: F) -> Result<T, GraphError>
    where
        F: FnOnce(&mut Connection) -> Result<T, GraphError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut *conn)
        })
        .await
        .map_err(GraphError::failed)?
    }
}

// ---------------------------------------------------------------------------
// Error conversions
// ---------------------------------------------------------------------------

fn map_err(e: rusqlite::Error) -> GraphError {
    GraphError::failed(e)
}

fn map_json_err(e: serde_json::Error) -> GraphError {
    GraphError::failed(e)
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation)
}

fn duplicate(label: &str, properties: &Properties) -> GraphError {
    let mut template = NodeTemplate::labelled(label);
    if let Some(id) = properties.get(USER_ID_KEY) {
        template = template.with_property(USER_ID_KEY, id.clone());
    }
    GraphError::DuplicateNode(template.to_string())
}

// ---------------------------------------------------------------------------
// Dynamic query parameter helper
// ---------------------------------------------------------------------------

/// Typed SQL parameter for building dynamic WHERE clauses.
enum SqlParam {
    Text(String),
    Integer(i64),
}

impl rusqlite::ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value};
        match self {
            SqlParam::Text(s) => Ok(ToSqlOutput::Owned(Value::Text(s.clone()))),
            SqlParam::Integer(i) => Ok(ToSqlOutput::Owned(Value::Integer(*i))),
        }
    }
}

fn clamp_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Query helpers (run on the blocking pool, inside or outside a transaction)
// ---------------------------------------------------------------------------

fn decode_node(id: NodeId, label: String, properties: &str) -> Result<Node, GraphError> {
    Ok(Node {
        id,
        label,
        properties: serde_json::from_str(properties).map_err(map_json_err)?,
    })
}

fn query_nodes(
    conn: &Connection,
    sql: &str,
    params_vec: &[SqlParam],
) -> Result<Vec<Node>, GraphError> {
    let params_refs: Vec<&dyn rusqlite::ToSql> =
        params_vec.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

    let mut stmt = conn.prepare(sql).map_err(map_err)?;
    let rows: Vec<(NodeId, String, String)> = stmt
        .query_map(params_refs.as_slice(), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)?;

    rows.into_iter()
        .map(|(id, label, props)| decode_node(id, label, &props))
        .collect()
}

/// Nodes matching an already-validated template, ordered by id.
fn match_nodes(conn: &Connection, template: &NodeTemplate) -> Result<Vec<Node>, GraphError> {
    let mut sql = String::from("SELECT id, label, properties FROM nodes WHERE 1=1");
    let mut params_vec: Vec<SqlParam> = Vec::new();

    if let Some(label) = &template.label {
        sql.push_str(" AND label = ?");
        params_vec.push(SqlParam::Text(label.clone()));
    }

    for (key, value) in &template.properties {
        sql.push_str(" AND json_extract(properties, ?) = ?");
        params_vec.push(SqlParam::Text(format!("$.{key}")));
        params_vec.push(SqlParam::Text(value.clone()));
    }

    sql.push_str(" ORDER BY id ASC");
    query_nodes(conn, &sql, &params_vec)
}

fn resolve(conn: &Connection, template: &NodeTemplate) -> Result<NodeId, GraphError> {
    validate_template(template)?;
    let node = exactly_one(template, match_nodes(conn, template)?)?;
    Ok(node.id)
}

fn has_edge(conn: &Connection, edge: &Edge) -> Result<bool, GraphError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM edges WHERE source = ?1 AND target = ?2 AND rel_type = ?3",
            params![edge.source, edge.target, edge.rel_type.as_str()],
            |row| row.get(0),
        )
        .map_err(map_err)?;
    Ok(count > 0)
}

fn apply_ops(conn: &Connection, ops: &[EdgeOp]) -> Result<Vec<Edge>, GraphError> {
    let mut created = Vec::new();

    for op in ops {
        let spec = op.spec();
        let edge = Edge {
            source: resolve(conn, &spec.from)?,
            target: resolve(conn, &spec.to)?,
            rel_type: spec.rel_type,
        };
        match op {
            EdgeOp::Create(_) => {
                if has_edge(conn, &edge)? {
                    return Err(GraphError::edge_exists(spec));
                }
                conn.execute(
                    "INSERT INTO edges (source, target, rel_type) VALUES (?1, ?2, ?3)",
                    params![edge.source, edge.target, edge.rel_type.as_str()],
                )
                .map_err(map_err)?;
                created.push(edge);
            }
            EdgeOp::Delete(_) => {
                let removed = conn
                    .execute(
                        "DELETE FROM edges WHERE source = ?1 AND target = ?2 AND rel_type = ?3",
                        params![edge.source, edge.target, edge.rel_type.as_str()],
                    )
                    .map_err(map_err)?;
                if removed == 0 {
                    return Err(GraphError::edge_not_found(spec));
                }
            }
            EdgeOp::RequireAbsent(_) => {
                if has_edge(conn, &edge)? {
                    return Err(GraphError::edge_exists(spec));
                }
            }
        }
    }

    Ok(created)
}

// ---------------------------------------------------------------------------
// GraphStore impl
// ---------------------------------------------------------------------------

#[async_trait]
impl GraphStore for SqliteStore {
    // --- Nodes ---------------------------------------------------------------

    async fn find_nodes(&self, template: &NodeTemplate) -> Result<Vec<Node>, GraphError> {
        validate_template(template)?;
        let template = template.clone();
        self.call(move |conn| match_nodes(conn, &template)).await
    }

    async fn create_node(&self, label: &str, properties: &Properties) -> Result<Node, GraphError> {
        validate_label(label)?;
        let label = label.to_string();
        let properties = properties.clone();

        self.call(move |conn| {
            let data = serde_json::to_string(&properties).map_err(map_json_err)?;
            let result = conn.execute(
                "INSERT INTO nodes (label, properties, unique_key) VALUES (?1, ?2, ?3)",
                params![label, data, properties.get(USER_ID_KEY)],
            );
            match result {
                Ok(_) => Ok(Node {
                    id: conn.last_insert_rowid(),
                    label,
                    properties,
                }),
                Err(e) if is_constraint_violation(&e) => Err(duplicate(&label, &properties)),
                Err(e) => Err(map_err(e)),
            }
        })
        .await
    }

    async fn update_node(
        &self,
        template: &NodeTemplate,
        changes: &Properties,
    ) -> Result<Vec<Node>, GraphError> {
        validate_template(template)?;
        let template = template.clone();
        let changes = changes.clone();

        self.call(move |conn| {
            let tx = conn.transaction().map_err(map_err)?;
            let mut updated = match_nodes(&tx, &template)?;

            for node in &mut updated {
                node.properties
                    .extend(changes.iter().map(|(k, v)| (k.clone(), v.clone())));
                let data = serde_json::to_string(&node.properties).map_err(map_json_err)?;
                let result = tx.execute(
                    "UPDATE nodes SET properties = ?1, unique_key = ?2 WHERE id = ?3",
                    params![data, node.properties.get(USER_ID_KEY), node.id],
                );
                match result {
                    Ok(_) => {}
                    Err(e) if is_constraint_violation(&e) => {
                        return Err(duplicate(&node.label, &node.properties))
                    }
                    Err(e) => return Err(map_err(e)),
                }
            }

            tx.commit().map_err(map_err)?;
            Ok(updated)
        })
        .await
    }

    async fn delete_nodes(&self, template: &NodeTemplate) -> Result<Option<usize>, GraphError> {
        validate_template(template)?;
        let template = template.clone();

        self.call(move |conn| {
            let tx = conn.transaction().map_err(map_err)?;
            let doomed = match_nodes(&tx, &template)?;
            if doomed.is_empty() {
                return Ok(None);
            }
            for node in &doomed {
                tx.execute("DELETE FROM nodes WHERE id = ?1", params![node.id])
                    .map_err(map_err)?;
            }
            tx.commit().map_err(map_err)?;
            Ok(Some(doomed.len()))
        })
        .await
    }

    // --- Edges ---------------------------------------------------------------

    async fn apply(&self, ops: &[EdgeOp]) -> Result<Vec<Edge>, GraphError> {
        let ops = ops.to_vec();

        self.call(move |conn| {
            let tx = conn.transaction().map_err(map_err)?;
            match apply_ops(&tx, &ops) {
                Ok(created) => {
                    tx.commit().map_err(map_err)?;
                    Ok(created)
                }
                // Dropping `tx` rolls the batch back.
                Err(e) => {
                    tracing::debug!("edge batch rolled back: {e}");
                    Err(e)
                }
            }
        })
        .await
    }

    async fn edges_between(
        &self,
        a: &NodeTemplate,
        b: &NodeTemplate,
    ) -> Result<Vec<(Direction, RelType)>, GraphError> {
        let a = a.clone();
        let b = b.clone();

        self.call(move |conn| {
            let (a, b) = (resolve(conn, &a)?, resolve(conn, &b)?);
            let mut stmt = conn
                .prepare(
                    "SELECT source, rel_type FROM edges
                     WHERE (source = ?1 AND target = ?2) OR (source = ?2 AND target = ?1)
                     ORDER BY rel_type, source",
                )
                .map_err(map_err)?;
            let rows = stmt
                .query_map(params![a, b], |row| {
                    Ok((row.get::<_, NodeId>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(map_err)?;

            let mut edges = Vec::new();
            for row in rows {
                let (source, rel_type) = row.map_err(map_err)?;
                let rel_type = rel_type.parse::<RelType>().map_err(|e| {
                    GraphError::failed(std::io::Error::other(format!("stored rel_type: {e}")))
                })?;
                let direction = if source == a {
                    Direction::Outgoing
                } else {
                    Direction::Incoming
                };
                edges.push((direction, rel_type));
            }
            Ok(edges)
        })
        .await
    }

    async fn neighbors(
        &self,
        template: &NodeTemplate,
        rel_type: RelType,
        direction: Direction,
        page: Page,
    ) -> Result<Vec<Node>, GraphError> {
        validate_template(template)?;
        let template = template.clone();

        self.call(move |conn| {
            let anchors = match_nodes(conn, &template)?;
            if anchors.is_empty() {
                return Ok(vec![]);
            }

            let (anchor_col, far_col) = match direction {
                Direction::Outgoing => ("source", "target"),
                Direction::Incoming => ("target", "source"),
            };
            let placeholders: Vec<&str> = anchors.iter().map(|_| "?").collect();
            let sql = format!(
                "SELECT DISTINCT n.id, n.label, n.properties
                 FROM edges e JOIN nodes n ON n.id = e.{far_col}
                 WHERE e.rel_type = ? AND e.{anchor_col} IN ({})
                 ORDER BY n.id ASC LIMIT ? OFFSET ?",
                placeholders.join(",")
            );

            let mut params_vec = vec![SqlParam::Text(rel_type.as_str().to_string())];
            params_vec.extend(anchors.iter().map(|n| SqlParam::Integer(n.id)));
            params_vec.push(SqlParam::Integer(clamp_i64(page.limit)));
            params_vec.push(SqlParam::Integer(clamp_i64(page.offset)));

            query_nodes(conn, &sql, &params_vec)
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
