//! Loop forest assembly
//!
//! Converts a flat, contiguous region of segments into a forest of generic
//! [`Loop`] nodes. Each repeating unit starts with a marker segment (`HL`)
//! carrying `(id, parent_id?, code)`; the non-marker segments that follow
//! belong to that loop. The pass is O(n): markers resolve their parent
//! through an id map in amortized O(1).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use x12_segment::Segment;

use crate::SchemaError;

/// Default marker tag for hierarchical levels
pub const DEFAULT_MARKER_TAG: &str = "HL";

/// Maximum supported marker nesting depth. Real documents stay in single
/// digits; the cap keeps a pathological parent chain from exhausting the
/// stack when the forest is materialized or resolved.
pub const MAX_NESTING_DEPTH: usize = 64;

/// A generic hierarchical loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loop {
    /// Loop id as declared by its marker
    pub id: String,
    /// Parent loop id, absent for a root loop
    pub parent_id: Option<String>,
    /// Level code (e.g., "S", "O", "I")
    pub code: String,
    /// Source line of the marker segment
    pub line: usize,
    /// Non-marker segments belonging to this loop, in order
    pub segments: Vec<Segment>,
    /// Child loops in encounter order
    pub children: Vec<Loop>,
}

impl Loop {
    fn new(id: String, parent_id: Option<String>, code: String, line: usize) -> Self {
        Self {
            id,
            parent_id,
            code,
            line,
            segments: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Find direct children with the given code.
    pub fn children_with_code(&self, code: &str) -> Vec<&Loop> {
        self.children.iter().filter(|c| c.code == code).collect()
    }

    /// Find the first segment with the given tag in this loop.
    pub fn segment(&self, tag: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.is_tag(tag))
    }
}

/// Result of assembling one loop region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopForest {
    /// Root loops (markers without a parent id) in encounter order
    pub roots: Vec<Loop>,
    /// Recoverable schema errors found during assembly
    pub errors: Vec<SchemaError>,
}

impl LoopForest {
    /// Whether any schema error was recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Builder converting a flat marker region into a [`LoopForest`]
#[derive(Debug, Clone)]
pub struct LoopBuilder {
    marker_tag: String,
}

impl Default for LoopBuilder {
    fn default() -> Self {
        Self {
            marker_tag: DEFAULT_MARKER_TAG.to_string(),
        }
    }
}

impl LoopBuilder {
    /// Create a builder for the standard `HL` marker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for a custom marker tag.
    pub fn with_marker_tag(marker_tag: impl Into<String>) -> Self {
        Self {
            marker_tag: marker_tag.into(),
        }
    }

    /// Assemble the loop forest for one contiguous region.
    ///
    /// Errors never abort the build: duplicate ids keep their first
    /// occurrence, markers with a dangling parent reference are left
    /// unattached, markers past [`MAX_NESTING_DEPTH`] are rejected with a
    /// schema error, and the forest reflects whatever could be
    /// reconstructed. Sibling order is never changed.
    pub fn build(&self, segments: &[Segment]) -> LoopForest {
        // Nodes live in an append-only arena with edges as indices; the
        // owned tree is materialized from the roots at the end. Parent ids
        // only ever reference earlier-declared ids, so the forest is
        // acyclic by construction.
        let mut arena: Vec<Loop> = Vec::new();
        let mut edges: Vec<Vec<usize>> = Vec::new();
        let mut depths: Vec<usize> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut root_indexes: Vec<usize> = Vec::new();
        let mut current: Option<usize> = None;
        let mut errors: Vec<SchemaError> = Vec::new();

        for segment in segments {
            if !segment.is_tag(&self.marker_tag) {
                // Non-marker segments belong to the most recently created
                // loop, never to its parent.
                match current {
                    Some(open) => arena[open].segments.push(segment.clone()),
                    None => {
                        debug!(tag = %segment.tag, line = segment.line, "segment before first marker");
                        errors.push(SchemaError::SegmentOutsideLoop {
                            tag: segment.tag.clone(),
                            line: segment.line,
                        });
                    }
                }
                continue;
            }

            let (id, code) = match (segment.field_non_empty(1), segment.field_non_empty(3)) {
                (Some(id), Some(code)) => (id.to_string(), code.to_string()),
                (id, _) => {
                    let missing = if id.is_none() { "id" } else { "code" };
                    debug!(line = segment.line, missing, "malformed marker skipped");
                    errors.push(SchemaError::MalformedMarker {
                        line: segment.line,
                        message: format!("missing {missing}"),
                    });
                    continue;
                }
            };
            let parent_id = segment.field_non_empty(2).map(ToString::to_string);

            let node_index = arena.len();
            arena.push(Loop::new(
                id.clone(),
                parent_id.clone(),
                code,
                segment.line,
            ));
            edges.push(Vec::new());
            depths.push(1);
            // Trailing segments still accumulate on a duplicate or orphaned
            // node even though it is attached nowhere.
            current = Some(node_index);

            if index.contains_key(&id) {
                debug!(id = %id, line = segment.line, "duplicate loop id discarded");
                errors.push(SchemaError::DuplicateId {
                    id,
                    line: segment.line,
                });
                continue;
            }
            // Parent resolution happens before the id is registered, so a
            // marker naming itself as parent is a missing parent, not a cycle.
            match parent_id {
                None => root_indexes.push(node_index),
                Some(parent_id) => match index.get(&parent_id) {
                    Some(&parent_index) => {
                        // A node past the depth cap stays unindexed, so its
                        // own children resolve to a missing parent and the
                        // chain cannot grow further.
                        let depth = depths[parent_index] + 1;
                        if depth > MAX_NESTING_DEPTH {
                            debug!(id = %id, line = segment.line, "nesting depth cap reached");
                            errors.push(SchemaError::NestingTooDeep {
                                id,
                                line: segment.line,
                                limit: MAX_NESTING_DEPTH,
                            });
                            continue;
                        }
                        depths[node_index] = depth;
                        edges[parent_index].push(node_index);
                    }
                    None => {
                        debug!(id = %id, parent = %parent_id, "missing parent reference");
                        errors.push(SchemaError::MissingParent {
                            id: id.clone(),
                            parent_id,
                            line: segment.line,
                        });
                    }
                },
            }
            index.insert(id, node_index);
        }

        let roots = root_indexes
            .into_iter()
            .map(|root| Self::materialize(&arena, &edges, root))
            .collect();

        LoopForest { roots, errors }
    }

    fn materialize(arena: &[Loop], edges: &[Vec<usize>], index: usize) -> Loop {
        let mut node = arena[index].clone();
        for &child in &edges[index] {
            node.children.push(Self::materialize(arena, edges, child));
        }
        node
    }
}
