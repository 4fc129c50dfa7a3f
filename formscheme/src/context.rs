//! ValidationContext — the mutable, reactive runtime binding of one scheme to
//! one editing session.
//!
//! Pull-based reactivity: a write marks the target leaf and its ancestors
//! dirty by clearing their memo cells; reads recompute lazily and memoize
//! until the next invalidating write. A read immediately following a write
//! always observes its effect. Implemented as an arena of cells addressed by
//! dotted field path, with parent links — no ambient dependency tracking.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::descriptor::FieldKind;
use crate::error::{ContextError, ContextResult};
use crate::scheme::Scheme;
use crate::types::Value;

#[derive(Debug, Clone)]
struct LeafState {
    value: Value,
    errors: Vec<String>,
}

#[derive(Debug, Clone)]
struct CompositeState {
    value: Value,
    valid: bool,
}

#[derive(Debug)]
enum CellNode {
    Leaf {
        display: Option<String>,
        edited: bool,
        derived: OnceCell<LeafState>,
    },
    Composite {
        children: Vec<usize>,
        derived: OnceCell<CompositeState>,
    },
}

#[derive(Debug)]
struct Cell {
    path: String,
    parent: Option<usize>,
    node: CellNode,
}

/// Reactive editing state layered over an immutable [`Scheme`].
///
/// Owned by exactly one editing session; the scheme it binds to is read-only
/// and may back any number of independent contexts. Discard the context when
/// editing ends — it has no persistence responsibility.
#[derive(Debug)]
pub struct ValidationContext {
    scheme: Arc<Scheme>,
    cells: Vec<Cell>,
    index: HashMap<String, usize>,
    roots: Vec<usize>,
    aggregate: OnceCell<bool>,
}

impl ValidationContext {
    /// Create a pristine context: no input yet, kind defaults applied.
    pub fn new(scheme: Arc<Scheme>) -> Self {
        let mut cells = Vec::new();
        let mut index = HashMap::new();
        let roots = build_cells(&scheme, "", None, &mut cells, &mut index);
        debug!(cells = cells.len(), "validation context created");
        Self {
            scheme,
            cells,
            index,
            roots,
            aggregate: OnceCell::new(),
        }
    }

    /// Create a context seeded with display values, e.g. from a previously
    /// persisted model. Seeded fields remain pristine — only user edits mark
    /// them dirty. Unknown or non-leaf paths error.
    pub fn with_initial<I, P, V>(scheme: Arc<Scheme>, values: I) -> ContextResult<Self>
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: Into<String>,
    {
        let mut ctx = Self::new(scheme);
        for (path, value) in values {
            let value = value.into();
            ctx.set_display_value(path.as_ref(), Some(value.as_str()))?;
        }
        for cell in &mut ctx.cells {
            if let CellNode::Leaf { edited, .. } = &mut cell.node {
                *edited = false;
            }
        }
        Ok(ctx)
    }

    /// The scheme this context is bound to.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Record new display input for a leaf field and invalidate its derived
    /// state, transitively through every nested ancestor and the aggregate.
    pub fn set_display_value(&mut self, path: &str, value: Option<&str>) -> ContextResult<()> {
        let id = self.cell_id(path)?;
        match &mut self.cells[id].node {
            CellNode::Leaf {
                display,
                edited,
                derived,
            } => {
                *display = value.map(str::to_string);
                *edited = true;
                *derived = OnceCell::new();
            }
            CellNode::Composite { .. } => {
                return Err(ContextError::NotALeaf {
                    path: path.to_string(),
                })
            }
        }
        trace!(path, "display value updated");

        let mut parent = self.cells[id].parent;
        while let Some(p) = parent {
            if let CellNode::Composite { derived, .. } = &mut self.cells[p].node {
                *derived = OnceCell::new();
            }
            parent = self.cells[p].parent;
        }
        self.aggregate = OnceCell::new();
        Ok(())
    }

    /// The latest display input for a leaf field.
    pub fn display_value_for(&self, path: &str) -> ContextResult<Option<String>> {
        let id = self.cell_id(path)?;
        match &self.cells[id].node {
            CellNode::Leaf { display, .. } => Ok(display.clone()),
            CellNode::Composite { .. } => Err(ContextError::NotALeaf {
                path: path.to_string(),
            }),
        }
    }

    /// The current model value for a field: the conversion of the latest
    /// display input for a leaf, or the object composed from children for a
    /// nested field. Memoized until the next invalidating write.
    pub fn model_value_for(&self, path: &str) -> ContextResult<Value> {
        let id = self.cell_id(path)?;
        Ok(self.value_and_valid(id).0)
    }

    /// Current validator messages for a field, in registration order. For a
    /// nested field, the concatenation of its descendants' messages in scheme
    /// order.
    pub fn errors_for(&self, path: &str) -> ContextResult<Vec<String>> {
        let id = self.cell_id(path)?;
        Ok(self.collect_errors(id))
    }

    /// Per-field validity: empty error list for a leaf, all children valid
    /// for a nested field.
    pub fn is_valid_for(&self, path: &str) -> ContextResult<bool> {
        let id = self.cell_id(path)?;
        Ok(self.value_and_valid(id).1)
    }

    /// Whether a field has received no edit since the context was created.
    /// For a nested field, whether all of its descendants are pristine.
    pub fn is_pristine(&self, path: &str) -> ContextResult<bool> {
        let id = self.cell_id(path)?;
        Ok(self.pristine(id))
    }

    /// Aggregate validity: the logical AND of every leaf's validity in the
    /// tree. Never stale — consistent with the latest inputs.
    pub fn is_valid(&self) -> bool {
        *self
            .aggregate
            .get_or_init(|| self.roots.iter().all(|&id| self.value_and_valid(id).1))
    }

    /// Assemble the full model object from all current leaf model values.
    /// Refuses while any leaf is invalid, so partially-valid objects never
    /// escape the engine.
    pub fn snapshot(&self) -> ContextResult<serde_json::Value> {
        if !self.is_valid() {
            return Err(ContextError::IncompleteModel {
                invalid: self.invalid_paths(),
            });
        }
        let mut object = serde_json::Map::new();
        for &id in &self.roots {
            let (value, _) = self.value_and_valid(id);
            object.insert(field_name(&self.cells[id].path).to_string(), value.to_json());
        }
        Ok(serde_json::Value::Object(object))
    }

    // --- Internal ---

    fn cell_id(&self, path: &str) -> ContextResult<usize> {
        self.index
            .get(path)
            .copied()
            .ok_or_else(|| ContextError::UnknownField {
                path: path.to_string(),
            })
    }

    fn value_and_valid(&self, id: usize) -> (Value, bool) {
        match &self.cells[id].node {
            CellNode::Leaf {
                display, derived, ..
            } => {
                let state = derived.get_or_init(|| self.compute_leaf(id, display.as_deref()));
                (state.value.clone(), state.errors.is_empty())
            }
            CellNode::Composite { children, derived } => {
                let state = derived.get_or_init(|| self.compute_composite(children));
                (state.value.clone(), state.valid)
            }
        }
    }

    fn compute_leaf(&self, id: usize, display: Option<&str>) -> LeafState {
        let path = &self.cells[id].path;
        let descriptor = self
            .scheme
            .descriptor_at(path)
            .unwrap_or_else(|| unreachable!("cell path '{path}' is derived from the bound scheme"));
        let value = descriptor.convert_to_value(display);
        let errors = descriptor.errors_for(&value);
        trace!(path = %path, errors = errors.len(), "leaf state recomputed");
        LeafState { value, errors }
    }

    fn compute_composite(&self, children: &[usize]) -> CompositeState {
        let mut object = IndexMap::new();
        let mut valid = true;
        for &child in children {
            let (value, ok) = self.value_and_valid(child);
            valid &= ok;
            object.insert(field_name(&self.cells[child].path).to_string(), value);
        }
        CompositeState {
            value: Value::Object(object),
            valid,
        }
    }

    fn collect_errors(&self, id: usize) -> Vec<String> {
        match &self.cells[id].node {
            CellNode::Leaf {
                display, derived, ..
            } => derived
                .get_or_init(|| self.compute_leaf(id, display.as_deref()))
                .errors
                .clone(),
            CellNode::Composite { children, .. } => children
                .iter()
                .flat_map(|&child| self.collect_errors(child))
                .collect(),
        }
    }

    fn pristine(&self, id: usize) -> bool {
        match &self.cells[id].node {
            CellNode::Leaf { edited, .. } => !edited,
            CellNode::Composite { children, .. } => {
                children.iter().all(|&child| self.pristine(child))
            }
        }
    }

    fn invalid_paths(&self) -> Vec<String> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(id, cell)| match &cell.node {
                CellNode::Leaf { .. } => {
                    (!self.value_and_valid(id).1).then(|| cell.path.clone())
                }
                CellNode::Composite { .. } => None,
            })
            .collect()
    }
}

/// Flatten a scheme level into arena cells, depth first, preserving field
/// order. Returns the cell ids of this level.
fn build_cells(
    scheme: &Scheme,
    prefix: &str,
    parent: Option<usize>,
    cells: &mut Vec<Cell>,
    index: &mut HashMap<String, usize>,
) -> Vec<usize> {
    let mut ids = Vec::new();
    for (name, descriptor) in scheme.fields() {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        let id = cells.len();
        match descriptor.kind() {
            FieldKind::Nested { scheme: child } => {
                cells.push(Cell {
                    path: path.clone(),
                    parent,
                    node: CellNode::Composite {
                        children: Vec::new(),
                        derived: OnceCell::new(),
                    },
                });
                index.insert(path.clone(), id);
                let children = build_cells(child, &path, Some(id), cells, index);
                if let CellNode::Composite { children: slot, .. } = &mut cells[id].node {
                    *slot = children;
                }
            }
            _ => {
                cells.push(Cell {
                    path: path.clone(),
                    parent,
                    node: CellNode::Leaf {
                        display: None,
                        edited: false,
                        derived: OnceCell::new(),
                    },
                });
                index.insert(path, id);
            }
        }
        ids.push(id);
    }
    ids
}

fn field_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
