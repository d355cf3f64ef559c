use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::style::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(u32);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Vertex,
    Edge,
}

/// Model-space position/size descriptor for a cell.
///
/// For vertices `x,y,width,height` place the cell in its parent's frame
/// (or along the parent polyline when `relative` and the parent is an
/// edge). For edges `points` are interior waypoints and
/// `source_point`/`target_point` are fixed endpoints used only when the
/// corresponding terminal cell is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub relative: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<(f32, f32)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<(f32, f32)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_point: Option<(f32, f32)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_point: Option<(f32, f32)>,
}

impl Geometry {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            relative: false,
            offset: None,
            points: Vec::new(),
            source_point: None,
            target_point: None,
        }
    }

    pub fn relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset = Some((x, y));
        self
    }

    pub fn terminal_point(&self, source: bool) -> Option<(f32, f32)> {
        if source {
            self.source_point
        } else {
            self.target_point
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub kind: CellKind,
    pub visible: bool,
    pub collapsed: bool,
    pub geometry: Option<Geometry>,
    pub style: Style,
    parent: Option<CellId>,
    children: Vec<CellId>,
    source: Option<CellId>,
    target: Option<CellId>,
    /// Edges incident to this cell (as source or target), maintained by
    /// the tree so invalidation can reach connected edges.
    edges: Vec<CellId>,
}

impl Cell {
    fn new(kind: CellKind) -> Self {
        Self {
            kind,
            visible: true,
            collapsed: false,
            geometry: None,
            style: Style::new(),
            parent: None,
            children: Vec::new(),
            source: None,
            target: None,
            edges: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<CellId> {
        self.parent
    }

    pub fn children(&self) -> &[CellId] {
        &self.children
    }

    pub fn source(&self) -> Option<CellId> {
        self.source
    }

    pub fn target(&self) -> Option<CellId> {
        self.target
    }

    pub fn terminal(&self, source: bool) -> Option<CellId> {
        if source { self.source } else { self.target }
    }

    pub fn connected_edges(&self) -> &[CellId] {
        &self.edges
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cell {0:?} is not in the model")]
    Missing(CellId),
    #[error("cell {0:?} is not an edge")]
    NotAnEdge(CellId),
    #[error("cell {0:?} is not a vertex")]
    NotAVertex(CellId),
    #[error("moving {cell:?} under {parent:?} would create a cycle")]
    ParentCycle { cell: CellId, parent: CellId },
    #[error("the root cell cannot be moved, connected or removed")]
    RootImmutable,
}

/// The persistent cell hierarchy. Cells live in an append-only slot
/// arena; removal leaves a dead slot behind so stale `CellId` handles
/// (e.g. a dangling edge terminal) can never alias a new cell.
#[derive(Debug, Clone)]
pub struct CellTree {
    slots: Vec<Option<Cell>>,
    root: CellId,
}

impl CellTree {
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            root: CellId(0),
        };
        tree.root = tree.alloc(Cell::new(CellKind::Vertex));
        tree
    }

    pub fn root(&self) -> CellId {
        self.root
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.slots.get(id.index()).is_some_and(|slot| slot.is_some())
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.slots.get(id.index()).and_then(|slot| slot.as_ref())
    }

    fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.slots.get_mut(id.index()).and_then(|slot| slot.as_mut())
    }

    fn get(&self, id: CellId) -> Result<&Cell, ModelError> {
        self.cell(id).ok_or(ModelError::Missing(id))
    }

    fn get_mut(&mut self, id: CellId) -> Result<&mut Cell, ModelError> {
        self.cell_mut(id).ok_or(ModelError::Missing(id))
    }

    fn alloc(&mut self, cell: Cell) -> CellId {
        let id = CellId(self.slots.len() as u32);
        self.slots.push(Some(cell));
        id
    }

    /// Number of live cells, root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(idx, _)| CellId(idx as u32))
    }

    pub fn is_vertex(&self, id: CellId) -> bool {
        self.cell(id).is_some_and(|cell| cell.kind == CellKind::Vertex)
    }

    pub fn is_edge(&self, id: CellId) -> bool {
        self.cell(id).is_some_and(|cell| cell.kind == CellKind::Edge)
    }

    pub fn is_visible(&self, id: CellId) -> bool {
        self.cell(id).is_some_and(|cell| cell.visible)
    }

    pub fn is_collapsed(&self, id: CellId) -> bool {
        self.cell(id).is_some_and(|cell| cell.collapsed)
    }

    pub fn geometry(&self, id: CellId) -> Option<&Geometry> {
        self.cell(id).and_then(|cell| cell.geometry.as_ref())
    }

    pub fn style(&self, id: CellId) -> Option<&Style> {
        self.cell(id).map(|cell| &cell.style)
    }

    pub fn parent(&self, id: CellId) -> Option<CellId> {
        self.cell(id).and_then(|cell| cell.parent)
    }

    pub fn children(&self, id: CellId) -> &[CellId] {
        self.cell(id).map(|cell| cell.children()).unwrap_or(&[])
    }

    pub fn terminal(&self, edge: CellId, source: bool) -> Option<CellId> {
        self.cell(edge).and_then(|cell| cell.terminal(source))
    }

    pub fn connected_edges(&self, id: CellId) -> &[CellId] {
        self.cell(id).map(|cell| cell.connected_edges()).unwrap_or(&[])
    }

    /// True when `ancestor` lies on the parent chain of `cell`
    /// (a cell is its own ancestor).
    pub fn is_ancestor(&self, ancestor: CellId, cell: CellId) -> bool {
        let mut cursor = Some(cell);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn add_vertex(
        &mut self,
        parent: CellId,
        geometry: Geometry,
        style: Style,
    ) -> Result<CellId, ModelError> {
        self.get(parent)?;
        let mut cell = Cell::new(CellKind::Vertex);
        cell.geometry = Some(geometry);
        cell.style = style;
        cell.parent = Some(parent);
        let id = self.alloc(cell);
        self.get_mut(parent)?.children.push(id);
        Ok(id)
    }

    pub fn add_edge(
        &mut self,
        parent: CellId,
        source: Option<CellId>,
        target: Option<CellId>,
        geometry: Geometry,
        style: Style,
    ) -> Result<CellId, ModelError> {
        self.get(parent)?;
        let mut cell = Cell::new(CellKind::Edge);
        cell.geometry = Some(geometry);
        cell.style = style;
        cell.parent = Some(parent);
        let id = self.alloc(cell);
        self.get_mut(parent)?.children.push(id);
        if source.is_some() {
            self.set_terminal(id, source, true)?;
        }
        if target.is_some() {
            self.set_terminal(id, target, false)?;
        }
        Ok(id)
    }

    pub fn set_geometry(&mut self, id: CellId, geometry: Option<Geometry>) -> Result<(), ModelError> {
        self.get_mut(id)?.geometry = geometry;
        Ok(())
    }

    pub fn set_style(&mut self, id: CellId, style: Style) -> Result<(), ModelError> {
        self.get_mut(id)?.style = style;
        Ok(())
    }

    pub fn set_visible(&mut self, id: CellId, visible: bool) -> Result<(), ModelError> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_collapsed(&mut self, id: CellId, collapsed: bool) -> Result<(), ModelError> {
        self.get_mut(id)?.collapsed = collapsed;
        Ok(())
    }

    /// Connect or disconnect one end of an edge, keeping the incident-edge
    /// index of both the old and the new terminal consistent.
    pub fn set_terminal(
        &mut self,
        edge: CellId,
        terminal: Option<CellId>,
        source: bool,
    ) -> Result<(), ModelError> {
        if self.get(edge)?.kind != CellKind::Edge {
            return Err(ModelError::NotAnEdge(edge));
        }
        if let Some(terminal) = terminal {
            if terminal == self.root {
                return Err(ModelError::RootImmutable);
            }
            self.get(terminal)?;
        }
        let previous = self.get(edge)?.terminal(source);
        if previous == terminal {
            return Ok(());
        }
        if let Some(previous) = previous {
            // The other end may still reference the same terminal.
            let other = self.get(edge)?.terminal(!source);
            if other != Some(previous)
                && let Some(cell) = self.cell_mut(previous)
            {
                cell.edges.retain(|&e| e != edge);
            }
        }
        if let Some(terminal) = terminal {
            let other = self.get(edge)?.terminal(!source);
            if other != Some(terminal) {
                self.get_mut(terminal)?.edges.push(edge);
            }
        }
        let cell = self.get_mut(edge)?;
        if source {
            cell.source = terminal;
        } else {
            cell.target = terminal;
        }
        Ok(())
    }

    pub fn reparent(&mut self, cell: CellId, parent: CellId) -> Result<(), ModelError> {
        if cell == self.root {
            return Err(ModelError::RootImmutable);
        }
        self.get(parent)?;
        if self.is_ancestor(cell, parent) {
            return Err(ModelError::ParentCycle { cell, parent });
        }
        let old_parent = self.get(cell)?.parent;
        if let Some(old) = old_parent
            && let Some(old_cell) = self.cell_mut(old)
        {
            old_cell.children.retain(|&c| c != cell);
        }
        self.get_mut(cell)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(cell);
        Ok(())
    }

    /// Remove a cell and its whole subtree. Edges connected to removed
    /// cells from outside the subtree keep their (now dangling) terminal
    /// handles; `contains` reports them dead, which downgrades those edges
    /// to floating endpoints on the next validation.
    ///
    /// Returns the removed ids so the view layer can drop their states.
    pub fn remove(&mut self, cell: CellId) -> Result<Vec<CellId>, ModelError> {
        if cell == self.root {
            return Err(ModelError::RootImmutable);
        }
        let parent = self.get(cell)?.parent;
        if let Some(parent) = parent
            && let Some(parent_cell) = self.cell_mut(parent)
        {
            parent_cell.children.retain(|&c| c != cell);
        }
        let mut removed = Vec::new();
        let mut stack = vec![cell];
        while let Some(current) = stack.pop() {
            let Some(cell) = self.slots[current.index()].take() else {
                continue;
            };
            stack.extend(cell.children.iter().copied());
            // Drop the removed edge from the incident index of terminals
            // that survive the removal.
            if cell.kind == CellKind::Edge {
                for terminal in [cell.source, cell.target].into_iter().flatten() {
                    if let Some(terminal_cell) = self.cell_mut(terminal) {
                        terminal_cell.edges.retain(|&e| e != current);
                    }
                }
            }
            removed.push(current);
        }
        Ok(removed)
    }
}

impl Default for CellTree {
    fn default() -> Self {
        Self::new()
    }
}
