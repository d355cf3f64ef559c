use crate::model::CellId;

use super::perimeter::PerimeterFn;
use super::routing::EdgeRouterFn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn center(&self) -> (f32, f32) {
        (self.center_x(), self.center_y())
    }

    pub fn contains(&self, point: (f32, f32)) -> bool {
        point.0 >= self.x
            && point.0 <= self.x + self.width
            && point.1 >= self.y
            && point.1 <= self.y + self.height
    }

    /// Inflate on all four sides. Negative borders shrink.
    pub fn grown(&self, border: f32) -> Self {
        Self {
            x: self.x - border,
            y: self.y - border,
            width: self.width + 2.0 * border,
            height: self.height + 2.0 * border,
        }
    }

    pub fn union(&self, other: &Bounds) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorConstraint {
    /// Fractional anchor on the terminal bounding box, 0..=1 per axis.
    pub x: f32,
    pub y: f32,
    /// Unscaled offset applied after the fractional placement.
    pub dx: f32,
    pub dy: f32,
    /// Project the anchor onto the terminal's perimeter.
    pub perimeter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPosition {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalLabelPosition {
    Top,
    #[default]
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeDirection {
    North,
    South,
    #[default]
    East,
    West,
}

/// Typed snapshot of the geometry-relevant style keys, with strategy
/// names already resolved against the registries. Recomputed only when
/// the state is invalidated (or in always-update-style mode).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedStyle {
    pub rotation: f32,
    pub perimeter: Option<PerimeterFn>,
    pub perimeter_spacing: f32,
    pub source_perimeter_spacing: f32,
    pub target_perimeter_spacing: f32,
    pub router: Option<EdgeRouterFn>,
    /// Suppress routing even when a default strategy would apply.
    pub no_routing: bool,
    /// Floating endpoints prefer axis-aligned perimeter attachment.
    pub orthogonal: bool,
    pub exit: Option<AnchorConstraint>,
    pub entry: Option<AnchorConstraint>,
    pub label_position: LabelPosition,
    pub vertical_label_position: VerticalLabelPosition,
    pub direction: ShapeDirection,
}

/// Cached absolute-geometry projection of one cell. Owned exclusively by
/// the [`StateCache`]; everything here is derived and may be rebuilt from
/// the model at any time.
#[derive(Debug, Clone, PartialEq)]
pub struct CellState {
    pub cell: CellId,
    pub invalid: bool,
    pub invalid_style: bool,
    pub style: ResolvedStyle,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub unscaled_width: f32,
    pub unscaled_height: f32,
    /// Accumulated unscaled offset from the coordinate root; resolves
    /// descendants without re-walking ancestors.
    pub origin: (f32, f32),
    /// Label anchor displacement in absolute units.
    pub absolute_offset: (f32, f32),
    pub visible_source: Option<CellId>,
    pub visible_target: Option<CellId>,
    /// Edge polyline. Slots hold `None` while an endpoint is still
    /// unresolved; a published state has every slot filled.
    pub absolute_points: Vec<Option<(f32, f32)>>,
    /// Per-leg Euclidean lengths of `absolute_points`.
    pub segments: Vec<f32>,
    pub length: f32,
    pub terminal_distance: f32,
}

impl CellState {
    pub fn new(cell: CellId) -> Self {
        Self {
            cell,
            invalid: true,
            invalid_style: true,
            style: ResolvedStyle::default(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            unscaled_width: 0.0,
            unscaled_height: 0.0,
            origin: (0.0, 0.0),
            absolute_offset: (0.0, 0.0),
            visible_source: None,
            visible_target: None,
            absolute_points: Vec::new(),
            segments: Vec::new(),
            length: 0.0,
            terminal_distance: 0.0,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn absolute_point(&self, index: usize) -> Option<(f32, f32)> {
        self.absolute_points.get(index).copied().flatten()
    }

    pub fn first_point(&self) -> Option<(f32, f32)> {
        self.absolute_point(0)
    }

    pub fn last_point(&self) -> Option<(f32, f32)> {
        match self.absolute_points.len() {
            0 => None,
            n => self.absolute_point(n - 1),
        }
    }

    pub fn visible_terminal(&self, source: bool) -> Option<CellId> {
        if source {
            self.visible_source
        } else {
            self.visible_target
        }
    }
}

/// Pure store of [`CellState`] entries, a dense slot vector keyed by
/// `CellId`. No recomputation happens here; the view engine owns all
/// derivation logic.
#[derive(Debug, Default)]
pub struct StateCache {
    slots: Vec<Option<CellState>>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: CellId) -> Option<&CellState> {
        self.slots.get(cell.index()).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, cell: CellId) -> Option<&mut CellState> {
        self.slots.get_mut(cell.index()).and_then(|slot| slot.as_mut())
    }

    /// Existing state, or a fresh invalid one. Callers gate creation on
    /// effective visibility; the cache itself does not know the model.
    pub fn ensure(&mut self, cell: CellId) -> &mut CellState {
        if cell.index() >= self.slots.len() {
            self.slots.resize_with(cell.index() + 1, || None);
        }
        self.slots[cell.index()].get_or_insert_with(|| CellState::new(cell))
    }

    /// Detach a state for exclusive mutation; pair with [`Self::put`].
    pub fn take(&mut self, cell: CellId) -> Option<CellState> {
        self.slots.get_mut(cell.index()).and_then(|slot| slot.take())
    }

    pub fn put(&mut self, cell: CellId, state: CellState) {
        if cell.index() >= self.slots.len() {
            self.slots.resize_with(cell.index() + 1, || None);
        }
        self.slots[cell.index()] = Some(state);
    }

    /// Evict. The returned state is marked invalid so any holder of a
    /// stale copy can recognize it as dead.
    pub fn remove(&mut self, cell: CellId) -> Option<CellState> {
        let mut state = self.take(cell)?;
        state.invalid = true;
        Some(state)
    }

    pub fn contains(&self, cell: CellId) -> bool {
        self.get(cell).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellState> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CellState> {
        self.slots.iter_mut().filter_map(|slot| slot.as_mut())
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
