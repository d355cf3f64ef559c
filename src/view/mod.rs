pub mod perimeter;
pub mod routing;
pub mod state;

pub use state::{AnchorConstraint, Bounds, CellState, ResolvedStyle};

use std::collections::HashSet;

use crate::config::ViewConfig;
use crate::model::{CellId, CellTree, Geometry};
use crate::style::{Style, keys};

use perimeter::PerimeterRegistry;
use routing::{RouteInputs, RouterRegistry};
use state::{LabelPosition, ShapeDirection, StateCache, VerticalLabelPosition};

/// Called for every cell state whose geometry just became valid, in
/// parent-before-child, terminal-before-edge order. This ordering is a
/// published guarantee; painters may rely on it for z-order.
pub trait RenderListener {
    fn state_ready(&mut self, cell: CellId, state: &CellState);
}

/// The view engine: reconciles the render-state cache with the cell tree
/// under a single scale/translate frame. Reads the model, writes only
/// the cache; all validation is synchronous and idempotent.
pub struct GraphView {
    config: ViewConfig,
    scale: f32,
    translate: (f32, f32),
    current_root: Option<CellId>,
    perimeters: PerimeterRegistry,
    routers: RouterRegistry,
    states: StateCache,
    graph_bounds: Bounds,
    listener: Option<Box<dyn RenderListener>>,
}

impl GraphView {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            scale: 1.0,
            translate: (0.0, 0.0),
            current_root: None,
            perimeters: PerimeterRegistry::default(),
            routers: RouterRegistry::default(),
            states: StateCache::new(),
            graph_bounds: Bounds::new(0.0, 0.0, 0.0, 0.0),
            listener: None,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn translate(&self) -> (f32, f32) {
        self.translate
    }

    pub fn graph_bounds(&self) -> Bounds {
        self.graph_bounds
    }

    pub fn current_root(&self) -> Option<CellId> {
        self.current_root
    }

    pub fn perimeters_mut(&mut self) -> &mut PerimeterRegistry {
        &mut self.perimeters
    }

    pub fn routers_mut(&mut self) -> &mut RouterRegistry {
        &mut self.routers
    }

    pub fn set_listener(&mut self, listener: Box<dyn RenderListener>) {
        self.listener = Some(listener);
    }

    pub fn take_listener(&mut self) -> Option<Box<dyn RenderListener>> {
        self.listener.take()
    }

    pub fn state(&self, cell: CellId) -> Option<&CellState> {
        self.states.get(cell)
    }

    pub fn states(&self) -> impl Iterator<Item = &CellState> {
        self.states.iter()
    }

    /// Change the zoom factor. Marks every cached state stale; the next
    /// `validate` call recomputes the whole view.
    pub fn set_scale(&mut self, scale: f32) {
        if scale != self.scale {
            self.scale = scale;
            self.invalidate_all();
        }
    }

    /// Change the pan offset (unscaled units).
    pub fn set_translate(&mut self, translate: (f32, f32)) {
        if translate != self.translate {
            self.translate = translate;
            self.invalidate_all();
        }
    }

    pub fn scale_and_translate(&mut self, scale: f32, translate: (f32, f32)) {
        if scale != self.scale || translate != self.translate {
            self.scale = scale;
            self.translate = translate;
            self.invalidate_all();
        }
    }

    /// Switch the display root (drill into a group). Drops the whole
    /// cache; the next `validate` rebuilds it below the new root.
    pub fn set_current_root(&mut self, root: Option<CellId>) {
        if root != self.current_root {
            self.current_root = root;
            self.states.clear();
        }
    }

    fn display_root(&self, model: &CellTree) -> CellId {
        self.current_root
            .filter(|root| model.contains(*root))
            .unwrap_or(model.root())
    }

    pub fn invalidate_all(&mut self) {
        for state in self.states.iter_mut() {
            state.invalid = true;
        }
    }

    /// Mark a cell's state stale, optionally with its whole subtree and
    /// every edge incident to any visited cell. Worklist traversal with
    /// a visited set, so a malformed cyclic hierarchy terminates.
    pub fn invalidate(&mut self, model: &CellTree, cell: CellId, recurse: bool, include_edges: bool) {
        let mut visited = HashSet::new();
        let mut stack = vec![cell];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(state) = self.states.get_mut(current) {
                state.invalid = true;
            }
            if recurse {
                stack.extend_from_slice(model.children(current));
            }
            if include_edges {
                stack.extend_from_slice(model.connected_edges(current));
            }
        }
    }

    /// Mark a cell's style snapshot (and geometry) stale.
    pub fn invalidate_style(&mut self, cell: CellId) {
        if let Some(state) = self.states.get_mut(cell) {
            state.invalid = true;
            state.invalid_style = true;
        }
    }

    /// Drop the cached state of a single cell. The model layer calls
    /// this (or `clear_subtree`) after removing cells.
    pub fn clear(&mut self, cell: CellId) {
        self.states.remove(cell);
    }

    /// Drop the cached states of a live cell and all its descendants.
    pub fn clear_subtree(&mut self, model: &CellTree, cell: CellId) {
        let mut stack = vec![cell];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            self.states.remove(current);
            stack.extend_from_slice(model.children(current));
        }
    }

    /// Full two-pass validation from the display root: first reconcile
    /// which cells have states (visibility), then recompute stale
    /// geometry. Safe to call repeatedly; without intervening
    /// invalidation the second call is a no-op.
    pub fn validate(&mut self, model: &CellTree) {
        let root = self.display_root(model);
        self.validate_cell(model, root, true);
        self.validate_cell_state(model, root, true);
        self.graph_bounds = self.compute_graph_bounds();
    }

    /// Visibility pass: create states for effectively visible cells,
    /// evict states of cells that are not. Children of a collapsed cell
    /// are structurally invisible unless the cell is the display root;
    /// recursion always continues so stale descendant states get
    /// evicted.
    pub fn validate_cell(&mut self, model: &CellTree, cell: CellId, parent_visible: bool) {
        if !model.contains(cell) {
            return;
        }
        let visible = parent_visible && model.is_visible(cell);
        if visible {
            self.states.ensure(cell);
        } else if self.states.contains(cell) {
            self.states.remove(cell);
        }
        let child_visible =
            visible && (!model.is_collapsed(cell) || cell == self.display_root(model));
        for &child in model.children(cell) {
            self.validate_cell(model, child, child_visible);
        }
    }

    /// Geometry pass for one cell (and, when `recurse`, its subtree).
    /// Gated by the state's `invalid` flag, which is cleared up front so
    /// mutually dependent validations cannot re-enter.
    pub fn validate_cell_state(&mut self, model: &CellTree, cell: CellId, recurse: bool) {
        let Some(state) = self.states.get(cell) else {
            return;
        };
        if state.invalid {
            let refresh_style = match self.states.get_mut(cell) {
                Some(state) => {
                    state.invalid = false;
                    state.invalid_style || self.config.always_update_style
                }
                None => return,
            };
            if refresh_style {
                let resolved = self.resolve_style(model, cell);
                if let Some(state) = self.states.get_mut(cell) {
                    state.style = resolved;
                    state.invalid_style = false;
                }
            }

            let display_root = self.display_root(model);
            if cell != display_root
                && let Some(parent) = model.parent(cell)
            {
                self.validate_cell_state(model, parent, false);
            }

            if model.is_edge(cell) {
                let source = self.visible_terminal(model, cell, true);
                let target = self.visible_terminal(model, cell, false);
                if let Some(source) = source {
                    self.validate_cell_state(model, source, false);
                }
                if let Some(target) = target {
                    self.validate_cell_state(model, target, false);
                }
                // Only terminals that actually kept a state count.
                let source = source.filter(|&t| self.states.contains(t));
                let target = target.filter(|&t| self.states.contains(t));
                if let Some(state) = self.states.get_mut(cell) {
                    state.visible_source = source;
                    state.visible_target = target;
                }
            }

            if let Some(mut taken) = self.states.take(cell) {
                let keep = self.update_cell_state(model, &mut taken);
                if keep {
                    self.states.put(cell, taken);
                    if cell != display_root
                        && let Some(listener) = self.listener.as_deref_mut()
                        && let Some(state) = self.states.get(cell)
                    {
                        listener.state_ready(cell, state);
                    }
                }
            }
        }

        let valid = self.states.get(cell).is_some_and(|state| !state.invalid);
        if recurse && valid {
            for &child in model.children(cell) {
                self.validate_cell_state(model, child, true);
            }
        }
    }

    /// Resolve the nearest ancestor an edge endpoint visually attaches
    /// to: the terminal itself while visible and uncollapsed, else the
    /// ancestor that hid it. Root-level and display-root candidates (and
    /// cells no longer in the model) yield no visible terminal.
    pub fn visible_terminal(&self, model: &CellTree, edge: CellId, source: bool) -> Option<CellId> {
        let mut result = model.terminal(edge, source);
        let mut best = result;
        while let Some(current) = result {
            if Some(current) == self.current_root {
                break;
            }
            let best_hidden = best.is_some_and(|b| !model.is_visible(b));
            if best_hidden || model.is_collapsed(current) {
                best = Some(current);
            }
            result = model.parent(current);
        }
        best.filter(|&b| {
            model.contains(b) && b != model.root() && Some(b) != self.current_root
        })
    }

    // ── Geometry resolution ─────────────────────────────────────────────

    /// Recompute one state's absolute geometry from the model. Returns
    /// false when the state must be evicted instead of published (an
    /// edge with an unresolvable endpoint).
    fn update_cell_state(&self, model: &CellTree, state: &mut CellState) -> bool {
        state.absolute_offset = (0.0, 0.0);
        state.origin = (0.0, 0.0);
        state.length = 0.0;
        let cell = state.cell;
        let display_root = self.display_root(model);
        if cell == display_root {
            return true;
        }

        let parent = model.parent(cell);
        let parent_state = parent.filter(|&p| p != display_root).and_then(|p| self.states.get(p));
        if let Some(pstate) = parent_state {
            state.origin.0 += pstate.origin.0;
            state.origin.1 += pstate.origin.1;
        }

        let Some(geo) = model.geometry(cell) else {
            // A visible cell without geometry keeps a state but gains no
            // absolute bounds; its children still resolve against origin.
            return true;
        };

        let is_edge = model.is_edge(cell);
        if !is_edge {
            let offset = geo.offset.unwrap_or((0.0, 0.0));
            if geo.relative
                && let Some(pstate) = parent_state
                && parent.is_some_and(|p| model.is_edge(p))
            {
                // Placed along the parent polyline at fractional
                // arc-length; fold the absolute point back into the
                // unscaled origin chain.
                let point = self.get_point(pstate, Some(geo));
                state.origin.0 += point.0 / self.scale - pstate.origin.0 - self.translate.0;
                state.origin.1 += point.1 / self.scale - pstate.origin.1 - self.translate.1;
            } else if geo.relative {
                state.origin.0 += geo.x + offset.0;
                state.origin.1 += geo.y + offset.1;
            } else {
                state.absolute_offset = (self.scale * offset.0, self.scale * offset.1);
                state.origin.0 += geo.x;
                state.origin.1 += geo.y;
            }
        }

        state.x = self.scale * (self.translate.0 + state.origin.0);
        state.y = self.scale * (self.translate.1 + state.origin.1);
        state.width = self.scale * geo.width;
        state.height = self.scale * geo.height;
        state.unscaled_width = geo.width;
        state.unscaled_height = geo.height;

        if is_edge {
            self.update_edge_state(state, geo)
        } else {
            self.update_vertex_state(model, state, geo);
            true
        }
    }

    fn update_vertex_state(&self, model: &CellTree, state: &mut CellState, geo: &Geometry) {
        if geo.relative
            && let Some(parent) = model.parent(state.cell)
            && !model.is_edge(parent)
            && let Some(pstate) = self.states.get(parent)
        {
            let alpha = pstate.style.rotation.to_radians();
            if alpha != 0.0 {
                // Swing this vertex's center around the rotated parent's
                // center; size is unaffected.
                let rotated = rotate_point(state.center(), alpha, pstate.center());
                state.x = rotated.0 - state.width / 2.0;
                state.y = rotated.1 - state.height / 2.0;
            }
        }
        self.update_vertex_label_offset(state);
    }

    fn update_vertex_label_offset(&self, state: &mut CellState) {
        match state.style.label_position {
            LabelPosition::Left => state.absolute_offset.0 -= state.width,
            LabelPosition::Right => state.absolute_offset.0 += state.width,
            LabelPosition::Center => {}
        }
        match state.style.vertical_label_position {
            VerticalLabelPosition::Top => state.absolute_offset.1 -= state.height,
            VerticalLabelPosition::Bottom => state.absolute_offset.1 += state.height,
            VerticalLabelPosition::Middle => {}
        }
    }

    /// Resolve an edge polyline end to end: fixed terminal points, then
    /// the routing strategy, then floating perimeter attachment for
    /// whatever is still open. An endpoint that survives all three
    /// unresolved evicts the state rather than publishing half a result.
    fn update_edge_state(&self, state: &mut CellState, geo: &Geometry) -> bool {
        let source = state.visible_source.and_then(|id| self.states.get(id));
        let target = state.visible_target.and_then(|id| self.states.get(id));

        let p0 = self.fixed_terminal_point(state, source, true, geo);
        let pe = self.fixed_terminal_point(state, target, false, geo);

        self.update_points(state, source, target, geo, p0, pe);
        self.update_floating_terminal_points(state, source, target);

        let resolved = state.absolute_points.len() >= 2
            && state.first_point().is_some()
            && state.last_point().is_some();
        if !resolved {
            return false;
        }
        self.update_edge_bounds(state);
        self.update_edge_label_offset(state, geo);
        true
    }

    /// Anchor-constraint or stored-point resolution for one edge end.
    fn fixed_terminal_point(
        &self,
        edge: &CellState,
        terminal: Option<&CellState>,
        source: bool,
        geo: &Geometry,
    ) -> Option<(f32, f32)> {
        let constraint = if source { edge.style.exit } else { edge.style.entry };
        if let (Some(constraint), Some(terminal)) = (constraint, terminal) {
            return Some(self.connection_point(terminal, constraint));
        }
        if terminal.is_none()
            && let Some(point) = geo.terminal_point(source)
        {
            return Some(self.transform_control_point(edge, point));
        }
        None
    }

    /// Absolute anchor for a fractional connection constraint, rotated
    /// with the terminal and optionally projected onto its perimeter.
    fn connection_point(&self, terminal: &CellState, constraint: AnchorConstraint) -> (f32, f32) {
        let bounds = terminal.bounds();
        let mut point = (
            bounds.x + constraint.x * bounds.width + constraint.dx * self.scale,
            bounds.y + constraint.y * bounds.height + constraint.dy * self.scale,
        );
        if constraint.perimeter
            && let Some(perimeter) = terminal.style.perimeter
            && let Some(projected) = perimeter(bounds, terminal, point, false)
        {
            point = projected;
        }
        let alpha = terminal.style.rotation.to_radians();
        if alpha != 0.0 {
            point = rotate_point(point, alpha, bounds.center());
        }
        point
    }

    /// Run the routing strategy (or transform raw waypoints) into the
    /// absolute point list, seeded with the fixed endpoints.
    fn update_points(
        &self,
        state: &mut CellState,
        source: Option<&CellState>,
        target: Option<&CellState>,
        geo: &Geometry,
        p0: Option<(f32, f32)>,
        pe: Option<(f32, f32)>,
    ) {
        let mut points: Vec<Option<(f32, f32)>> = vec![p0];
        let router = if state.style.no_routing {
            None
        } else if let Some(router) = state.style.router {
            Some(router)
        } else if self.is_default_loop(state, geo, p0, pe) {
            self.routers.resolve(&self.config.default_loop_routing)
        } else {
            None
        };
        if let Some(router) = router {
            let waypoints: Vec<(f32, f32)> = geo
                .points
                .iter()
                .map(|&point| self.transform_control_point(state, point))
                .collect();
            let inputs = RouteInputs {
                edge: state,
                source,
                target,
                waypoints: &waypoints,
                scale: self.scale,
                routing: &self.config.routing,
            };
            router(&inputs, &mut points);
        } else {
            for &point in &geo.points {
                points.push(Some(self.transform_control_point(state, point)));
            }
        }
        points.push(pe);
        state.absolute_points = points;
    }

    /// Self-loops with nothing pinned or routed explicitly fall back to
    /// the configured loop strategy.
    fn is_default_loop(
        &self,
        state: &CellState,
        geo: &Geometry,
        p0: Option<(f32, f32)>,
        pe: Option<(f32, f32)>,
    ) -> bool {
        state.visible_source.is_some()
            && state.visible_source == state.visible_target
            && geo.points.is_empty()
            && p0.is_none()
            && pe.is_none()
    }

    fn update_floating_terminal_points(
        &self,
        state: &mut CellState,
        source: Option<&CellState>,
        target: Option<&CellState>,
    ) {
        // Target end first: the source end's "next point" then sees the
        // resolved target when no interior points exist.
        if state.last_point().is_none()
            && let Some(target) = target
        {
            self.update_floating_terminal_point(state, target, source, false);
        }
        if state.first_point().is_none()
            && let Some(source) = source
        {
            self.update_floating_terminal_point(state, source, target, true);
        }
    }

    fn update_floating_terminal_point(
        &self,
        state: &mut CellState,
        terminal: &CellState,
        opposite: Option<&CellState>,
        source: bool,
    ) {
        let next = self.next_point(state, opposite, source);
        let alpha = terminal.style.rotation.to_radians();
        let orthogonal = alpha == 0.0 && state.style.orthogonal;
        let end_spacing = if source {
            state.style.source_perimeter_spacing
        } else {
            state.style.target_perimeter_spacing
        };
        let border = state.style.perimeter_spacing + end_spacing + terminal.style.perimeter_spacing;
        let bounds = terminal.bounds().grown(border * self.scale);
        let center = bounds.center();

        let point = next.and_then(|candidate| {
            let candidate = if alpha != 0.0 {
                rotate_point(candidate, -alpha, center)
            } else {
                candidate
            };
            let perimeter = terminal.style.perimeter?;
            let point = perimeter(bounds, terminal, candidate, orthogonal)?;
            Some(if alpha != 0.0 {
                rotate_point(point, alpha, center)
            } else {
                point
            })
        });

        let slot = if source {
            0
        } else {
            state.absolute_points.len() - 1
        };
        state.absolute_points[slot] = Some(point.unwrap_or_else(|| terminal.center()));
    }

    /// Nearest interior point toward an edge end, or the opposite
    /// terminal's center when the polyline has no interior yet.
    fn next_point(
        &self,
        state: &CellState,
        opposite: Option<&CellState>,
        source: bool,
    ) -> Option<(f32, f32)> {
        let count = state.absolute_points.len();
        let interior = if count >= 2 {
            let index = if source { 1.min(count - 1) } else { count - 2 };
            state.absolute_point(index)
        } else {
            None
        };
        interior.or_else(|| opposite.map(|state| state.center()))
    }

    /// Segments, total length, terminal distance and the min/max point
    /// envelope (floored to the configured minimum extent).
    fn update_edge_bounds(&self, state: &mut CellState) {
        let points: Vec<(f32, f32)> = state.absolute_points.iter().copied().flatten().collect();
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return;
        };
        state.terminal_distance = distance(first, last);

        let mut segments = Vec::with_capacity(points.len().saturating_sub(1));
        let mut length = 0.0;
        let mut min = first;
        let mut max = first;
        for pair in points.windows(2) {
            let segment = distance(pair[0], pair[1]);
            segments.push(segment);
            length += segment;
        }
        for &point in &points {
            min.0 = min.0.min(point.0);
            min.1 = min.1.min(point.1);
            max.0 = max.0.max(point.0);
            max.1 = max.1.max(point.1);
        }
        state.segments = segments;
        state.length = length;
        state.x = min.0;
        state.y = min.1;
        state.width = (max.0 - min.0).max(self.config.min_edge_extent);
        state.height = (max.1 - min.1).max(self.config.min_edge_extent);
    }

    /// Label anchor along the edge: arc-length placement for relative
    /// edge geometry, else the midpoint of the two endpoints plus the
    /// scaled raw offset.
    fn update_edge_label_offset(&self, state: &mut CellState, geo: &Geometry) {
        state.absolute_offset = state.center();
        if state.segments.is_empty() {
            return;
        }
        if geo.relative {
            state.absolute_offset = self.get_point(state, Some(geo));
        } else if let (Some(first), Some(last)) = (state.first_point(), state.last_point()) {
            let offset = geo.offset.unwrap_or((0.0, 0.0));
            state.absolute_offset = (
                first.0 + (last.0 - first.0) / 2.0 + offset.0 * self.scale,
                first.1 + (last.1 - first.1) / 2.0 + offset.1 * self.scale,
            );
        }
    }

    /// Arc-length point resolution along a validated edge polyline.
    /// `geometry.x` in [-1, 1] maps to fractional arc length, the
    /// geometry `y` is a perpendicular offset (scaled), and the geometry
    /// offset is added unscaled. Degenerate polylines fall back to the
    /// bounding-box center plus offset.
    pub fn get_point(&self, state: &CellState, geometry: Option<&Geometry>) -> (f32, f32) {
        let (mut x, mut y) = state.center();
        let along_path = geometry.is_none_or(|geo| geo.relative);
        let point_count = state.absolute_points.len();
        if along_path && !state.segments.is_empty() && state.length > 0.0 && point_count >= 2 {
            let gx = geometry.map_or(0.0, |geo| geo.x / 2.0);
            let dist = ((gx + 0.5) * state.length).round();
            let mut segment = state.segments[0];
            let mut covered = 0.0;
            let mut index = 1;
            while dist >= (covered + segment).round() && index < point_count - 1 {
                covered += segment;
                segment = state.segments[index];
                index += 1;
            }
            let factor = if segment == 0.0 {
                0.0
            } else {
                (dist - covered) / segment
            };
            if let (Some(p0), Some(pe)) = (
                state.absolute_point(index - 1),
                state.absolute_point(index),
            ) {
                let (gy, offset) = geometry
                    .map(|geo| (geo.y, geo.offset.unwrap_or((0.0, 0.0))))
                    .unwrap_or((0.0, (0.0, 0.0)));
                let dx = pe.0 - p0.0;
                let dy = pe.1 - p0.1;
                let (nx, ny) = if segment == 0.0 {
                    (0.0, 0.0)
                } else {
                    (dy / segment, dx / segment)
                };
                x = p0.0 + dx * factor + nx * gy * self.scale + offset.0;
                y = p0.1 + dy * factor - ny * gy * self.scale + offset.1;
            }
        } else if let Some(offset) = geometry.and_then(|geo| geo.offset) {
            x += offset.0;
            y += offset.1;
        }
        (x, y)
    }

    /// Model-space control point -> absolute space, through the edge's
    /// origin chain and the view frame.
    fn transform_control_point(&self, state: &CellState, point: (f32, f32)) -> (f32, f32) {
        (
            self.scale * (point.0 + self.translate.0 + state.origin.0),
            self.scale * (point.1 + self.translate.1 + state.origin.1),
        )
    }

    // ── Style snapshot ──────────────────────────────────────────────────

    fn resolve_style(&self, model: &CellTree, cell: CellId) -> ResolvedStyle {
        let empty = Style::new();
        let style = model.style(cell).unwrap_or(&empty);
        let router_name = style.text(keys::ROUTING);
        let perimeter = match style.text(keys::PERIMETER) {
            Some(name) => self.perimeters.resolve(name),
            // Vertices default to the rectangle perimeter; edges carry
            // none.
            None if model.is_vertex(cell) => self.perimeters.resolve(perimeter::RECTANGLE),
            None => None,
        };
        ResolvedStyle {
            rotation: style.num_or(keys::ROTATION, 0.0),
            perimeter,
            perimeter_spacing: style.num_or(keys::PERIMETER_SPACING, 0.0),
            source_perimeter_spacing: style.num_or(keys::SOURCE_PERIMETER_SPACING, 0.0),
            target_perimeter_spacing: style.num_or(keys::TARGET_PERIMETER_SPACING, 0.0),
            router: router_name.and_then(|name| self.routers.resolve(name)),
            no_routing: style.flag(keys::NO_ROUTING).unwrap_or(false),
            orthogonal: style
                .flag(keys::ORTHOGONAL)
                .unwrap_or_else(|| router_name.is_some_and(routing::is_orthogonal_family)),
            exit: anchor_constraint(
                style,
                keys::EXIT_X,
                keys::EXIT_Y,
                keys::EXIT_DX,
                keys::EXIT_DY,
                keys::EXIT_PERIMETER,
            ),
            entry: anchor_constraint(
                style,
                keys::ENTRY_X,
                keys::ENTRY_Y,
                keys::ENTRY_DX,
                keys::ENTRY_DY,
                keys::ENTRY_PERIMETER,
            ),
            label_position: match style.text(keys::LABEL_POSITION) {
                Some("left") => LabelPosition::Left,
                Some("right") => LabelPosition::Right,
                _ => LabelPosition::Center,
            },
            vertical_label_position: match style.text(keys::VERTICAL_LABEL_POSITION) {
                Some("top") => VerticalLabelPosition::Top,
                Some("bottom") => VerticalLabelPosition::Bottom,
                _ => VerticalLabelPosition::Middle,
            },
            direction: match style.text(keys::DIRECTION) {
                Some("north") => ShapeDirection::North,
                Some("south") => ShapeDirection::South,
                Some("west") => ShapeDirection::West,
                _ => ShapeDirection::East,
            },
        }
    }

    fn compute_graph_bounds(&self) -> Bounds {
        let mut result: Option<Bounds> = None;
        for state in self.states.iter() {
            if state.width <= 0.0 && state.height <= 0.0 && state.absolute_points.is_empty() {
                continue;
            }
            let bounds = state.bounds();
            result = Some(match result {
                Some(acc) => acc.union(&bounds),
                None => bounds,
            });
        }
        result.unwrap_or(Bounds::new(0.0, 0.0, 0.0, 0.0))
    }
}

impl Default for GraphView {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

fn anchor_constraint(
    style: &Style,
    x_key: &str,
    y_key: &str,
    dx_key: &str,
    dy_key: &str,
    perimeter_key: &str,
) -> Option<AnchorConstraint> {
    let x = style.num(x_key)?;
    let y = style.num(y_key)?;
    Some(AnchorConstraint {
        x,
        y,
        dx: style.num_or(dx_key, 0.0),
        dy: style.num_or(dy_key, 0.0),
        perimeter: style.flag_or(perimeter_key, true),
    })
}

fn rotate_point(point: (f32, f32), radians: f32, center: (f32, f32)) -> (f32, f32) {
    let cos = radians.cos();
    let sin = radians.sin();
    let dx = point.0 - center.0;
    let dy = point.1 - center.1;
    (
        center.0 + dx * cos - dy * sin,
        center.1 + dx * sin + dy * cos,
    )
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}
