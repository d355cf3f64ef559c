use std::collections::HashMap;
use std::f32::consts::PI;

use once_cell::sync::Lazy;

use super::state::{Bounds, CellState, ShapeDirection};

/// Pure boundary-intersection strategy: where does the segment from the
/// shape's center toward `next` cross the shape outline? `orthogonal`
/// asks for an axis-aligned attachment when `next` projects onto the
/// shape. `None` means "no meaningful perimeter"; callers fall back to
/// the unmodified candidate point.
pub type PerimeterFn = fn(Bounds, &CellState, (f32, f32), bool) -> Option<(f32, f32)>;

pub const RECTANGLE: &str = "rectangle";
pub const ELLIPSE: &str = "ellipse";
pub const RHOMBUS: &str = "rhombus";
pub const TRIANGLE: &str = "triangle";
pub const HEXAGON: &str = "hexagon";

static BUILTIN: Lazy<Vec<(&str, PerimeterFn)>> = Lazy::new(|| {
    vec![
        (RECTANGLE, rectangle_perimeter as PerimeterFn),
        (ELLIPSE, ellipse_perimeter as PerimeterFn),
        (RHOMBUS, rhombus_perimeter as PerimeterFn),
        (TRIANGLE, triangle_perimeter as PerimeterFn),
        (HEXAGON, hexagon_perimeter as PerimeterFn),
    ]
});

/// Name -> strategy table, last write wins. Unknown names resolve to no
/// strategy; there is deliberately no dynamic-evaluation fallback.
#[derive(Debug, Clone)]
pub struct PerimeterRegistry {
    entries: HashMap<String, PerimeterFn>,
}

impl PerimeterRegistry {
    pub fn register(&mut self, name: &str, perimeter: PerimeterFn) {
        self.entries.insert(name.to_string(), perimeter);
    }

    pub fn unregister(&mut self, name: &str) -> Option<PerimeterFn> {
        self.entries.remove(name)
    }

    pub fn resolve(&self, name: &str) -> Option<PerimeterFn> {
        self.entries.get(name).copied()
    }
}

impl Default for PerimeterRegistry {
    fn default() -> Self {
        let mut entries = HashMap::new();
        for (name, perimeter) in BUILTIN.iter() {
            entries.insert((*name).to_string(), *perimeter);
        }
        Self { entries }
    }
}

pub fn rectangle_perimeter(
    bounds: Bounds,
    _terminal: &CellState,
    next: (f32, f32),
    orthogonal: bool,
) -> Option<(f32, f32)> {
    let cx = bounds.center_x();
    let cy = bounds.center_y();
    let dx = next.0 - cx;
    let dy = next.1 - cy;
    let alpha = dy.atan2(dx);
    let beta = PI / 2.0 - alpha;
    let t = bounds.height.atan2(bounds.width);

    let mut point = if alpha < -PI + t || alpha > PI - t {
        // Left edge
        (bounds.x, cy - bounds.width * alpha.tan() / 2.0)
    } else if alpha < -t {
        // Top edge
        (cx - bounds.height * beta.tan() / 2.0, bounds.y)
    } else if alpha < t {
        // Right edge
        (bounds.x + bounds.width, cy + bounds.width * alpha.tan() / 2.0)
    } else {
        // Bottom edge
        (cx + bounds.height * beta.tan() / 2.0, bounds.y + bounds.height)
    };

    if orthogonal {
        if next.0 >= bounds.x && next.0 <= bounds.x + bounds.width {
            point.0 = next.0;
        } else if next.1 >= bounds.y && next.1 <= bounds.y + bounds.height {
            point.1 = next.1;
        }
        point.0 = point.0.clamp(bounds.x, bounds.x + bounds.width);
        point.1 = point.1.clamp(bounds.y, bounds.y + bounds.height);
    }

    Some(point)
}

pub fn ellipse_perimeter(
    bounds: Bounds,
    _terminal: &CellState,
    next: (f32, f32),
    orthogonal: bool,
) -> Option<(f32, f32)> {
    let cx = bounds.center_x();
    let cy = bounds.center_y();
    let a = bounds.width / 2.0;
    let b = bounds.height / 2.0;
    if a <= f32::EPSILON || b <= f32::EPSILON {
        return Some((cx, cy));
    }

    if orthogonal {
        // Axis-aligned crossing nearest to the candidate, when it
        // projects onto the ellipse.
        let rel_x = (next.0 - cx) / a;
        if rel_x.abs() <= 1.0 {
            let dy = b * (1.0 - rel_x * rel_x).sqrt();
            let y = if next.1 <= cy { cy - dy } else { cy + dy };
            return Some((next.0, y));
        }
        let rel_y = (next.1 - cy) / b;
        if rel_y.abs() <= 1.0 {
            let dx = a * (1.0 - rel_y * rel_y).sqrt();
            let x = if next.0 <= cx { cx - dx } else { cx + dx };
            return Some((x, next.1));
        }
    }

    let dx = next.0 - cx;
    let dy = next.1 - cy;
    if dx.abs() <= f32::EPSILON && dy.abs() <= f32::EPSILON {
        return Some((cx, cy));
    }
    ray_ellipse_intersection((cx, cy), (dx, dy), (cx, cy), a, b)
}

pub fn rhombus_perimeter(
    bounds: Bounds,
    _terminal: &CellState,
    next: (f32, f32),
    orthogonal: bool,
) -> Option<(f32, f32)> {
    polygon_perimeter(&rhombus_points(bounds), bounds, next, orthogonal)
}

pub fn triangle_perimeter(
    bounds: Bounds,
    terminal: &CellState,
    next: (f32, f32),
    orthogonal: bool,
) -> Option<(f32, f32)> {
    let poly = triangle_points(bounds, terminal.style.direction);
    polygon_perimeter(&poly, bounds, next, orthogonal)
}

pub fn hexagon_perimeter(
    bounds: Bounds,
    _terminal: &CellState,
    next: (f32, f32),
    orthogonal: bool,
) -> Option<(f32, f32)> {
    polygon_perimeter(&hexagon_points(bounds), bounds, next, orthogonal)
}

fn rhombus_points(bounds: Bounds) -> [(f32, f32); 4] {
    let cx = bounds.center_x();
    let cy = bounds.center_y();
    [
        (cx, bounds.y),
        (bounds.x + bounds.width, cy),
        (cx, bounds.y + bounds.height),
        (bounds.x, cy),
    ]
}

fn triangle_points(bounds: Bounds, direction: ShapeDirection) -> [(f32, f32); 3] {
    let x = bounds.x;
    let y = bounds.y;
    let w = bounds.width;
    let h = bounds.height;
    let cx = bounds.center_x();
    let cy = bounds.center_y();
    match direction {
        ShapeDirection::North => [(x, y + h), (cx, y), (x + w, y + h)],
        ShapeDirection::South => [(x, y), (x + w, y), (cx, y + h)],
        ShapeDirection::East => [(x, y), (x + w, cy), (x, y + h)],
        ShapeDirection::West => [(x + w, y), (x + w, y + h), (x, cy)],
    }
}

fn hexagon_points(bounds: Bounds) -> [(f32, f32); 6] {
    let x = bounds.x;
    let y = bounds.y;
    let w = bounds.width;
    let h = bounds.height;
    let x1 = x + w * 0.25;
    let x2 = x + w * 0.75;
    let cy = bounds.center_y();
    [
        (x1, y),
        (x2, y),
        (x + w, cy),
        (x2, y + h),
        (x1, y + h),
        (x, cy),
    ]
}

/// Shared polygon strategy: an orthogonal axis ray from the candidate
/// when it projects onto the shape, otherwise the center ray.
fn polygon_perimeter(
    poly: &[(f32, f32)],
    bounds: Bounds,
    next: (f32, f32),
    orthogonal: bool,
) -> Option<(f32, f32)> {
    let center = bounds.center();
    if orthogonal {
        if next.0 >= bounds.x && next.0 <= bounds.x + bounds.width {
            let dir = (0.0, if next.1 <= center.1 { -1.0 } else { 1.0 });
            if let Some(point) = ray_polygon_intersection(center_at_x(center, next.0), dir, poly) {
                return Some(point);
            }
        } else if next.1 >= bounds.y && next.1 <= bounds.y + bounds.height {
            let dir = (if next.0 <= center.0 { -1.0 } else { 1.0 }, 0.0);
            if let Some(point) = ray_polygon_intersection(center_at_y(center, next.1), dir, poly) {
                return Some(point);
            }
        }
    }
    let dx = next.0 - center.0;
    let dy = next.1 - center.1;
    if dx.abs() <= f32::EPSILON && dy.abs() <= f32::EPSILON {
        return Some(center);
    }
    ray_polygon_intersection(center, (dx, dy), poly)
}

fn center_at_x(center: (f32, f32), x: f32) -> (f32, f32) {
    (x, center.1)
}

fn center_at_y(center: (f32, f32), y: f32) -> (f32, f32) {
    (center.0, y)
}

/// Nearest crossing of a ray with a closed polygon outline.
fn ray_polygon_intersection(
    origin: (f32, f32),
    dir: (f32, f32),
    poly: &[(f32, f32)],
) -> Option<(f32, f32)> {
    if poly.len() < 2 {
        return None;
    }
    let (ox, oy) = origin;
    let (rx, ry) = dir;
    let mut best_t: Option<f32> = None;
    for i in 0..poly.len() {
        let (x1, y1) = poly[i];
        let (x2, y2) = poly[(i + 1) % poly.len()];
        let sx = x2 - x1;
        let sy = y2 - y1;
        let qx = x1 - ox;
        let qy = y1 - oy;
        let denom = rx * sy - ry * sx;
        if denom.abs() < 1e-6 {
            continue;
        }
        let t = (qx * sy - qy * sx) / denom;
        let u = (qx * ry - qy * rx) / denom;
        if t >= 0.0 && (0.0..=1.0).contains(&u) {
            match best_t {
                Some(best) if t >= best => {}
                _ => best_t = Some(t),
            }
        }
    }
    best_t.map(|t| (ox + rx * t, oy + ry * t))
}

fn ray_ellipse_intersection(
    origin: (f32, f32),
    dir: (f32, f32),
    center: (f32, f32),
    rx: f32,
    ry: f32,
) -> Option<(f32, f32)> {
    let (dx, dy) = dir;
    let ox = origin.0 - center.0;
    let oy = origin.1 - center.1;
    let a = (dx * dx) / (rx * rx) + (dy * dy) / (ry * ry);
    let b = 2.0 * ((ox * dx) / (rx * rx) + (oy * dy) / (ry * ry));
    let c = (ox * ox) / (rx * rx) + (oy * oy) / (ry * ry) - 1.0;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 || a.abs() < 1e-6 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);
    let t = if t1 >= 0.0 {
        t1
    } else if t2 >= 0.0 {
        t2
    } else {
        return None;
    };
    Some((origin.0 + dx * t, origin.1 + dy * t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal_state() -> CellState {
        // The id value is irrelevant to perimeter math.
        let tree = crate::model::CellTree::new();
        CellState::new(tree.root())
    }

    fn assert_close(actual: (f32, f32), expected: (f32, f32)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-3 && (actual.1 - expected.1).abs() < 1e-3,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn rectangle_hits_the_facing_side() {
        let bounds = Bounds::new(0.0, 0.0, 50.0, 50.0);
        let state = terminal_state();
        let right = rectangle_perimeter(bounds, &state, (325.0, 25.0), false).unwrap();
        assert_close(right, (50.0, 25.0));
        let left = rectangle_perimeter(bounds, &state, (-100.0, 25.0), false).unwrap();
        assert_close(left, (0.0, 25.0));
        let top = rectangle_perimeter(bounds, &state, (25.0, -100.0), false).unwrap();
        assert_close(top, (25.0, 0.0));
        let bottom = rectangle_perimeter(bounds, &state, (25.0, 200.0), false).unwrap();
        assert_close(bottom, (25.0, 50.0));
    }

    #[test]
    fn rectangle_orthogonal_keeps_the_candidate_axis() {
        let bounds = Bounds::new(0.0, 0.0, 50.0, 50.0);
        let state = terminal_state();
        let point = rectangle_perimeter(bounds, &state, (30.0, 200.0), true).unwrap();
        assert_close(point, (30.0, 50.0));
        let clamped = rectangle_perimeter(bounds, &state, (90.0, 200.0), true).unwrap();
        assert!(clamped.0 <= 50.0 && clamped.1 <= 50.0);
    }

    #[test]
    fn rectangle_degenerate_center_candidate_is_safe() {
        let bounds = Bounds::new(10.0, 10.0, 20.0, 20.0);
        let state = terminal_state();
        let point = rectangle_perimeter(bounds, &state, (20.0, 20.0), false).unwrap();
        assert!(point.0.is_finite() && point.1.is_finite());
    }

    #[test]
    fn ellipse_ray_lands_on_the_outline() {
        let bounds = Bounds::new(0.0, 0.0, 40.0, 20.0);
        let state = terminal_state();
        let point = ellipse_perimeter(bounds, &state, (100.0, 10.0), false).unwrap();
        assert_close(point, (40.0, 10.0));
        // On-outline check: (x-cx)^2/a^2 + (y-cy)^2/b^2 == 1
        let diag = ellipse_perimeter(bounds, &state, (60.0, 40.0), false).unwrap();
        let e = ((diag.0 - 20.0) / 20.0).powi(2) + ((diag.1 - 10.0) / 10.0).powi(2);
        assert!((e - 1.0).abs() < 1e-3, "off the ellipse: {e}");
    }

    #[test]
    fn rhombus_east_candidate_hits_the_east_corner_side() {
        let bounds = Bounds::new(0.0, 0.0, 40.0, 40.0);
        let state = terminal_state();
        let point = rhombus_perimeter(bounds, &state, (200.0, 20.0), false).unwrap();
        assert_close(point, (40.0, 20.0));
    }

    #[test]
    fn triangle_respects_direction() {
        let bounds = Bounds::new(0.0, 0.0, 40.0, 40.0);
        let mut state = terminal_state();
        state.style.direction = ShapeDirection::East;
        let tip = triangle_perimeter(bounds, &state, (200.0, 20.0), false).unwrap();
        assert_close(tip, (40.0, 20.0));
        state.style.direction = ShapeDirection::West;
        let tip = triangle_perimeter(bounds, &state, (-200.0, 20.0), false).unwrap();
        assert_close(tip, (0.0, 20.0));
    }

    #[test]
    fn registry_is_last_write_wins() {
        fn stub(_: Bounds, _: &CellState, next: (f32, f32), _: bool) -> Option<(f32, f32)> {
            Some(next)
        }
        let mut registry = PerimeterRegistry::default();
        assert!(registry.resolve(RECTANGLE).is_some());
        assert!(registry.resolve("bogus").is_none());
        registry.register(RECTANGLE, stub);
        let resolved = registry.resolve(RECTANGLE).unwrap();
        let state = terminal_state();
        let bounds = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(resolved(bounds, &state, (99.0, 99.0), false), Some((99.0, 99.0)));
        registry.unregister(RECTANGLE);
        assert!(registry.resolve(RECTANGLE).is_none());
    }

    #[test]
    fn ids_do_not_leak_into_perimeter_math() {
        // Same inputs, different terminal cells: identical result.
        let bounds = Bounds::new(5.0, 5.0, 30.0, 30.0);
        let mut tree = crate::model::CellTree::new();
        let a = tree
            .add_vertex(
                tree.root(),
                crate::model::Geometry::new(0.0, 0.0, 1.0, 1.0),
                crate::style::Style::new(),
            )
            .unwrap();
        let sa = CellState::new(a);
        let sb = CellState::new(tree.root());
        assert_eq!(
            rectangle_perimeter(bounds, &sa, (100.0, 20.0), false),
            rectangle_perimeter(bounds, &sb, (100.0, 20.0), false),
        );
    }
}
