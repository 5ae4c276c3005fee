//! Geometric predicates that decide whether a lattice point becomes a dot.
//!
//! A filter sees the dot center `(x, y)` and its `diameter`, all in µm, and
//! returns `true` to keep the dot. Filters passed to the lattice are combined
//! with logical AND, so their order never changes the result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pure predicate over a dot center and diameter.
pub trait Filter {
    fn accept(&self, x: f64, y: f64, diameter: f64) -> bool;
}

impl<F> Filter for F
where
    F: Fn(f64, f64, f64) -> bool,
{
    fn accept(&self, x: f64, y: f64, diameter: f64) -> bool {
        self(x, y, diameter)
    }
}

pub type BoxedFilter = Box<dyn Filter>;

/// True iff every filter accepts the dot. An empty list accepts everything.
pub fn all_accept(filters: &[BoxedFilter], x: f64, y: f64, diameter: f64) -> bool {
    filters.iter().all(|f| f.accept(x, y, diameter))
}

// ── Quadrants ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    TopRight,
    BottomRight,
    BottomLeft,
    TopLeft,
}

impl Quadrant {
    /// Whole disk strictly inside this quadrant.
    pub fn contains(self, x: f64, y: f64, diameter: f64) -> bool {
        let r = diameter / 2.0;
        match self {
            Quadrant::TopRight => x - r > 0.0 && y - r > 0.0,
            Quadrant::BottomRight => x - r > 0.0 && y + r < 0.0,
            Quadrant::BottomLeft => x + r < 0.0 && y + r < 0.0,
            Quadrant::TopLeft => x + r < 0.0 && y - r > 0.0,
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Quadrant::TopRight => "top-right",
            Quadrant::BottomRight => "bottom-right",
            Quadrant::BottomLeft => "bottom-left",
            Quadrant::TopLeft => "top-left",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown quadrant '{0}', expected top-right, bottom-right, bottom-left or top-left")]
pub struct ParseQuadrantError(pub String);

impl FromStr for Quadrant {
    type Err = ParseQuadrantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "top-right" | "tr" => Ok(Quadrant::TopRight),
            "bottom-right" | "btm-right" | "br" => Ok(Quadrant::BottomRight),
            "bottom-left" | "btm-left" | "bl" => Ok(Quadrant::BottomLeft),
            "top-left" | "tl" => Ok(Quadrant::TopLeft),
            _ => Err(ParseQuadrantError(s.to_string())),
        }
    }
}

pub fn in_quadrant(quadrant: Quadrant) -> impl Filter {
    move |x: f64, y: f64, d: f64| quadrant.contains(x, y, d)
}

pub fn is_in_top_right_quadrant(x: f64, y: f64, diameter: f64) -> bool {
    Quadrant::TopRight.contains(x, y, diameter)
}

pub fn is_in_btm_right_quadrant(x: f64, y: f64, diameter: f64) -> bool {
    Quadrant::BottomRight.contains(x, y, diameter)
}

pub fn is_in_btm_left_quadrant(x: f64, y: f64, diameter: f64) -> bool {
    Quadrant::BottomLeft.contains(x, y, diameter)
}

pub fn is_in_top_left_quadrant(x: f64, y: f64, diameter: f64) -> bool {
    Quadrant::TopLeft.contains(x, y, diameter)
}

// ── Circles ───────────────────────────────────────────────────────────

/// Keep dots whose whole disk lies strictly inside the circle `(cx, cy, radius)`.
pub fn in_circle(cx: f64, cy: f64, radius: f64) -> impl Filter {
    move |x: f64, y: f64, d: f64| {
        let r = d / 2.0;
        // A dot wider than the circle can never fit, even though (R - r)^2 is positive.
        radius > r && (x - cx).powi(2) + (y - cy).powi(2) < (radius - r).powi(2)
    }
}

/// Keep dots whose whole disk lies strictly outside the circle `(cx, cy, radius)`.
pub fn outside_circle(cx: f64, cy: f64, radius: f64) -> impl Filter {
    move |x: f64, y: f64, d: f64| {
        let r = d / 2.0;
        (x - cx).powi(2) + (y - cy).powi(2) > (radius + r).powi(2)
    }
}

// ── Ranges ────────────────────────────────────────────────────────────

fn outside_interval(center: f64, r: f64, lo: f64, hi: f64) -> bool {
    center + r < lo || center - r > hi
}

/// Reject dots whose disk overlaps `[x0, x1]` on the x-axis.
pub fn not_in_x_range(x0: f64, x1: f64) -> impl Filter {
    let (lo, hi) = (x0.min(x1), x0.max(x1));
    move |x: f64, _y: f64, d: f64| outside_interval(x, d / 2.0, lo, hi)
}

/// Reject dots whose disk overlaps `[y0, y1]` on the y-axis.
pub fn not_in_y_range(y0: f64, y1: f64) -> impl Filter {
    let (lo, hi) = (y0.min(y1), y0.max(y1));
    move |_x: f64, y: f64, d: f64| outside_interval(y, d / 2.0, lo, hi)
}

/// Reject dots touching a cross of the given total width centered on the origin.
pub fn not_in_center_cross(cross_width: f64) -> impl Filter {
    let half = cross_width.abs() / 2.0;
    let x_range = not_in_x_range(-half, half);
    let y_range = not_in_y_range(-half, half);
    move |x: f64, y: f64, d: f64| x_range.accept(x, y, d) && y_range.accept(x, y, d)
}

// ── Declarative filters ───────────────────────────────────────────────

/// Serializable description of a library filter, used by job files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterSpec {
    Quadrant { quadrant: Quadrant },
    InCircle { x: f64, y: f64, radius: f64 },
    OutsideCircle { x: f64, y: f64, radius: f64 },
    NotInXRange { from: f64, to: f64 },
    NotInYRange { from: f64, to: f64 },
    NotInCenterCross { width: f64 },
}

impl FilterSpec {
    pub fn build(&self) -> BoxedFilter {
        match *self {
            FilterSpec::Quadrant { quadrant } => Box::new(in_quadrant(quadrant)),
            FilterSpec::InCircle { x, y, radius } => Box::new(in_circle(x, y, radius)),
            FilterSpec::OutsideCircle { x, y, radius } => Box::new(outside_circle(x, y, radius)),
            FilterSpec::NotInXRange { from, to } => Box::new(not_in_x_range(from, to)),
            FilterSpec::NotInYRange { from, to } => Box::new(not_in_y_range(from, to)),
            FilterSpec::NotInCenterCross { width } => Box::new(not_in_center_cross(width)),
        }
    }
}

pub fn build_all(specs: &[FilterSpec]) -> Vec<BoxedFilter> {
    specs.iter().map(FilterSpec::build).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadrants_account_for_radius() {
        assert!(is_in_top_right_quadrant(3.0, 3.0, 4.0));
        assert!(!is_in_top_right_quadrant(2.0, 3.0, 4.0));
        assert!(is_in_btm_right_quadrant(3.0, -3.0, 4.0));
        assert!(is_in_btm_left_quadrant(-3.0, -3.0, 4.0));
        assert!(is_in_top_left_quadrant(-3.0, 3.0, 4.0));
        assert!(!is_in_top_left_quadrant(3.0, 3.0, 4.0));
    }

    #[test]
    fn test_quadrant_parse() {
        assert_eq!("top-right".parse::<Quadrant>().unwrap(), Quadrant::TopRight);
        assert_eq!("btm_left".parse::<Quadrant>().unwrap(), Quadrant::BottomLeft);
        assert_eq!("TL".parse::<Quadrant>().unwrap(), Quadrant::TopLeft);
        assert!("middle".parse::<Quadrant>().is_err());
        assert_eq!(Quadrant::BottomRight.to_string(), "bottom-right");
    }

    #[test]
    fn test_in_circle_uses_disk_extent() {
        let f = in_circle(0.0, 0.0, 10.0);
        assert!(f.accept(0.0, 0.0, 2.0));
        assert!(f.accept(8.9, 0.0, 2.0));
        assert!(!f.accept(9.0, 0.0, 2.0));
        // Dot larger than the circle itself.
        assert!(!f.accept(0.0, 0.0, 30.0));
    }

    #[test]
    fn test_outside_circle_uses_disk_extent() {
        let f = outside_circle(5.0, 5.0, 10.0);
        assert!(f.accept(5.0, 16.1, 2.0));
        assert!(!f.accept(5.0, 16.0, 2.0));
        assert!(!f.accept(5.0, 5.0, 2.0));
    }

    #[test]
    fn test_ranges_normalize_order() {
        let a = not_in_x_range(50.0, 150.0);
        let b = not_in_x_range(150.0, 50.0);
        for &x in &[0.0, 46.0, 48.0, 100.0, 152.0, 153.0] {
            assert_eq!(a.accept(x, 0.0, 5.0), b.accept(x, 0.0, 5.0));
        }
        assert!(a.accept(47.0, 0.0, 5.0));
        assert!(!a.accept(48.0, 0.0, 5.0));
        assert!(!a.accept(152.0, 0.0, 5.0));
        assert!(a.accept(153.0, 0.0, 5.0));

        let y = not_in_y_range(-200.0, -300.0);
        assert!(!y.accept(0.0, -250.0, 10.0));
        assert!(y.accept(0.0, -150.0, 10.0));
    }

    #[test]
    fn test_center_cross() {
        let f = not_in_center_cross(200.0);
        assert!(f.accept(120.0, 120.0, 10.0));
        assert!(!f.accept(120.0, 50.0, 10.0));
        assert!(!f.accept(50.0, -120.0, 10.0));
        assert!(!f.accept(104.0, 120.0, 10.0));
        assert!(f.accept(-106.0, -106.0, 10.0));
    }

    #[test]
    fn test_all_accept_empty_is_true() {
        assert!(all_accept(&[], 1.0, 2.0, 3.0));
        let filters: Vec<BoxedFilter> = vec![
            Box::new(in_circle(0.0, 0.0, 100.0)),
            Box::new(is_in_top_right_quadrant),
        ];
        assert!(all_accept(&filters, 10.0, 10.0, 2.0));
        assert!(!all_accept(&filters, -10.0, 10.0, 2.0));
    }

    #[test]
    fn test_filter_spec_from_json() {
        let json = r#"[
            {"kind": "quadrant", "quadrant": "top_right"},
            {"kind": "in_circle", "x": 0.0, "y": 0.0, "radius": 500.0},
            {"kind": "not_in_x_range", "from": 50.0, "to": 150.0}
        ]"#;
        let specs: Vec<FilterSpec> = serde_json::from_str(json).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(
            specs[0],
            FilterSpec::Quadrant {
                quadrant: Quadrant::TopRight
            }
        );
        let filters = build_all(&specs);
        assert!(all_accept(&filters, 200.0, 200.0, 5.0));
        assert!(!all_accept(&filters, 100.0, 200.0, 5.0));
        assert!(!all_accept(&filters, 400.0, 400.0, 5.0));
    }
}
