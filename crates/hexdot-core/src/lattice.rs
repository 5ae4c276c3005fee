//! Hexagonal close-packed lattice generation.
//!
//! Rows are `pitch / 2` apart. Within a row, dots are `2 * pitch * sin60` apart,
//! and every second row (1-indexed: rows 2, 4, ...) starts `pitch * sin60` to
//! the right. Together this puts each dot at distance `pitch` from its six
//! nearest neighbours.

use thiserror::Error;

use crate::filter::{all_accept, BoxedFilter};
use crate::geometry::{Feature, Point, Region};

/// sin(60°)
pub const SIN_60: f64 = 0.866_025_403_784_438_6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LatticeError {
    #[error("Invalid {name}: {value} (must be finite and greater than zero)")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Invalid region coordinate {name}: {value}")]
    InvalidRegion { name: &'static str, value: f64 },

    #[error("Lattice would hold about {estimated} points, more than the limit of {limit}")]
    TooManyPoints { estimated: u64, limit: u64 },
}

/// Upper bound on the points a single lattice may sweep.
pub const MAX_LATTICE_POINTS: u64 = 100_000_000;

/// Parameters of one hexagonal array over a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexLattice {
    diameter: f64,
    pitch: f64,
    region: Region,
}

impl HexLattice {
    /// Validate parameters and normalize the region corners.
    pub fn new(
        diameter: f64,
        pitch: f64,
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
    ) -> Result<Self, LatticeError> {
        if !(pitch.is_finite() && pitch > 0.0) {
            return Err(LatticeError::InvalidParameter {
                name: "pitch",
                value: pitch,
            });
        }
        if !(diameter.is_finite() && diameter > 0.0) {
            return Err(LatticeError::InvalidParameter {
                name: "diameter",
                value: diameter,
            });
        }
        for (name, value) in [("x0", x0), ("x1", x1), ("y0", y0), ("y1", y1)] {
            if !value.is_finite() {
                return Err(LatticeError::InvalidRegion { name, value });
            }
        }

        let lattice = Self {
            diameter,
            pitch,
            region: Region::new(x0, x1, y0, y1),
        };
        let estimated = lattice.estimated_points();
        if estimated > MAX_LATTICE_POINTS as f64 {
            return Err(LatticeError::TooManyPoints {
                estimated: estimated as u64,
                limit: MAX_LATTICE_POINTS,
            });
        }
        Ok(lattice)
    }

    /// Upper bound on the number of points [`HexLattice::iter_points`] yields.
    pub fn estimated_points(&self) -> f64 {
        let rows = (self.region.height() / self.row_spacing()).ceil();
        if rows <= 0.0 {
            return 0.0;
        }
        let columns = (self.region.width() / self.column_spacing()).ceil();
        if columns <= 0.0 {
            return 0.0;
        }
        rows * (columns + 1.0)
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Vertical distance between consecutive rows.
    pub fn row_spacing(&self) -> f64 {
        self.pitch / 2.0
    }

    /// Horizontal distance between neighbours in the same row.
    pub fn column_spacing(&self) -> f64 {
        2.0 * self.pitch * SIN_60
    }

    /// Horizontal shift applied to even (1-indexed) rows.
    pub fn row_offset(&self) -> f64 {
        self.pitch * SIN_60
    }

    /// Lattice points in `[min, max)`, bottom row first, left to right.
    pub fn iter_points(&self) -> impl Iterator<Item = Point> {
        let Region { min, max } = self.region;
        let row_spacing = self.row_spacing();
        let column_spacing = self.column_spacing();
        let row_offset = self.row_offset();

        (0u64..)
            .map(move |row| (row, min.y + row as f64 * row_spacing))
            .take_while(move |&(_, y)| y < max.y)
            .flat_map(move |(row, y)| {
                // Row 1 (index 0) starts at the left edge, row 2 is shifted, and so on.
                let x_start = if row % 2 == 1 { min.x + row_offset } else { min.x };
                (0u64..)
                    .map(move |col| x_start + col as f64 * column_spacing)
                    .take_while(move |&x| x < max.x)
                    .map(move |x| Point::new(x, y))
            })
    }

    /// Every lattice point, collected.
    pub fn points(&self) -> Vec<Point> {
        self.iter_points().collect()
    }

    /// Lattice points that every filter accepts, as features.
    pub fn features(&self, filters: &[BoxedFilter]) -> Vec<Feature> {
        let diameter = self.diameter;
        let features: Vec<Feature> = self
            .iter_points()
            .filter(|p| all_accept(filters, p.x, p.y, diameter))
            .map(|p| Feature {
                center: p,
                diameter,
            })
            .collect();
        log::debug!(
            "Hex lattice d = {} p = {} over {}x{}: {} dots kept",
            self.diameter,
            self.pitch,
            self.region.width(),
            self.region.height(),
            features.len()
        );
        features
    }
}

/// Generate a filtered hexagonal array of dots. All values are in µm.
pub fn generate(
    diameter: f64,
    pitch: f64,
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
    filters: &[BoxedFilter],
) -> Result<Vec<Feature>, LatticeError> {
    let lattice = HexLattice::new(diameter, pitch, x0, x1, y0, y1)?;
    Ok(lattice.features(filters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{in_circle, is_in_top_right_quadrant, not_in_x_range};

    const EPS: f64 = 1e-6;

    fn rows(features: &[Feature]) -> Vec<Vec<Feature>> {
        let mut rows: Vec<Vec<Feature>> = Vec::new();
        for f in features {
            match rows.last_mut() {
                Some(row) if (row[0].center.y - f.center.y).abs() < EPS => row.push(*f),
                _ => rows.push(vec![*f]),
            }
        }
        rows
    }

    #[test]
    fn test_small_region_enumeration() {
        let features = generate(4.0, 12.0, -6.0, 6.0, -6.0, 6.0, &[]).unwrap();
        // Rows at y = -6 and y = 0; the third row (y = 6) is on the open bound.
        // Column spacing 12 * sqrt(3) ~ 20.78 leaves one dot per row.
        let expected = [(-6.0, -6.0), (-6.0 + 6.0 * 3f64.sqrt(), 0.0)];
        assert_eq!(features.len(), expected.len());
        for (f, (x, y)) in features.iter().zip(expected) {
            assert!((f.center.x - x).abs() < EPS, "x {} != {}", f.center.x, x);
            assert!((f.center.y - y).abs() < EPS, "y {} != {}", f.center.y, y);
            assert!((f.diameter - 4.0).abs() < EPS);
        }
    }

    #[test]
    fn test_features_inside_region() {
        let region = Region::new(-37.0, 53.0, -21.0, 44.0);
        let features = generate(3.0, 7.5, 53.0, -37.0, 44.0, -21.0, &[]).unwrap();
        assert!(!features.is_empty());
        for f in &features {
            assert!(region.contains_half_open(&f.center), "{:?} outside", f.center);
        }
    }

    #[test]
    fn test_column_spacing_and_row_offset() {
        let pitch = 10.0;
        let features = generate(5.0, pitch, 0.0, 200.0, 0.0, 50.0, &[]).unwrap();
        let rows = rows(&features);
        assert_eq!(rows.len(), 10);

        for row in &rows {
            assert!(row.len() > 1);
            for pair in row.windows(2) {
                let dx = pair[1].center.x - pair[0].center.x;
                assert!((dx - 2.0 * pitch * SIN_60).abs() < EPS);
            }
        }
        for pair in rows.windows(2) {
            let dx = (pair[1][0].center.x - pair[0][0].center.x).abs();
            assert!((dx - pitch * SIN_60).abs() < EPS);
            let dy = pair[1][0].center.y - pair[0][0].center.y;
            assert!((dy - pitch / 2.0).abs() < EPS);
        }
    }

    #[test]
    fn test_nearest_neighbours_at_pitch() {
        let features = generate(1.0, 4.0, 0.0, 40.0, 0.0, 40.0, &[]).unwrap();
        let first = features[0].center;
        let second_row = features
            .iter()
            .find(|f| f.center.y > first.y)
            .unwrap()
            .center;
        assert!((first.distance_to(&second_row) - 4.0).abs() < EPS);
    }

    #[test]
    fn test_deterministic() {
        let a = generate(5.0, 10.0, -10.0, 10.0, -10.0, 10.0, &[]).unwrap();
        let b = generate(5.0, 10.0, -10.0, 10.0, -10.0, 10.0, &[]).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_filter_order_does_not_change_output() {
        let forward: Vec<BoxedFilter> = vec![
            Box::new(is_in_top_right_quadrant),
            Box::new(in_circle(0.0, 0.0, 500.0)),
            Box::new(not_in_x_range(50.0, 150.0)),
        ];
        let reversed: Vec<BoxedFilter> = vec![
            Box::new(not_in_x_range(150.0, 50.0)),
            Box::new(in_circle(0.0, 0.0, 500.0)),
            Box::new(is_in_top_right_quadrant),
        ];
        let a = generate(5.0, 15.0, -500.0, 500.0, -500.0, 500.0, &forward).unwrap();
        let b = generate(5.0, 15.0, -500.0, 500.0, -500.0, 500.0, &reversed).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
        for f in &a {
            assert!(f.center.x > 0.0 && f.center.y > 0.0);
        }
    }

    #[test]
    fn test_filters_are_anded() {
        let all = generate(2.0, 5.0, -50.0, 50.0, -50.0, 50.0, &[]).unwrap();
        let quadrant: Vec<BoxedFilter> = vec![Box::new(is_in_top_right_quadrant)];
        let some = generate(2.0, 5.0, -50.0, 50.0, -50.0, 50.0, &quadrant).unwrap();
        assert!(some.len() < all.len());
        assert!(some.iter().all(|f| all.contains(f)));
    }

    #[test]
    fn test_rejects_non_positive_pitch_and_diameter() {
        assert_eq!(
            generate(1.0, 0.0, 0.0, 10.0, 0.0, 10.0, &[]),
            Err(LatticeError::InvalidParameter {
                name: "pitch",
                value: 0.0
            })
        );
        assert!(generate(1.0, -2.0, 0.0, 10.0, 0.0, 10.0, &[]).is_err());
        assert!(generate(0.0, 2.0, 0.0, 10.0, 0.0, 10.0, &[]).is_err());
        assert!(generate(1.0, f64::NAN, 0.0, 10.0, 0.0, 10.0, &[]).is_err());
        assert!(matches!(
            generate(1.0, 2.0, 0.0, f64::INFINITY, 0.0, 10.0, &[]),
            Err(LatticeError::InvalidRegion { name: "x1", .. })
        ));
    }

    #[test]
    fn test_degenerate_region_is_empty() {
        let features = generate(1.0, 2.0, 5.0, 5.0, 0.0, 10.0, &[]).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_points_match_estimate_bound() {
        let lattice = HexLattice::new(1.0, 3.0, -20.0, 25.0, -10.0, 17.0).unwrap();
        let points = lattice.points();
        assert!(!points.is_empty());
        assert!(points.len() as f64 <= lattice.estimated_points());
        assert_eq!(points, lattice.iter_points().collect::<Vec<_>>());
    }

    #[test]
    fn test_rejects_oversized_lattice() {
        let err = HexLattice::new(1e-7, 1e-6, -1e4, 1e4, -1e4, 1e4).unwrap_err();
        assert!(matches!(
            err,
            LatticeError::TooManyPoints {
                limit: MAX_LATTICE_POINTS,
                ..
            }
        ));
        // A wide but flat region stays small.
        let flat = HexLattice::new(1.0, 1e-3, 0.0, 1.0, 0.0, 0.0).unwrap();
        assert_eq!(flat.estimated_points(), 0.0);
        assert!(flat.points().is_empty());
    }
}
