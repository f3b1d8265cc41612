//! Planar geometry over lat/lon rings.
//!
//! Longitude is treated as `x` and latitude as `y`. Zones are city-sized, so
//! the flat approximation is exact enough for containment.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Coordinate;

/// Cross products at or below this magnitude count as collinear.
pub const COLLINEAR_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid polygon: {reason}")]
pub struct InvalidPolygon {
    pub reason: String,
}

impl InvalidPolygon {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Axis-aligned bounds of a ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    fn of(points: &[Coordinate]) -> Self {
        points.iter().fold(
            Self {
                min_latitude: f64::INFINITY,
                max_latitude: f64::NEG_INFINITY,
                min_longitude: f64::INFINITY,
                max_longitude: f64::NEG_INFINITY,
            },
            |acc, p| Self {
                min_latitude: acc.min_latitude.min(p.latitude),
                max_latitude: acc.max_latitude.max(p.latitude),
                min_longitude: acc.min_longitude.min(p.longitude),
                max_longitude: acc.max_longitude.max(p.longitude),
            },
        )
    }

    /// `true` when `point` lies strictly inside the box.
    #[must_use]
    pub fn strictly_contains(&self, point: Coordinate) -> bool {
        point.latitude > self.min_latitude
            && point.latitude < self.max_latitude
            && point.longitude > self.min_longitude
            && point.longitude < self.max_longitude
    }
}

/// A normalized ring of at least three distinct, non-collinear vertices.
///
/// The ring is implicitly closed: the last vertex connects back to the first
/// and is never repeated. Only [`normalize`] builds one, including when a
/// polygon is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct Polygon {
    points: Vec<Coordinate>,
    bounds: BoundingBox,
}

impl Polygon {
    #[must_use]
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub const fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Edges `(v[i], v[i + 1])`, wrapping from the last vertex to the first.
    pub fn edges(&self) -> impl Iterator<Item = (Coordinate, Coordinate)> + '_ {
        self.points
            .iter()
            .copied()
            .zip(self.points.iter().copied().cycle().skip(1))
    }
}

impl TryFrom<Vec<Coordinate>> for Polygon {
    type Error = InvalidPolygon;

    fn try_from(points: Vec<Coordinate>) -> Result<Self, Self::Error> {
        normalize(&points)
    }
}

impl From<Polygon> for Vec<Coordinate> {
    fn from(polygon: Polygon) -> Self {
        polygon.points
    }
}

/// Validate and canonicalize a raw vertex list.
///
/// Every vertex is rounded to six decimals, consecutive duplicates (including
/// a closing vertex equal to the first) are dropped, and the remaining ring
/// must have at least three distinct points that are not all collinear.
///
/// # Errors
///
/// Returns [`InvalidPolygon`] when a vertex is out of range, fewer than three
/// distinct points remain, or every point lies on one line.
pub fn normalize(raw: &[Coordinate]) -> Result<Polygon, InvalidPolygon> {
    if let Some((index, vertex)) = raw.iter().enumerate().find(|(_, c)| !c.is_in_range()) {
        return Err(InvalidPolygon::new(format!(
            "vertex {index} ({}, {}) is outside the valid latitude/longitude range",
            vertex.latitude, vertex.longitude
        )));
    }

    let mut points: Vec<Coordinate> = Vec::with_capacity(raw.len());
    for vertex in raw.iter().map(|c| c.rounded()) {
        if points.last().is_some_and(|last| last.same_position(&vertex)) {
            continue;
        }
        points.push(vertex);
    }
    while points.len() > 1
        && points
            .first()
            .zip(points.last())
            .is_some_and(|(first, last)| first.same_position(last))
    {
        points.pop();
    }

    let distinct: HashSet<(i64, i64)> = points.iter().map(Coordinate::micro_degrees).collect();
    if distinct.len() < 3 {
        return Err(InvalidPolygon::new(format!(
            "polygon needs at least 3 distinct points, got {}",
            distinct.len()
        )));
    }

    if all_collinear(&points) {
        return Err(InvalidPolygon::new("all points are collinear"));
    }

    let bounds = BoundingBox::of(&points);
    Ok(Polygon { points, bounds })
}

/// Even-odd ray casting containment test.
///
/// Points exactly on an edge or vertex are outside, so a point on the border
/// shared by two adjacent zones is not counted twice.
#[must_use]
pub fn contains_point(polygon: &Polygon, point: Coordinate) -> bool {
    if !polygon.bounds.strictly_contains(point) {
        return false;
    }

    let (x, y) = (point.longitude, point.latitude);
    let mut inside = false;
    for (a, b) in polygon.edges() {
        if on_segment(a, b, point) {
            return false;
        }
        let (xa, ya) = (a.longitude, a.latitude);
        let (xb, yb) = (b.longitude, b.latitude);
        if (ya > y) != (yb > y) {
            let x_cross = (xb - xa) * (y - ya) / (yb - ya) + xa;
            if x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// `true` when no two non-adjacent edges of the ring touch or cross.
#[must_use]
pub fn is_simple(polygon: &Polygon) -> bool {
    let edges: Vec<_> = polygon.edges().collect();
    let n = edges.len();
    for (i, &(a, b)) in edges.iter().enumerate() {
        for (j, &(c, d)) in edges.iter().enumerate().skip(i + 2) {
            if i == 0 && j == n - 1 {
                continue;
            }
            if segments_intersect(a, b, c, d) {
                return false;
            }
        }
    }
    true
}

fn cross(o: Coordinate, a: Coordinate, b: Coordinate) -> f64 {
    (a.longitude - o.longitude) * (b.latitude - o.latitude)
        - (a.latitude - o.latitude) * (b.longitude - o.longitude)
}

fn all_collinear(points: &[Coordinate]) -> bool {
    let n = points.len();
    (0..n).all(|i| {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        cross(a, b, c).abs() <= COLLINEAR_EPSILON
    })
}

fn within_box(a: Coordinate, b: Coordinate, p: Coordinate) -> bool {
    p.longitude >= a.longitude.min(b.longitude)
        && p.longitude <= a.longitude.max(b.longitude)
        && p.latitude >= a.latitude.min(b.latitude)
        && p.latitude <= a.latitude.max(b.latitude)
}

// Exact comparison on purpose: the boundary rule uses plain double equality.
#[allow(clippy::float_cmp)]
fn on_segment(a: Coordinate, b: Coordinate, p: Coordinate) -> bool {
    cross(a, b, p) == 0.0 && within_box(a, b, p)
}

#[allow(clippy::float_cmp)]
fn segments_intersect(a: Coordinate, b: Coordinate, c: Coordinate, d: Coordinate) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && within_box(c, d, a))
        || (d2 == 0.0 && within_box(c, d, b))
        || (d3 == 0.0 && within_box(a, b, c))
        || (d4 == 0.0 && within_box(a, b, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Coordinate> {
        raw.iter()
            .map(|&(lat, lon)| Coordinate::new(lat, lon))
            .collect()
    }

    fn square() -> Polygon {
        normalize(&pts(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)])).unwrap()
    }

    #[test]
    fn square_contains_center() {
        assert!(contains_point(&square(), Coordinate::new(5.0, 5.0)));
    }

    #[test]
    fn square_excludes_outside_point() {
        assert!(!contains_point(&square(), Coordinate::new(15.0, 15.0)));
    }

    #[test]
    fn point_on_edge_is_outside() {
        assert!(!contains_point(&square(), Coordinate::new(0.0, 5.0)));
        assert!(!contains_point(&square(), Coordinate::new(5.0, 10.0)));
    }

    #[test]
    fn vertex_is_outside() {
        assert!(!contains_point(&square(), Coordinate::new(10.0, 10.0)));
    }

    #[test]
    fn concave_notch_is_outside() {
        // U shape opening north; the notch between the arms is not covered.
        let u = normalize(&pts(&[
            (0.0, 0.0),
            (0.0, 9.0),
            (9.0, 9.0),
            (9.0, 6.0),
            (3.0, 6.0),
            (3.0, 3.0),
            (9.0, 3.0),
            (9.0, 0.0),
        ]))
        .unwrap();
        assert!(!contains_point(&u, Coordinate::new(6.0, 4.5)));
        assert!(contains_point(&u, Coordinate::new(6.0, 1.5)));
        assert!(contains_point(&u, Coordinate::new(1.5, 4.5)));
    }

    #[test]
    fn shared_border_counts_for_neither_zone() {
        let west = normalize(&pts(&[(0.0, 0.0), (0.0, 5.0), (5.0, 5.0), (5.0, 0.0)])).unwrap();
        let east = normalize(&pts(&[(0.0, 5.0), (0.0, 10.0), (5.0, 10.0), (5.0, 5.0)])).unwrap();
        let border = Coordinate::new(2.5, 5.0);
        assert!(!contains_point(&west, border));
        assert!(!contains_point(&east, border));
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = pts(&[
            (-38.716_123_456_7, -62.262_000_000_4),
            (-38.710_000_000_1, -62.250_987_654_3),
            (-38.720_555_555_5, -62.255_111_111_1),
        ]);
        let once = normalize(&raw).unwrap();
        let twice = normalize(once.points()).unwrap();
        let bits = |p: &Polygon| -> Vec<(u64, u64)> {
            p.points()
                .iter()
                .map(|c| (c.latitude.to_bits(), c.longitude.to_bits()))
                .collect()
        };
        assert_eq!(bits(&once), bits(&twice));
    }

    #[test]
    fn normalize_rejects_repeated_single_point() {
        let err = normalize(&pts(&[(0.0, 0.0), (0.0, 0.0), (0.0, 0.0)])).unwrap_err();
        assert!(err.reason.contains("at least 3 distinct"));
    }

    #[test]
    fn normalize_rejects_collinear_points() {
        let err = normalize(&pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)])).unwrap_err();
        assert!(err.reason.contains("collinear"));
    }

    #[test]
    fn normalize_drops_closing_vertex() {
        let polygon = normalize(&pts(&[
            (-34.6037, -58.3816),
            (-34.6000, -58.3750),
            (-34.5950, -58.3750),
            (-34.5950, -58.3850),
            (-34.6037, -58.3816),
        ]))
        .unwrap();
        assert_eq!(polygon.len(), 4);
    }

    #[test]
    fn normalize_drops_jittered_consecutive_duplicates() {
        let polygon = normalize(&pts(&[
            (0.0, 0.0),
            (0.000_000_01, 0.0),
            (0.0, 1.0),
            (1.0, 1.0),
        ]))
        .unwrap();
        assert_eq!(polygon.len(), 3);
    }

    #[test]
    fn normalize_rejects_out_of_range_vertex() {
        let err = normalize(&pts(&[(0.0, 0.0), (95.0, 1.0), (1.0, 1.0)])).unwrap_err();
        assert!(err.reason.contains("vertex 1"));
    }

    #[test]
    fn polygon_deserializes_through_normalize() {
        let json = r#"[
            {"latitude": 0.0, "longitude": 0.0},
            {"latitude": 0.0, "longitude": 0.0},
            {"latitude": 0.0, "longitude": 0.0}
        ]"#;
        assert!(serde_json::from_str::<Polygon>(json).is_err());
    }

    #[test]
    fn bow_tie_is_not_simple() {
        let bow_tie =
            normalize(&pts(&[(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)])).unwrap();
        assert!(!is_simple(&bow_tie));
        assert!(is_simple(&square()));
    }
}
