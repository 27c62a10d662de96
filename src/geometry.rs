//! Plane geometry used by collision checks and navigation.
//!
//! Every function here is pure. Angles are measured counter-clockwise from the positive x axis
//! and, unless stated otherwise, reported as whole degrees in `[0, 360)`.

/// Safety margin added to every collision boundary.
pub const COLLISION_MARGIN: f64 = 0.1;

/// A point (or a vector, e.g. a velocity) on the map.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Creates a position from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Position) -> f64 {
        distance(*self, *other)
    }

    /// Whole-degree direction from `self` to `other`.
    pub fn angle_to(&self, other: &Position) -> u32 {
        angle(*self, *other)
    }

    /// Exact direction from `self` to `other`, in degrees within `[0, 360)`.
    pub fn heading_to(&self, other: &Position) -> f64 {
        (other.y - self.y)
            .atan2(other.x - self.x)
            .to_degrees()
            .rem_euclid(360.0)
    }

    /// The point `length` away from `self` in direction `degrees`.
    pub fn offset(&self, degrees: f64, length: f64) -> Position {
        let radians = degrees.to_radians();
        Position::new(
            self.x + radians.cos() * length,
            self.y + radians.sin() * length,
        )
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Position, b: Position) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Direction from `a` to `b`, rounded to whole degrees and normalized into `[0, 360)`.
pub fn angle(a: Position, b: Position) -> u32 {
    // rounding 359.6 gives 360, which wraps back to 0
    (a.heading_to(&b).round() as u32) % 360
}

/// True if the straight path `start -> end` comes within `circle_radius + fudge` of
/// `circle_center`.
///
/// The closest point of the segment is used, so a circle that contains either endpoint is
/// always reported as intersecting. A degenerate segment (`start == end`) is a point test.
pub fn segment_intersects_circle(
    start: Position,
    end: Position,
    circle_center: Position,
    circle_radius: f64,
    fudge: f64,
) -> bool {
    let boundary = circle_radius + fudge;
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq <= f64::EPSILON {
        return distance(start, circle_center) <= boundary;
    }

    let t = (((circle_center.x - start.x) * dx + (circle_center.y - start.y) * dy) / length_sq)
        .clamp(0.0, 1.0);
    let closest = Position::new(start.x + dx * t, start.y + dy * t);
    distance(closest, circle_center) <= boundary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Position::new(1.0, 1.0);
        let b = Position::new(4.0, 5.0);
        assert!((distance(a, b) - 5.0).abs() < 1e-9);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-12);
    }

    #[test]
    fn angles_are_counter_clockwise_whole_degrees() {
        let origin = Position::new(10.0, 10.0);
        assert_eq!(angle(origin, Position::new(90.0, 90.0)), 45);
        assert_eq!(angle(origin, Position::new(20.0, 10.0)), 0);
        assert_eq!(angle(origin, Position::new(10.0, 20.0)), 90);
        assert_eq!(angle(origin, Position::new(0.0, 10.0)), 180);
        assert_eq!(angle(origin, Position::new(10.0, 0.0)), 270);
    }

    #[test]
    fn angle_rounding_wraps_to_zero() {
        let origin = Position::new(0.0, 0.0);
        // heading ~359.7 degrees
        let target = Position::new(100.0, -0.5);
        assert_eq!(angle(origin, target), 0);
        assert!(origin.heading_to(&target) > 359.0);
    }

    #[test]
    fn offset_follows_heading() {
        let p = Position::new(0.0, 0.0).offset(90.0, 3.0);
        assert!(p.x.abs() < 1e-9);
        assert!((p.y - 3.0).abs() < 1e-9);
    }

    #[test]
    fn segment_through_circle_intersects() {
        let start = Position::new(0.0, 0.0);
        let end = Position::new(10.0, 0.0);
        assert!(segment_intersects_circle(start, end, Position::new(5.0, 0.5), 0.5, 0.1));
        assert!(!segment_intersects_circle(start, end, Position::new(5.0, 2.0), 0.5, 0.1));
    }

    #[test]
    fn fudge_expands_the_boundary() {
        let start = Position::new(0.0, 0.0);
        let end = Position::new(10.0, 0.0);
        let center = Position::new(5.0, 1.0);
        assert!(!segment_intersects_circle(start, end, center, 0.5, 0.1));
        assert!(segment_intersects_circle(start, end, center, 0.5, 0.6));
    }

    #[test]
    fn circle_beyond_the_segment_ends_does_not_intersect() {
        let start = Position::new(0.0, 0.0);
        let end = Position::new(10.0, 0.0);
        assert!(!segment_intersects_circle(start, end, Position::new(-3.0, 0.0), 1.0, 0.1));
        assert!(!segment_intersects_circle(start, end, Position::new(13.0, 0.0), 1.0, 0.1));
    }

    #[test]
    fn circle_containing_an_endpoint_intersects() {
        let start = Position::new(0.0, 0.0);
        let end = Position::new(10.0, 0.0);
        assert!(segment_intersects_circle(start, end, Position::new(-0.5, 0.0), 1.0, 0.0));
        assert!(segment_intersects_circle(start, end, Position::new(10.5, 0.2), 1.0, 0.0));
    }

    #[test]
    fn degenerate_segment_is_a_point_test() {
        let p = Position::new(3.0, 3.0);
        assert!(segment_intersects_circle(p, p, Position::new(3.5, 3.0), 0.5, 0.0));
        assert!(!segment_intersects_circle(p, p, Position::new(5.0, 3.0), 0.5, 0.1));
    }

    #[test]
    fn intersection_does_not_depend_on_direction() {
        let a = Position::new(2.0, 7.0);
        let b = Position::new(31.0, -4.0);
        let centers = [
            Position::new(15.0, 2.0),
            Position::new(15.0, 5.0),
            Position::new(1.0, 7.5),
            Position::new(40.0, 40.0),
        ];
        for center in centers {
            assert_eq!(
                segment_intersects_circle(a, b, center, 1.0, 0.6),
                segment_intersects_circle(b, a, center, 1.0, 0.6),
                "{center:?}"
            );
        }
    }
}
