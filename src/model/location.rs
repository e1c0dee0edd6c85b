use std::hash::{Hash, Hasher};

use geo::Point;

use super::GraphId;

/// How a routed path treats the location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StopType {
    /// The path stops here.
    #[default]
    Break,
    /// The path passes through without stopping.
    Through,
}

/// An input location to correlate against the graph.
#[derive(Debug, Clone)]
pub struct Location {
    pub latlng: Point<f64>,
    /// Preferred travel heading in degrees, 0 at north, clockwise.
    pub heading: Option<f64>,
    /// Maximum angular deviation from `heading` before an edge is filtered.
    pub heading_tolerance: Option<f64>,
    /// ISO 8601 local date/time, or the literal `"current"`.
    pub date_time: Option<String>,
    pub stop_type: StopType,
}

impl Location {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            latlng: Point::new(lng, lat),
            heading: None,
            heading_tolerance: None,
            date_time: None,
            stop_type: StopType::Break,
        }
    }
}

// Locations key the search result map; compare coordinates bitwise so NaN
// inputs at least hash consistently.
impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.latlng.x().to_bits() == other.latlng.x().to_bits()
            && self.latlng.y().to_bits() == other.latlng.y().to_bits()
            && self.heading.map(f64::to_bits) == other.heading.map(f64::to_bits)
            && self.stop_type == other.stop_type
            && self.date_time == other.date_time
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latlng.x().to_bits().hash(state);
        self.latlng.y().to_bits().hash(state);
        self.heading.map(f64::to_bits).hash(state);
        self.stop_type.hash(state);
        self.date_time.hash(state);
    }
}

/// Which side of the directed edge the query point lies on, relative to the
/// edge's forward direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SideOfStreet {
    #[default]
    None,
    Left,
    Right,
}

impl SideOfStreet {
    pub fn flip(self) -> Self {
        match self {
            SideOfStreet::Left => SideOfStreet::Right,
            SideOfStreet::Right => SideOfStreet::Left,
            SideOfStreet::None => SideOfStreet::None,
        }
    }
}

/// One correlated edge of a [`PathLocation`].
#[derive(Debug, Clone)]
pub struct PathEdge {
    pub id: GraphId,
    /// Fractional position along the edge, measured in its forward
    /// direction.
    pub ratio: f64,
    /// The snapped point on the edge shape.
    pub projected: Point<f64>,
    /// Distance in meters from the input location to the snapped point.
    pub distance: f64,
    pub side: SideOfStreet,
}

impl PathEdge {
    /// The location snapped to the start node of this edge.
    pub fn begin_node(&self) -> bool {
        self.ratio == 0.0
    }

    /// The location snapped to the end node of this edge.
    pub fn end_node(&self) -> bool {
        self.ratio == 1.0
    }
}

/// A location correlated to the graph: the input plus the ranked candidate
/// edges it may enter or leave on.
#[derive(Debug, Clone)]
pub struct PathLocation {
    pub location: Location,
    pub edges: Vec<PathEdge>,
}

impl PathLocation {
    pub fn new(location: Location) -> Self {
        Self { location, edges: Vec::new() }
    }

    pub fn latlng(&self) -> Point<f64> {
        self.location.latlng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_side_twice_is_identity() {
        for side in [SideOfStreet::None, SideOfStreet::Left, SideOfStreet::Right] {
            assert_eq!(side.flip().flip(), side);
        }
    }

    #[test]
    fn locations_key_by_value() {
        let a = Location::new(13.4, 52.5);
        let mut b = Location::new(13.4, 52.5);
        assert_eq!(a, b);
        b.heading = Some(90.0);
        assert_ne!(a, b);
    }
}
