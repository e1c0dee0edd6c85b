use geo::{Distance, Haversine, Point};

/// Great-circle distance in meters.
pub fn distance(a: Point<f64>, b: Point<f64>) -> f64 {
    Haversine::distance(a, b)
}

/// Compass heading from `a` to `b` in degrees, 0 at north, clockwise,
/// normalized to `[0, 360)`.
pub fn heading(a: Point<f64>, b: Point<f64>) -> f64 {
    let phi1 = a.y().to_radians();
    let phi2 = b.y().to_radians();
    let dl = (b.x() - a.x()).to_radians();
    let y = dl.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dl.cos();
    let deg = y.atan2(x).to_degrees();
    if deg < 0.0 { deg + 360.0 } else { deg }
}

/// Point at parameter `t` along the segment from `a` to `b`.
pub fn affine_combination(a: Point<f64>, b: Point<f64>, t: f64) -> Point<f64> {
    Point::new(a.x() + (b.x() - a.x()) * t, a.y() + (b.y() - a.y()) * t)
}

/// Half-plane test: is `q` strictly left of the directed segment `a -> b`?
pub fn is_left(a: Point<f64>, b: Point<f64>, q: Point<f64>) -> bool {
    (b.x() - a.x()) * (q.y() - a.y()) - (b.y() - a.y()) * (q.x() - a.x()) > 0.0
}

/// Project `q` onto the segment `(u, v)`, treating the neighbourhood as
/// planar with longitude scaled by `lon_scale` (the cosine of the query
/// latitude). Coincident endpoints fall back to `u` rather than dividing by
/// zero, and the parameter is clamped to the segment.
pub fn project_onto_segment(
    q: Point<f64>,
    u: Point<f64>,
    v: Point<f64>,
    lon_scale: f64,
) -> Point<f64> {
    let bx = v.x() - u.x();
    let by = v.y() - u.y();
    let bx2 = bx * lon_scale;
    let sq = bx2 * bx2 + by * by;
    let scale = if sq > 0.0 {
        ((q.x() - u.x()) * lon_scale * bx2 + (q.y() - u.y()) * by) / sq
    } else {
        0.0
    };
    if scale <= 0.0 {
        u
    } else if scale >= 1.0 {
        v
    } else {
        Point::new(u.x() + bx * scale, u.y() + by * scale)
    }
}

/// Estimate the tangent heading of a discretized curve at `point`, which lies
/// on segment `index` of `shape` (between vertices `index` and `index + 1`).
///
/// Up to `sample` meters of shape are accumulated on the incoming side of the
/// point (with respect to the `forward` orientation); if the shape runs out
/// there, sampling continues on the outgoing side. The returned heading points
/// along the travel direction at `point`.
pub fn tangent_angle(
    index: usize,
    point: Point<f64>,
    shape: &[Point<f64>],
    forward: bool,
    sample: f64,
) -> f64 {
    let mut remaining = sample;

    // Walk the incoming side until enough shape is accumulated.
    let mut u = point;
    if forward {
        let mut i = index;
        loop {
            let d = distance(u, shape[i]);
            if remaining <= d && d > 0.0 {
                u = affine_combination(u, shape[i], remaining / d);
                return heading(u, point);
            }
            remaining -= d;
            u = shape[i];
            if i == 0 {
                break;
            }
            i -= 1;
        }
    } else {
        let mut i = index + 1;
        while i < shape.len() {
            let d = distance(u, shape[i]);
            if remaining <= d && d > 0.0 {
                u = affine_combination(u, shape[i], remaining / d);
                return heading(u, point);
            }
            remaining -= d;
            u = shape[i];
            i += 1;
        }
    }

    // Not enough incoming shape, keep sampling on the outgoing side.
    let mut v = point;
    if forward {
        let mut i = index + 1;
        while i < shape.len() {
            let d = distance(v, shape[i]);
            if remaining <= d && d > 0.0 {
                v = affine_combination(v, shape[i], remaining / d);
                return heading(u, v);
            }
            remaining -= d;
            v = shape[i];
            i += 1;
        }
    } else {
        let mut i = index;
        loop {
            let d = distance(v, shape[i]);
            if remaining <= d && d > 0.0 {
                v = affine_combination(v, shape[i], remaining / d);
                return heading(u, v);
            }
            remaining -= d;
            v = shape[i];
            if i == 0 {
                break;
            }
            i -= 1;
        }
    }

    heading(u, v)
}

/// Resample a polyline so consecutive points are `interval` meters apart.
/// The first and last input points are kept; only the final output segment
/// may be shorter than the interval.
pub fn resample_spherical_polyline(shape: &[Point<f64>], interval: f64) -> Vec<Point<f64>> {
    let mut out = Vec::with_capacity(shape.len());
    let Some(&first) = shape.first() else {
        return out;
    };
    out.push(first);

    let mut remaining = interval;
    for w in shape.windows(2) {
        let (a, b) = (w[0], w[1]);
        let d = distance(a, b);
        if d <= 0.0 {
            continue;
        }
        let mut along = 0.0;
        while remaining <= d - along {
            along += remaining;
            out.push(affine_combination(a, b, along / d));
            remaining = interval;
        }
        remaining -= d - along;
    }

    let back = shape[shape.len() - 1];
    if *out.last().unwrap() != back {
        out.push(back);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_midpoint_of_meridian_segment() {
        let u = Point::new(0.0, 0.0);
        let v = Point::new(0.0, 0.001);
        let q = Point::new(0.0005, 0.0005);
        let p = project_onto_segment(q, u, v, 1.0);
        assert!((p.x() - 0.0).abs() < 1e-12);
        assert!((p.y() - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn project_clamps_to_endpoints() {
        let u = Point::new(0.0, 0.0);
        let v = Point::new(0.0, 0.001);
        assert_eq!(project_onto_segment(Point::new(0.0, -1.0), u, v, 1.0), u);
        assert_eq!(project_onto_segment(Point::new(0.0, 1.0), u, v, 1.0), v);
    }

    #[test]
    fn project_coincident_endpoints_is_not_nan() {
        let u = Point::new(1.0, 1.0);
        let p = project_onto_segment(Point::new(2.0, 2.0), u, u, 1.0);
        assert_eq!(p, u);
    }

    #[test]
    fn heading_cardinal_directions() {
        let o = Point::new(0.0, 0.0);
        assert!((heading(o, Point::new(0.0, 1.0)) - 0.0).abs() < 1e-6);
        assert!((heading(o, Point::new(1.0, 0.0)) - 90.0).abs() < 1e-6);
        assert!((heading(o, Point::new(0.0, -1.0)) - 180.0).abs() < 1e-6);
        assert!((heading(o, Point::new(-1.0, 0.0)) - 270.0).abs() < 1e-6);
    }

    #[test]
    fn tangent_points_north_on_northbound_edge() {
        let shape = [Point::new(0.0, 0.0), Point::new(0.0, 0.001)];
        let mid = Point::new(0.0, 0.0005);
        let angle = tangent_angle(0, mid, &shape, true, 30.0);
        assert!(angle < 1.0 || angle > 359.0, "angle = {angle}");
        let rev = tangent_angle(0, mid, &shape, false, 30.0);
        assert!((rev - 180.0).abs() < 1.0, "angle = {rev}");
    }

    #[test]
    fn resample_spacing_is_uniform() {
        let shape = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.001),
            Point::new(0.0, 0.002),
        ];
        let out = resample_spherical_polyline(&shape, 25.0);
        assert_eq!(*out.first().unwrap(), shape[0]);
        assert_eq!(*out.last().unwrap(), shape[2]);
        // Only the final segment may fall short of the interval.
        for w in out.windows(2).take(out.len().saturating_sub(2)) {
            let d = distance(w[0], w[1]);
            assert!((d - 25.0).abs() < 0.5, "spacing = {d}");
        }
    }

    #[test]
    fn left_side_of_northbound_segment_is_west() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 1.0);
        assert!(is_left(a, b, Point::new(-0.5, 0.5)));
        assert!(!is_left(a, b, Point::new(0.5, 0.5)));
    }
}
