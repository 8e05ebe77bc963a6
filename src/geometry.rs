//! Cartesian points and polygons in the maze plane.

use core::ops::{Add, AddAssign, Sub};

use uom::si::angle::radian;
use uom::si::f64::{Angle, Length};
use uom::si::length::meter;

/// A point in the maze plane, `(0, 0)` at the bottom-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Cartesian {
    pub x: Length,
    pub y: Length,
}

impl Cartesian {
    pub fn new(x: Length, y: Length) -> Self {
        Self { x, y }
    }

    /// Euclidean norm.
    pub fn rho(&self) -> Length {
        Length::new::<meter>(self.x.value.hypot(self.y.value))
    }

    /// Polar angle, measured counterclockwise from the positive x axis.
    pub fn theta(&self) -> Angle {
        Angle::new::<radian>(self.y.value.atan2(self.x.value))
    }

    /// Whether two points coincide to within [`POSITION_EPSILON`].
    ///
    /// [`POSITION_EPSILON`]: crate::units::POSITION_EPSILON
    pub fn approx_eq(&self, other: &Cartesian) -> bool {
        (self.x - other.x).abs() < crate::units::POSITION_EPSILON
            && (self.y - other.y).abs() < crate::units::POSITION_EPSILON
    }
}

impl Add for Cartesian {
    type Output = Cartesian;

    fn add(self, other: Cartesian) -> Cartesian {
        Cartesian {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for Cartesian {
    fn add_assign(&mut self, other: Cartesian) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Cartesian {
    type Output = Cartesian;

    fn sub(self, other: Cartesian) -> Cartesian {
        Cartesian {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

/// Rotate a single vertex counterclockwise around a pivot.
pub fn rotate_vertex_around_point(vertex: Cartesian, angle: Angle, point: Cartesian) -> Cartesian {
    let dx = vertex.x - point.x;
    let dy = vertex.y - point.y;
    let (sin_th, cos_th) = angle.value.sin_cos();
    Cartesian {
        x: point.x + dx * cos_th - dy * sin_th,
        y: point.y + dx * sin_th + dy * cos_th,
    }
}

/// An ordered list of vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon(Vec<Cartesian>);

impl Polygon {
    pub fn new(vertices: Vec<Cartesian>) -> Self {
        Self(vertices)
    }

    pub fn vertices(&self) -> &[Cartesian] {
        &self.0
    }

    pub fn translate(&self, delta: Cartesian) -> Polygon {
        Polygon(self.0.iter().map(|&v| v + delta).collect())
    }

    pub fn rotate_around_point(&self, angle: Angle, point: Cartesian) -> Polygon {
        Polygon(
            self.0
                .iter()
                .map(|&v| rotate_vertex_around_point(v, angle, point))
                .collect(),
        )
    }

    /// A regular polygon approximating a circle, vertices counterclockwise.
    pub fn circle(center: Cartesian, radius: Length, num_vertices: usize) -> Polygon {
        use core::f64::consts::TAU;

        Polygon(
            (0..num_vertices)
                .map(|i| {
                    let theta = TAU * i as f64 / num_vertices as f64;
                    Cartesian {
                        x: center.x + radius * theta.cos(),
                        y: center.y + radius * theta.sin(),
                    }
                })
                .collect(),
        )
    }

    /// Convex hull of all vertices of all polygons, counterclockwise.
    pub fn convex_hull(polygons: &[Polygon]) -> Polygon {
        let mut points: Vec<(f64, f64)> = polygons
            .iter()
            .flat_map(|polygon| polygon.0.iter())
            .map(|v| (v.x.value, v.y.value))
            .collect();
        points.sort_unstable_by(|a, b| {
            a.partial_cmp(b)
                .expect("Should never fail: vertices must not be `NAN`.")
        });
        points.dedup();

        if points.len() < 3 {
            return Polygon(
                points
                    .into_iter()
                    .map(|(x, y)| Cartesian {
                        x: Length::new::<meter>(x),
                        y: Length::new::<meter>(y),
                    })
                    .collect(),
            );
        }

        let cross = |o: (f64, f64), a: (f64, f64), b: (f64, f64)| {
            (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
        };

        // Monotone chain: build lower and upper hulls separately.
        let mut lower: Vec<(f64, f64)> = Vec::new();
        for &p in &points {
            while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0
            {
                lower.pop();
            }
            lower.push(p);
        }
        let mut upper: Vec<(f64, f64)> = Vec::new();
        for &p in points.iter().rev() {
            while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0
            {
                upper.pop();
            }
            upper.push(p);
        }
        lower.pop();
        upper.pop();
        lower.extend(upper);

        Polygon(
            lower
                .into_iter()
                .map(|(x, y)| Cartesian {
                    x: Length::new::<meter>(x),
                    y: Length::new::<meter>(y),
                })
                .collect(),
        )
    }

    /// Ray-crossing test. Points on an edge may land on either side.
    pub fn contains(&self, point: Cartesian) -> bool {
        let px = point.x.value;
        let py = point.y.value;
        let mut inside = false;
        let n = self.0.len();
        for i in 0..n {
            let a = self.0[i];
            let b = self.0[(i + 1) % n];
            let (ax, ay) = (a.x.value, a.y.value);
            let (bx, by) = (b.x.value, b.y.value);
            if (ay > py) != (by > py) && px < (bx - ax) * (py - ay) / (by - ay) + ax {
                inside = !inside;
            }
        }
        inside
    }

    /// Separating-axis test. Both polygons must be convex.
    pub fn intersects_convex(&self, other: &Polygon) -> bool {
        let project = |polygon: &Polygon, axis: (f64, f64)| {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for v in &polygon.0 {
                let d = v.x.value * axis.0 + v.y.value * axis.1;
                min = min.min(d);
                max = max.max(d);
            }
            (min, max)
        };

        for polygon in [self, other] {
            let n = polygon.0.len();
            for i in 0..n {
                let a = polygon.0[i];
                let b = polygon.0[(i + 1) % n];
                let axis = (-(b.y.value - a.y.value), b.x.value - a.x.value);
                let (min_a, max_a) = project(self, axis);
                let (min_b, max_b) = project(other, axis);
                if max_a < min_b || max_b < min_a {
                    return false;
                }
            }
        }
        true
    }
}
