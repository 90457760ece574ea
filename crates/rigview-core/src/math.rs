//! Rigid-body math: points, rotations and transformations

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::ops::{Add, Mul, Neg, Sub};

/// Default tolerance for approximate comparisons
pub const EPSILON: f64 = 1e-9;

/// Pitch values closer than this to ±90° are treated as gimbal lock
const GIMBAL_TOLERANCE: f64 = 0.001;

/// A 3D point (or translation vector)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        (self.x - other.x).abs() < eps
            && (self.y - other.y).abs() < eps
            && (self.z - other.z).abs() < eps
    }
}

impl Neg for Point3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Add for Point3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Point3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// An orientation stored as a 3x3 orthonormal matrix (row-major).
///
/// Built from yaw `a` (about Z), pitch `b` (about Y) and roll `c` (about X),
/// composed as `Rz(a) * Ry(b) * Rx(c)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rotation3 {
    m: [[f64; 3]; 3],
}

impl Default for Rotation3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation3 {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Build a rotation from yaw, pitch and roll in radians
    pub fn from_angles(a: f64, b: f64, c: f64) -> Self {
        let (sa, ca) = a.sin_cos();
        let (sb, cb) = b.sin_cos();
        let (sc, cc) = c.sin_cos();

        Self {
            m: [
                [ca * cb, ca * sb * sc - sa * cc, ca * sb * cc + sa * sc],
                [sa * cb, sa * sb * sc + ca * cc, sa * sb * cc - ca * sc],
                [-sb, cb * sc, cb * cc],
            ],
        }
    }

    pub fn from_matrix(m: [[f64; 3]; 3]) -> Self {
        Self { m }
    }

    pub fn matrix(&self) -> &[[f64; 3]; 3] {
        &self.m
    }

    /// Yaw angle in radians. Defined as 0 at gimbal lock.
    pub fn a(&self) -> f64 {
        if near(self.b().abs(), FRAC_PI_2) {
            return 0.0;
        }
        self.m[1][0].atan2(self.m[0][0])
    }

    /// Pitch angle in radians, always within [-π/2, π/2]
    pub fn b(&self) -> f64 {
        let m = &self.m;
        (-m[2][0]).atan2((m[0][0] * m[0][0] + m[1][0] * m[1][0]).sqrt())
    }

    /// Roll angle in radians. At gimbal lock the roll absorbs the yaw and is
    /// read from the upper rows instead.
    pub fn c(&self) -> f64 {
        let b = self.b();
        let m = &self.m;
        if near(b, FRAC_PI_2) {
            return m[0][1].atan2(m[1][1]);
        }
        if near(b, -FRAC_PI_2) {
            return -m[0][1].atan2(m[1][1]);
        }
        m[2][1].atan2(m[2][2])
    }

    /// Extract (yaw, pitch, roll)
    pub fn angles(&self) -> (f64, f64, f64) {
        (self.a(), self.b(), self.c())
    }

    /// Matrix product `self * other`
    pub fn multiply(&self, other: &Rotation3) -> Rotation3 {
        let mut m = [[0.0; 3]; 3];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        Rotation3 { m }
    }

    /// The inverse of an orthonormal matrix is its transpose
    pub fn invert(&self) -> Rotation3 {
        let m = &self.m;
        Rotation3 {
            m: [
                [m[0][0], m[1][0], m[2][0]],
                [m[0][1], m[1][1], m[2][1]],
                [m[0][2], m[1][2], m[2][2]],
            ],
        }
    }

    /// Rotate a vector
    pub fn apply(&self, p: Point3) -> Point3 {
        let m = &self.m;
        Point3::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z,
            m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z,
            m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z,
        )
    }

    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(l, r)| (l - r).abs() < eps)
    }
}

impl Mul for Rotation3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(&rhs)
    }
}

fn near(a: f64, b: f64) -> bool {
    (a - b).abs() < GIMBAL_TOLERANCE
}

/// A rigid transformation: rotation followed by translation.
///
/// Composition is associative but not commutative: `a.compose(&b)` first
/// applies `b`, then `a`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub position: Point3,
    pub rotation: Rotation3,
}

impl Transformation {
    pub const IDENTITY: Self = Self {
        position: Point3::ZERO,
        rotation: Rotation3::IDENTITY,
    };

    pub fn new(position: Point3, rotation: Rotation3) -> Self {
        Self { position, rotation }
    }

    /// Build from the 6-DOF parameters used on the wire (metres and radians)
    pub fn from_xyzabc(x: f64, y: f64, z: f64, a: f64, b: f64, c: f64) -> Self {
        Self {
            position: Point3::new(x, y, z),
            rotation: Rotation3::from_angles(a, b, c),
        }
    }

    pub fn from_position(position: Point3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn from_rotation(rotation: Rotation3) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn z(&self) -> f64 {
        self.position.z
    }

    pub fn a(&self) -> f64 {
        self.rotation.a()
    }

    pub fn b(&self) -> f64 {
        self.rotation.b()
    }

    pub fn c(&self) -> f64 {
        self.rotation.c()
    }

    /// `self * other`: rotate other's translation, add ours, multiply rotations
    pub fn compose(&self, other: &Transformation) -> Transformation {
        Transformation {
            position: self.rotation.apply(other.position) + self.position,
            rotation: self.rotation.multiply(&other.rotation),
        }
    }

    /// Append a pure rotation in the local frame
    pub fn rotate_local(&self, rotation: &Rotation3) -> Transformation {
        Transformation {
            position: self.position,
            rotation: self.rotation.multiply(rotation),
        }
    }

    /// Move along the local axes
    pub fn translate_local(&self, offset: Point3) -> Transformation {
        Transformation {
            position: self.rotation.apply(offset) + self.position,
            rotation: self.rotation,
        }
    }

    /// Map a point given in this transformation's frame to the parent frame
    pub fn apply(&self, p: Point3) -> Point3 {
        self.rotation.apply(p) + self.position
    }

    pub fn invert(&self) -> Transformation {
        let rotation = self.rotation.invert();
        Transformation {
            position: -rotation.apply(self.position),
            rotation,
        }
    }

    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.position.approx_eq(&other.position, eps) && self.rotation.approx_eq(&other.rotation, eps)
    }

    /// Compose a chain of transformations given outermost first
    pub fn compose_all<'a, I>(chain: I) -> Transformation
    where
        I: IntoIterator<Item = &'a Transformation>,
    {
        chain
            .into_iter()
            .fold(Transformation::IDENTITY, |acc, t| acc.compose(t))
    }
}

impl Mul for Transformation {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(&rhs)
    }
}
