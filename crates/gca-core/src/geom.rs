//! Double-precision vectors and quaternions.
//!
//! Positions and orientations are kept in f64 throughout; pair energies
//! are accumulated in f32 (see the patch-energy contract in gca-clusters).

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn norm_sq(self) -> f64 {
        self.dot(self)
    }

    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quat {
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }

    /// Pure quaternion (0, n): a rotation by pi about the unit axis `n`.
    pub fn pi_rotation(axis: Vec3) -> Self {
        Self {
            x: axis.x,
            y: axis.y,
            z: axis.z,
            w: 0.0,
        }
    }

    pub fn rotate_vec(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let s = self.w;
        let term1 = u.scale(2.0 * u.dot(v));
        let term2 = v.scale(s * s - u.dot(u));
        let term3 = u.cross(v).scale(2.0 * s);
        term1.add(term2).add(term3)
    }

    /// Hamilton product `self * other`.
    pub fn mul(self, other: Self) -> Self {
        Self {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }
}

/// Reflect `pos` through the line defined by `pivot` and the pi-rotation
/// quaternion `q` (equivalent to rotating by pi about the line).
pub fn line_reflection(pos: Vec3, pivot: Vec3, q: Quat) -> Vec3 {
    pivot.add(q.rotate_vec(pos.sub(pivot)))
}

/// Reflect `pos` through the point `pivot`.
pub fn point_reflection(pos: Vec3, pivot: Vec3) -> Vec3 {
    pivot.scale(2.0).sub(pos)
}
