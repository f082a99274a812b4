//! Closed set of rigid particle shapes behind a uniform capability
//! surface: AABB, circumsphere diameter, orientational degrees of freedom
//! and the exact pair overlap test.

use crate::aabb::Aabb;
use crate::geom::{Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeParams {
    Sphere { diameter: f64 },
    Spherocylinder { diameter: f64, length: f64 },
}

impl ShapeParams {
    pub fn circumsphere_diameter(&self) -> f64 {
        match *self {
            ShapeParams::Sphere { diameter } => diameter,
            ShapeParams::Spherocylinder { diameter, length } => diameter + length,
        }
    }

    pub fn has_orientation(&self) -> bool {
        match *self {
            ShapeParams::Sphere { .. } => false,
            ShapeParams::Spherocylinder { .. } => true,
        }
    }

    pub fn aabb(&self, pos: Vec3, orientation: Quat) -> Aabb {
        match *self {
            ShapeParams::Sphere { diameter } => Aabb::from_sphere(pos, diameter / 2.0),
            ShapeParams::Spherocylinder { diameter, .. } => {
                let half = self.half_axis(orientation);
                let r = diameter / 2.0;
                let e1 = pos.add(half);
                let e2 = pos.sub(half);
                Aabb::new(
                    Vec3::new(e1.x.min(e2.x) - r, e1.y.min(e2.y) - r, e1.z.min(e2.z) - r),
                    Vec3::new(e1.x.max(e2.x) + r, e1.y.max(e2.y) + r, e1.z.max(e2.z) + r),
                )
            }
        }
    }

    /// Half of the cylinder axis in world frame (zero for spheres).
    fn half_axis(&self, orientation: Quat) -> Vec3 {
        match *self {
            ShapeParams::Sphere { .. } => Vec3::default(),
            ShapeParams::Spherocylinder { length, .. } => {
                orientation.rotate_vec(Vec3::new(0.0, 0.0, length / 2.0))
            }
        }
    }

    pub fn core_diameter(&self) -> f64 {
        match *self {
            ShapeParams::Sphere { diameter } => diameter,
            ShapeParams::Spherocylinder { diameter, .. } => diameter,
        }
    }
}

/// Exact overlap test for a pair with separation `r_ij` (from i to j).
pub fn overlap_test(
    r_ij: Vec3,
    shape_i: &ShapeParams,
    orient_i: Quat,
    shape_j: &ShapeParams,
    orient_j: Quat,
) -> bool {
    let touch = (shape_i.core_diameter() + shape_j.core_diameter()) / 2.0;
    let a = shape_i.half_axis(orient_i);
    let b = shape_j.half_axis(orient_j);
    let dist_sq = segment_segment_dist_sq(Vec3::default(), a, r_ij, b);
    dist_sq < touch * touch
}

/// Squared minimum distance between segments `[c1-a, c1+a]` and
/// `[c2-b, c2+b]`. Degenerate (zero-length) segments reduce to
/// point-segment and point-point distances.
fn segment_segment_dist_sq(c1: Vec3, a: Vec3, c2: Vec3, b: Vec3) -> f64 {
    let d = c2.sub(c1);
    let aa = a.dot(a);
    let bb = b.dot(b);
    let ab = a.dot(b);
    let ad = a.dot(d);
    let bd = b.dot(d);

    let denom = aa * bb - ab * ab;
    // parameters in [-1, 1] along each axis
    let mut s;
    let t;
    if aa <= 1e-24 && bb <= 1e-24 {
        return d.dot(d);
    }
    if aa <= 1e-24 {
        s = 0.0;
        t = (-bd / bb).clamp(-1.0, 1.0);
    } else if bb <= 1e-24 {
        t = 0.0;
        s = (ad / aa).clamp(-1.0, 1.0);
    } else {
        if denom > 1e-24 * aa * bb {
            s = ((ad * bb - bd * ab) / denom).clamp(-1.0, 1.0);
        } else {
            // parallel axes
            s = 0.0;
        }
        t = ((s * ab - bd) / bb).clamp(-1.0, 1.0);
        s = ((ad + t * ab) / aa).clamp(-1.0, 1.0);
    }
    let p1 = c1.add(a.scale(s));
    let p2 = c2.add(b.scale(t));
    p2.sub(p1).norm_sq()
}

/// Symmetric boolean matrix deciding which type pairs are checked for
/// hard overlap.
#[derive(Clone, Debug)]
pub struct InteractionMatrix {
    n_types: usize,
    check: Vec<bool>,
}

impl InteractionMatrix {
    pub fn all(n_types: usize) -> Self {
        Self {
            n_types,
            check: vec![true; n_types * n_types],
        }
    }

    pub fn set(&mut self, type_i: u32, type_j: u32, enabled: bool) {
        let (i, j) = (type_i as usize, type_j as usize);
        self.check[i * self.n_types + j] = enabled;
        self.check[j * self.n_types + i] = enabled;
    }

    pub fn checks(&self, type_i: u32, type_j: u32) -> bool {
        self.check[type_i as usize * self.n_types + type_j as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPHERE: ShapeParams = ShapeParams::Sphere { diameter: 1.0 };
    const ROD: ShapeParams = ShapeParams::Spherocylinder {
        diameter: 1.0,
        length: 4.0,
    };

    #[test]
    fn spheres_overlap_inside_diameter() {
        let id = Quat::identity();
        assert!(overlap_test(Vec3::new(0.9, 0.0, 0.0), &SPHERE, id, &SPHERE, id));
        assert!(!overlap_test(Vec3::new(1.1, 0.0, 0.0), &SPHERE, id, &SPHERE, id));
    }

    #[test]
    fn touching_spheres_do_not_overlap() {
        let id = Quat::identity();
        assert!(!overlap_test(Vec3::new(1.0, 0.0, 0.0), &SPHERE, id, &SPHERE, id));
    }

    #[test]
    fn rod_reaches_along_axis() {
        let id = Quat::identity();
        // rod along z: half length 2 plus radii 0.5 + 0.5
        assert!(overlap_test(Vec3::new(0.0, 0.0, 2.9), &ROD, id, &SPHERE, id));
        assert!(!overlap_test(Vec3::new(0.0, 0.0, 3.1), &ROD, id, &SPHERE, id));
        // but only diameter sideways
        assert!(!overlap_test(Vec3::new(1.1, 0.0, 0.0), &ROD, id, &SPHERE, id));
    }

    #[test]
    fn crossed_rods_overlap_at_short_center_distance() {
        let id = Quat::identity();
        // rotate second rod to lie along x
        let q = Quat {
            x: 0.0,
            y: std::f64::consts::FRAC_1_SQRT_2,
            z: 0.0,
            w: std::f64::consts::FRAC_1_SQRT_2,
        };
        assert!(overlap_test(Vec3::new(0.0, 0.9, 0.0), &ROD, id, &ROD, q));
        assert!(!overlap_test(Vec3::new(0.0, 1.1, 0.0), &ROD, id, &ROD, q));
    }

    #[test]
    fn circumsphere_and_orientation_flags() {
        assert_eq!(SPHERE.circumsphere_diameter(), 1.0);
        assert_eq!(ROD.circumsphere_diameter(), 5.0);
        assert!(!SPHERE.has_orientation());
        assert!(ROD.has_orientation());
    }

    #[test]
    fn rod_aabb_covers_both_caps() {
        let id = Quat::identity();
        let aabb = ROD.aabb(Vec3::new(1.0, 2.0, 3.0), id);
        assert!((aabb.lo.z - 0.5).abs() < 1e-12);
        assert!((aabb.hi.z - 5.5).abs() < 1e-12);
        assert!((aabb.lo.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn interaction_matrix_is_symmetric() {
        let mut m = InteractionMatrix::all(2);
        assert!(m.checks(0, 1));
        m.set(0, 1, false);
        assert!(!m.checks(1, 0));
        assert!(m.checks(0, 0));
    }
}
