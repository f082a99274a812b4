//! Move proposal and the global transform.
//!
//! A cluster move is either a point reflection through a random pivot or
//! a line reflection (pi rotation) about a random axis through the pivot.
//! Line moves are forced whenever any shape carries orientational degrees
//! of freedom, since a point reflection would invert chirality.

use fxhash::FxHashSet;

use gca_core::geom::{line_reflection, point_reflection};
use gca_core::{Quat, ShapeParams, SimBox, Snapshot, StepRng, Vec3};

#[derive(Clone, Copy, Debug)]
pub struct MoveParams {
    pub line: bool,
    pub pivot: Vec3,
    pub axis: Quat,
}

/// Draw the move parameters for one update from the per-step stream.
pub fn propose(
    rng: &mut StepRng,
    move_ratio: f64,
    sim_box: &SimBox,
    ndim: u32,
    has_orientation: bool,
) -> MoveParams {
    let line = has_orientation || rng.uniform() > move_ratio;

    let fx = rng.uniform();
    let fy = rng.uniform();
    let fz = if ndim == 3 { rng.uniform() } else { 0.5 };
    let mut pivot = sim_box.make_coordinates([fx, fy, fz]);
    if ndim == 2 {
        pivot.z = 0.0;
    }

    let axis = if line {
        Quat::pi_rotation(rng.unit_vector(ndim))
    } else {
        Quat::identity()
    };

    MoveParams { line, pivot, axis }
}

/// Apply the move to every particle of a freshly taken snapshot.
///
/// Images are reset first; the wrap records the move-relative image shift.
/// Under a line move, particles outside the active region before or after
/// the transform are pre-flagged in `ptl_reject` (snapshot indices).
pub fn transform(
    snap: &mut Snapshot,
    mv: &MoveParams,
    shapes: &[ShapeParams],
    sim_box: &SimBox,
    range_frac: [f64; 3],
    ptl_reject: &mut FxHashSet<u32>,
) {
    for i in 0..snap.len() {
        snap.image[i] = [0, 0, 0];

        if mv.line && !sim_box.is_active(snap.position[i], range_frac) {
            ptl_reject.insert(i as u32);
        }

        if mv.line {
            snap.position[i] = line_reflection(snap.position[i], mv.pivot, mv.axis);
            if shapes[snap.type_id[i] as usize].has_orientation() {
                snap.orientation[i] = mv.axis.mul(snap.orientation[i]);
            }
        } else {
            snap.position[i] = point_reflection(snap.position[i], mv.pivot);
        }

        if mv.line && !sim_box.is_active(snap.position[i], range_frac) {
            ptl_reject.insert(i as u32);
        }

        sim_box.wrap(&mut snap.position[i], &mut snap.image[i]);
    }
}
