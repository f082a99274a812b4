use gca_core::{Quat, Vec3};

/// Isotropic-or-patchy pair energy evaluated at a given separation.
///
/// Numeric contract: positions and separations are f64, returned energies
/// are f32 and are accumulated in f32. Acceptance statistics depend on
/// this narrowing; do not widen it.
pub trait PatchEnergy {
    /// Cutoff radius beyond which the energy is exactly zero.
    fn r_cut(&self) -> f64;

    #[allow(clippy::too_many_arguments)]
    fn energy(
        &self,
        r_ij: Vec3,
        type_i: u32,
        orient_i: Quat,
        diameter_i: f64,
        charge_i: f64,
        type_j: u32,
        orient_j: Quat,
        diameter_j: f64,
        charge_j: f64,
    ) -> f32;
}

/// Square-well attraction: -epsilon inside the cutoff, zero outside.
#[derive(Clone, Copy, Debug)]
pub struct SquareWell {
    pub epsilon: f32,
    pub r_cut: f64,
}

impl PatchEnergy for SquareWell {
    fn r_cut(&self) -> f64 {
        self.r_cut
    }

    fn energy(
        &self,
        r_ij: Vec3,
        _type_i: u32,
        _orient_i: Quat,
        _diameter_i: f64,
        _charge_i: f64,
        _type_j: u32,
        _orient_j: Quat,
        _diameter_j: f64,
        _charge_j: f64,
    ) -> f32 {
        if r_ij.norm_sq() < self.r_cut * self.r_cut {
            -self.epsilon
        } else {
            0.0
        }
    }
}
