//! Interaction detection for one worker's particle range.
//!
//! Three passes against the bounding-volume trees, each over all periodic
//! images: old-old patch energies, new-old hard overlap plus patch
//! energies, and (line moves only) new-new persistence. Results land in a
//! per-call context; nothing global is mutated.

use std::ops::Range;

use fxhash::{FxHashMap, FxHashSet};

use gca_core::shapes::overlap_test;
use gca_core::{
    Aabb, AabbTree, InteractionMatrix, ParticleStore, Quat, ShapeParams, TagRemap, Vec3,
};

use crate::patch::PatchEnergy;

/// Pre-move copy of the worker's particle data. Images are zeroed: the
/// per-move image shift is re-derived relative to the backup.
#[derive(Clone, Debug)]
pub struct ConfigBackup {
    pub position: Vec<Vec3>,
    pub orientation: Vec<Quat>,
    pub type_id: Vec<u32>,
    pub diameter: Vec<f64>,
    pub charge: Vec<f64>,
    pub tag: Vec<u32>,
    pub image: Vec<[i32; 3]>,
}

impl ConfigBackup {
    pub fn of(store: &ParticleStore) -> Self {
        Self {
            position: store.position.clone(),
            orientation: store.orientation.clone(),
            type_id: store.type_id.clone(),
            diameter: store.diameter.clone(),
            charge: store.charge.clone(),
            tag: store.tag.clone(),
            image: vec![[0, 0, 0]; store.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn shape_aabbs(&self, shapes: &[ShapeParams]) -> Vec<Aabb> {
        (0..self.len())
            .map(|i| shapes[self.type_id[i] as usize].aabb(self.position[i], self.orientation[i]))
            .collect()
    }
}

/// One worker's interaction sets and energy maps for one update.
///
/// Pair energies accumulate in f32 while geometry stays f64; this
/// narrowing is part of the acceptance-statistics contract.
#[derive(Clone, Debug, Default)]
pub struct LocalInteractions {
    pub overlap: FxHashSet<(u32, u32)>,
    pub interact_old_old: FxHashSet<(u32, u32)>,
    pub interact_new_old: FxHashSet<(u32, u32)>,
    pub interact_new_new: FxHashSet<(u32, u32)>,
    pub local_reject: FxHashSet<u32>,
    pub energy_old_old: FxHashMap<(u32, u32), f32>,
    pub energy_new_old: FxHashMap<(u32, u32), f32>,
}

/// Read-only inputs shared by every worker's detection call.
pub struct DetectContext<'a> {
    /// New configuration (the reloaded, transformed snapshot).
    pub store: &'a ParticleStore,
    /// Old configuration backup, tags from before the snapshot re-tag.
    pub backup: &'a ConfigBackup,
    pub tree_old: &'a AabbTree,
    /// Tree over the new configuration; required for line moves.
    pub tree_new: Option<&'a AabbTree>,
    /// Periodic image shifts, zero image first.
    pub images: &'a [(Vec3, [i32; 3])],
    pub shapes: &'a [ShapeParams],
    pub matrix: &'a InteractionMatrix,
    pub patch: Option<&'a dyn PatchEnergy>,
    pub remap: &'a TagRemap,
    pub line: bool,
    pub min_core_diameter: f64,
}

fn image_delta_nonzero(hkl: [i32; 3], img_i: [i32; 3], img_j: [i32; 3]) -> bool {
    (0..3).any(|a| -hkl[a] + img_i[a] - img_j[a] != 0)
}

/// Detect all interactions for the worker owning `range`.
pub fn find_interactions(ctx: &DetectContext<'_>, range: Range<usize>) -> LocalInteractions {
    let mut out = LocalInteractions::default();
    let r_cut_patch = ctx.patch.map(|p| p.r_cut()).unwrap_or(0.0);

    // old configuration against itself, patch energies only
    if let Some(patch) = ctx.patch {
        let r_query = (r_cut_patch - ctx.min_core_diameter / 2.0).max(0.0);
        for i in range.clone() {
            let pos_i = ctx.backup.position[i];
            for (img_idx, &(shift, hkl)) in ctx.images.iter().enumerate() {
                let pos_i_image = pos_i.add(shift);
                let query = Aabb::from_sphere(pos_i_image, r_query);
                ctx.tree_old.for_each_overlapping(&query, |j| {
                    if ctx.backup.tag[i] == ctx.backup.tag[j] && img_idx == 0 {
                        return;
                    }
                    let r_ij = ctx.backup.position[j].sub(pos_i_image);
                    if r_ij.norm_sq() > r_cut_patch * r_cut_patch {
                        return;
                    }
                    let new_i = ctx.remap.get(ctx.backup.tag[i]);
                    let new_j = ctx.remap.get(ctx.backup.tag[j]);
                    let u = patch.energy(
                        r_ij,
                        ctx.backup.type_id[i],
                        ctx.backup.orientation[i],
                        ctx.backup.diameter[i],
                        ctx.backup.charge[i],
                        ctx.backup.type_id[j],
                        ctx.backup.orientation[j],
                        ctx.backup.diameter[j],
                        ctx.backup.charge[j],
                    );
                    // images contribute additively to the same pair
                    *out.energy_old_old.entry((new_i, new_j)).or_insert(0.0) += u;
                    out.interact_old_old.insert((new_i, new_j));
                    if ctx.line
                        && image_delta_nonzero(hkl, ctx.backup.image[i], ctx.backup.image[j])
                    {
                        out.local_reject.insert(new_i);
                        out.local_reject.insert(new_j);
                    }
                });
            }
        }
    }

    // new configuration against the old one
    for i in range.clone() {
        let type_i = ctx.store.type_id[i];
        let shape_i = &ctx.shapes[type_i as usize];
        let pos_i = ctx.store.position[i];
        let orient_i = ctx.store.orientation[i];
        let tag_i = ctx.store.tag[i];
        let r_excl_i = shape_i.circumsphere_diameter() / 2.0;
        let aabb_i = shape_i.aabb(pos_i, orient_i);

        for (img_idx, &(shift, hkl)) in ctx.images.iter().enumerate() {
            let pos_i_image = pos_i.add(shift);
            let query = aabb_i.translate(shift);
            ctx.tree_old.for_each_overlapping(&query, |j| {
                let new_j = ctx.remap.get(ctx.backup.tag[j]);
                if tag_i == new_j && img_idx == 0 {
                    return;
                }
                let r_ij = ctx.backup.position[j].sub(pos_i_image);
                let type_j = ctx.backup.type_id[j];
                let shape_j = &ctx.shapes[type_j as usize];
                let r_touch = r_excl_i + shape_j.circumsphere_diameter() / 2.0;
                if r_ij.norm_sq() <= r_touch * r_touch
                    && ctx.matrix.checks(type_i, type_j)
                    && overlap_test(r_ij, shape_i, orient_i, shape_j, ctx.backup.orientation[j])
                {
                    out.overlap.insert((tag_i, new_j));
                    if ctx.line
                        && image_delta_nonzero(hkl, ctx.store.image[i], ctx.backup.image[j])
                    {
                        out.local_reject.insert(tag_i);
                        out.local_reject.insert(new_j);
                    }
                }
            });
        }

        if let Some(patch) = ctx.patch {
            let r_query = (r_cut_patch - ctx.min_core_diameter / 2.0).max(0.0);
            for (img_idx, &(shift, hkl)) in ctx.images.iter().enumerate() {
                let pos_i_image = pos_i.add(shift);
                let query = Aabb::from_sphere(pos_i_image, r_query);
                ctx.tree_old.for_each_overlapping(&query, |j| {
                    let new_j = ctx.remap.get(ctx.backup.tag[j]);
                    if tag_i == new_j && img_idx == 0 {
                        return;
                    }
                    let r_ij = ctx.backup.position[j].sub(pos_i_image);
                    if r_ij.norm_sq() > r_cut_patch * r_cut_patch {
                        return;
                    }
                    let u = patch.energy(
                        r_ij,
                        type_i,
                        orient_i,
                        ctx.store.diameter[i],
                        ctx.store.charge[i],
                        ctx.backup.type_id[j],
                        ctx.backup.orientation[j],
                        ctx.backup.diameter[j],
                        ctx.backup.charge[j],
                    );
                    *out.energy_new_old.entry((tag_i, new_j)).or_insert(0.0) += u;
                    out.interact_new_old.insert((tag_i, new_j));
                    if ctx.line
                        && image_delta_nonzero(hkl, ctx.store.image[i], ctx.backup.image[j])
                    {
                        out.local_reject.insert(tag_i);
                        out.local_reject.insert(new_j);
                    }
                });
            }
        }
    }

    // new configuration against itself: interactions that persist after a
    // line move and cross a periodic image veto linkage later
    if ctx.line {
        let tree_new = ctx
            .tree_new
            .expect("line move detection requires the new-configuration tree");
        for i in range {
            let type_i = ctx.store.type_id[i];
            let shape_i = &ctx.shapes[type_i as usize];
            let pos_i = ctx.store.position[i];
            let orient_i = ctx.store.orientation[i];
            let tag_i = ctx.store.tag[i];
            let r_excl_i = shape_i.circumsphere_diameter() / 2.0;
            let r_query = r_excl_i.max(r_cut_patch - ctx.min_core_diameter / 2.0);
            let aabb_i = Aabb::from_sphere(pos_i, r_query);

            for &(shift, hkl) in ctx.images.iter() {
                let pos_i_image = pos_i.add(shift);
                let query = aabb_i.translate(shift);
                tree_new.for_each_overlapping(&query, |j| {
                    // no trivial bonds in any image
                    if tag_i == ctx.store.tag[j] {
                        return;
                    }
                    let r_ij = ctx.store.position[j].sub(pos_i_image);
                    let rsq = r_ij.norm_sq();
                    let type_j = ctx.store.type_id[j];
                    let shape_j = &ctx.shapes[type_j as usize];
                    let r_touch = r_excl_i + shape_j.circumsphere_diameter() / 2.0;

                    let interact_patch =
                        ctx.patch.is_some() && rsq <= r_cut_patch * r_cut_patch;
                    let interact_hard = rsq <= r_touch * r_touch
                        && ctx.matrix.checks(type_i, type_j)
                        && overlap_test(
                            r_ij,
                            shape_i,
                            orient_i,
                            shape_j,
                            ctx.store.orientation[j],
                        );
                    if (interact_patch || interact_hard)
                        && image_delta_nonzero(hkl, ctx.store.image[i], ctx.store.image[j])
                    {
                        out.interact_new_new.insert((tag_i, ctx.store.tag[j]));
                    }
                });
            }
        }
    }

    out
}
