//! One full cluster update: propose, transform, detect, aggregate, link,
//! decide, commit.
//!
//! Only the coordinator assembles the graph and decides clusters; workers
//! contribute their local interaction sets through the collective. Every
//! cluster is committed or reverted as a unit.

use std::collections::BTreeMap;

use fxhash::FxHashSet;

use gca_core::{Aabb, AabbTree, InteractionMatrix, ParticleStore, ShapeParams, StepRng};

use crate::comm::Collective;
use crate::counters::{CounterMode, MoveCounters};
use crate::detect::{find_interactions, ConfigBackup, DetectContext, LocalInteractions};
use crate::error::{ClusterError, ClusterResult};
use crate::graph::Graph;
use crate::move_gen;
use crate::patch::PatchEnergy;

/// Outcome summary of one `update` call.
#[derive(Clone, Copy, Debug)]
pub struct UpdateReport {
    pub timestep: u64,
    pub line: bool,
    pub n_clusters: usize,
    pub accepted: u64,
    pub rejected: u64,
}

/// Probabilistic GCA bond: accepted with `p = 1 - exp(-delta_u)` against
/// one uniform draw. `delta_u <= 0` never bonds; `delta_u -> inf` always
/// bonds.
pub fn bond_accepted(delta_u: f32, uniform: f64) -> bool {
    let p = 1.0 - f64::from(-delta_u).exp();
    uniform < p
}

pub struct ClusterUpdater<C: Collective> {
    seed: u64,
    move_ratio: f64,
    ndim: u32,
    shapes: Vec<ShapeParams>,
    matrix: InteractionMatrix,
    patch: Option<Box<dyn PatchEnergy>>,
    collective: C,
    count_total: MoveCounters,
    count_run_start: MoveCounters,
    count_step_start: MoveCounters,
}

impl<C: Collective> ClusterUpdater<C> {
    pub fn new(
        seed: u64,
        shapes: Vec<ShapeParams>,
        ndim: u32,
        collective: C,
    ) -> ClusterResult<Self> {
        if shapes.is_empty() {
            return Err(ClusterError::Invalid(
                "at least one shape type is required".into(),
            ));
        }
        if ndim != 2 && ndim != 3 {
            return Err(ClusterError::Invalid(format!(
                "dimensionality must be 2 or 3, got {ndim}"
            )));
        }
        let n_types = shapes.len();
        Ok(Self {
            seed,
            move_ratio: 0.5,
            ndim,
            shapes,
            matrix: InteractionMatrix::all(n_types),
            patch: None,
            collective,
            count_total: MoveCounters::default(),
            count_run_start: MoveCounters::default(),
            count_step_start: MoveCounters::default(),
        })
    }

    pub fn with_patch(mut self, patch: Box<dyn PatchEnergy>) -> Self {
        self.patch = Some(patch);
        self
    }

    /// Probability of choosing a pivot move over a line reflection.
    pub fn set_move_ratio(&mut self, move_ratio: f64) -> ClusterResult<()> {
        if !(0.0..=1.0).contains(&move_ratio) {
            return Err(ClusterError::Invalid(format!(
                "move ratio must lie in [0, 1], got {move_ratio}"
            )));
        }
        self.move_ratio = move_ratio;
        Ok(())
    }

    pub fn interaction_matrix_mut(&mut self) -> &mut InteractionMatrix {
        &mut self.matrix
    }

    /// Checkpoint the run-start counters for relative reporting.
    pub fn reset_stats(&mut self) {
        self.count_run_start = self.count_total;
    }

    pub fn counters(&self, mode: CounterMode) -> MoveCounters {
        match mode {
            CounterMode::Absolute => self.count_total,
            CounterMode::SinceRunStart => self.count_total - self.count_run_start,
            CounterMode::SinceStepStart => self.count_total - self.count_step_start,
        }
    }

    pub fn provided_quantities() -> [&'static str; 3] {
        [
            "cluster_moves",
            "cluster_pivot_acceptance",
            "cluster_reflection_acceptance",
        ]
    }

    /// Named log quantity, or None for an unknown name.
    pub fn log_value(&self, quantity: &str, n_global: usize) -> Option<f64> {
        match quantity {
            "cluster_moves" => {
                let total = self.counters(CounterMode::Absolute);
                Some(total.n_moves() as f64 / n_global.max(1) as f64)
            }
            "cluster_pivot_acceptance" => {
                Some(self.counters(CounterMode::SinceStepStart).translate_acceptance())
            }
            "cluster_reflection_acceptance" => {
                Some(self.counters(CounterMode::SinceStepStart).rotate_acceptance())
            }
            _ => None,
        }
    }

    fn has_orientation(&self) -> bool {
        self.shapes.iter().any(|s| s.has_orientation())
    }

    fn nominal_width(&self) -> f64 {
        let core = self
            .shapes
            .iter()
            .map(|s| s.circumsphere_diameter())
            .fold(0.0, f64::max);
        match &self.patch {
            Some(patch) => core.max(patch.r_cut()),
            None => core,
        }
    }

    fn min_core_diameter(&self) -> f64 {
        self.shapes
            .iter()
            .map(|s| s.core_diameter())
            .fold(f64::INFINITY, f64::min)
    }

    /// Perform one cluster move. No particles is a no-op.
    pub fn update(
        &mut self,
        store: &mut ParticleStore,
        timestep: u64,
    ) -> ClusterResult<UpdateReport> {
        self.count_step_start = self.count_total;

        let n_global = store.len();
        if n_global == 0 {
            return Ok(UpdateReport {
                timestep,
                line: false,
                n_clusters: 0,
                accepted: 0,
                rejected: 0,
            });
        }

        let sim_box = store.sim_box;
        let mut rng = StepRng::new(self.seed, timestep);

        let mv = move_gen::propose(
            &mut rng,
            self.move_ratio,
            &sim_box,
            self.ndim,
            self.has_orientation(),
        );

        // old-configuration backup and locality, before any mutation
        let backup = ConfigBackup::of(store);
        let tree_old = AabbTree::build(&backup.shape_aabbs(&self.shapes));

        // global snapshot; the remap table reaches every worker
        let (mut snap, remap) = store.take_snapshot();
        let remap = self.collective.broadcast_tag_map(&remap);
        let snap_old = snap.clone();

        let nominal_width = self.nominal_width();
        let npd = sim_box.nearest_plane_distance();
        let mut range_frac = [
            nominal_width / npd.x,
            nominal_width / npd.y,
            nominal_width / npd.z,
        ];
        if self.ndim == 2 {
            range_frac[2] = 0.0;
        }

        let mut ptl_reject: FxHashSet<u32> = FxHashSet::default();
        move_gen::transform(
            &mut snap,
            &mv,
            &self.shapes,
            &sim_box,
            range_frac,
            &mut ptl_reject,
        );

        // the transformed snapshot becomes the current configuration
        store.reload(&snap);

        let tree_new = if mv.line {
            let aabbs: Vec<Aabb> = (0..store.len())
                .map(|i| {
                    self.shapes[store.type_id[i] as usize]
                        .aabb(store.position[i], store.orientation[i])
                })
                .collect();
            Some(AabbTree::build(&aabbs))
        } else {
            None
        };

        let images = sim_box.image_list(nominal_width);
        let ctx = DetectContext {
            store: &*store,
            backup: &backup,
            tree_old: &tree_old,
            tree_new: tree_new.as_ref(),
            images: &images,
            shapes: &self.shapes,
            matrix: &self.matrix,
            patch: self.patch.as_deref(),
            remap: &remap,
            line: mv.line,
            min_core_diameter: self.min_core_diameter(),
        };

        // every worker detects over its own range, then the coordinator
        // receives all sets in workid order
        let locals: Vec<LocalInteractions> = self
            .collective
            .local_ranges(n_global)
            .into_iter()
            .map(|range| find_interactions(&ctx, range))
            .collect();
        let locals = self.collective.gather(locals);

        // coordinator: merge rejections and assemble the graph
        let mut merged_new_new: FxHashSet<(u32, u32)> = FxHashSet::default();
        for local in &locals {
            merged_new_new.extend(local.interact_new_new.iter().copied());
            ptl_reject.extend(local.local_reject.iter().copied());
        }

        let mut graph = Graph::new(n_global);
        for local in &locals {
            for &(i, j) in &local.overlap {
                graph.add_edge(i, j);
            }
        }
        for local in &locals {
            for set in [&local.interact_old_old, &local.interact_new_old] {
                for &(i, j) in set.iter() {
                    if merged_new_new.contains(&(i, j)) || merged_new_new.contains(&(j, i)) {
                        ptl_reject.insert(i);
                        ptl_reject.insert(j);
                    }
                    graph.add_edge(i, j);
                }
            }
        }

        if self.patch.is_some() {
            // ordered accumulation: the bond draws must visit pairs in a
            // fixed order independent of worker count
            let mut delta_u: BTreeMap<(u32, u32), f32> = BTreeMap::new();
            for local in &locals {
                for (&pair, &u) in &local.energy_old_old {
                    *delta_u.entry(pair).or_insert(0.0) -= u;
                }
            }
            for local in &locals {
                for (&pair, &u) in &local.energy_new_old {
                    *delta_u.entry(pair).or_insert(0.0) += u;
                }
            }
            for (&(i, j), &du) in &delta_u {
                if bond_accepted(du, rng.uniform()) {
                    graph.add_edge(i, j);
                    if merged_new_new.contains(&(i, j)) || merged_new_new.contains(&(j, i)) {
                        ptl_reject.insert(i);
                        ptl_reject.insert(j);
                    }
                }
            }
        }

        // decide each cluster atomically
        let clusters = graph.connected_components();
        let mut accepted = 0u64;
        let mut rejected = 0u64;
        for cluster in &clusters {
            let reject = cluster.iter().any(|i| ptl_reject.contains(i));
            if reject {
                for &i in cluster {
                    let i = i as usize;
                    snap.position[i] = snap_old.position[i];
                    snap.orientation[i] = snap_old.orientation[i];
                    snap.image[i] = [0, 0, 0];
                }
                if mv.line {
                    self.count_total.rotate_reject += 1;
                } else {
                    self.count_total.translate_reject += 1;
                }
                rejected += 1;
            } else {
                if mv.line {
                    self.count_total.rotate_accept += 1;
                } else {
                    self.count_total.translate_accept += 1;
                }
                accepted += 1;
            }
        }

        // wrap and fold the move-relative images onto the pre-move ones
        for i in 0..snap.len() {
            sim_box.wrap(&mut snap.position[i], &mut snap.image[i]);
            for a in 0..3 {
                snap.image[i][a] += snap_old.image[i][a];
            }
        }

        // final configuration; with one store the redistribution to
        // workers is the reload itself
        store.reload(&snap);

        Ok(UpdateReport {
            timestep,
            line: mv.line,
            n_clusters: clusters.len(),
            accepted,
            rejected,
        })
    }
}
