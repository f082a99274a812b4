use fxhash::FxHashSet;

use gca_clusters::detect::{find_interactions, ConfigBackup, DetectContext};
use gca_clusters::move_gen::{self, MoveParams};
use gca_clusters::{CounterMode, SingleWorker, SquareWell};
use gca_core::{AabbTree, InteractionMatrix, Quat, ShapeParams, Vec3};

mod common;
use common::{lattice_store, positions_of, sphere_store, sphere_updater};

#[test]
fn pivot_scenario_detects_wrapped_overlap() {
    // Two unit spheres at the origin and (0.5, 0, 0) in a 10-box; a pivot
    // reflection at (5,5,5) maps particle 0 to (10,10,10), which wraps to
    // the origin. The detector must see the overlap of new 0 with old 1
    // through the old configuration's images.
    let mut store = sphere_store(&[[0.0, 0.0, 0.0], [0.5, 0.0, 0.0]], 10.0);
    let sim_box = store.sim_box;
    let shapes = [ShapeParams::Sphere { diameter: 1.0 }];
    let matrix = InteractionMatrix::all(1);

    let backup = ConfigBackup::of(&store);
    let tree_old = AabbTree::build(&backup.shape_aabbs(&shapes));
    let (mut snap, remap) = store.take_snapshot();

    let mv = MoveParams {
        line: false,
        pivot: Vec3::new(5.0, 5.0, 5.0),
        axis: Quat::identity(),
    };
    let mut preflag = FxHashSet::default();
    move_gen::transform(&mut snap, &mv, &shapes, &sim_box, [0.0; 3], &mut preflag);

    assert!(snap.position[0].norm() < 1e-12);
    assert_eq!(snap.image[0], [1, 1, 1]);

    store.reload(&snap);
    let images = sim_box.image_list(1.0);
    let ctx = DetectContext {
        store: &store,
        backup: &backup,
        tree_old: &tree_old,
        tree_new: None,
        images: &images,
        shapes: &shapes,
        matrix: &matrix,
        patch: None,
        remap: &remap,
        line: false,
        min_core_diameter: 1.0,
    };
    let out = find_interactions(&ctx, 0..store.len());

    assert!(out.overlap.contains(&(0, 1)));
    assert!(out.local_reject.is_empty());
}

#[test]
fn boundary_pair_is_rejected_atomically_under_line_move() {
    // Old-configuration square-well interaction crossing exactly one
    // periodic image: under a line move both tags must be rejected and
    // the cluster reverted bit-for-bit.
    let mut store = sphere_store(&[[0.5, 2.0, 2.0], [3.5, 2.0, 2.0]], 4.0);
    let before = positions_of(&store);
    let images_before = store.image.clone();

    let mut updater = sphere_updater(11, SingleWorker).with_patch(Box::new(SquareWell {
        epsilon: 1.0,
        r_cut: 1.5,
    }));
    updater.set_move_ratio(0.0).unwrap(); // line reflections only

    let report = updater.update(&mut store, 3).unwrap();
    assert!(report.line);
    assert_eq!(report.n_clusters, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.accepted, 0);

    assert_eq!(positions_of(&store), before);
    assert_eq!(store.image, images_before);

    let counters = updater.counters(CounterMode::Absolute);
    assert_eq!(counters.rotate_reject, 1);
    assert_eq!(counters.rotate_accept, 0);
}

#[test]
fn boundary_pair_is_accepted_under_pivot_move() {
    // The same configuration under a point reflection: boundary-crossing
    // interactions are symmetric under pivots and must not reject.
    let mut store = sphere_store(&[[0.5, 2.0, 2.0], [3.5, 2.0, 2.0]], 4.0);
    let before = positions_of(&store);

    let mut updater = sphere_updater(11, SingleWorker).with_patch(Box::new(SquareWell {
        epsilon: 1.0,
        r_cut: 1.5,
    }));
    updater.set_move_ratio(1.0).unwrap(); // pivot moves only

    let report = updater.update(&mut store, 3).unwrap();
    assert!(!report.line);
    assert_eq!(report.n_clusters, 1);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected, 0);
    assert_ne!(positions_of(&store), before);

    let counters = updater.counters(CounterMode::Absolute);
    assert_eq!(counters.translate_accept, 1);
}

#[test]
fn null_update_round_trip_restores_configuration() {
    // Snapshot, center-pivot reflection, explicit revert of every
    // cluster, wrap and image fold, reload: the configuration must come
    // back exactly, including nonzero pre-move images.
    let mut store = sphere_store(&[[1.0, 2.0, 3.0], [7.5, 8.25, 0.125]], 10.0);
    store.image[1] = [2, -1, 0];
    let sim_box = store.sim_box;
    let shapes = [ShapeParams::Sphere { diameter: 1.0 }];

    let positions_before = positions_of(&store);
    let images_before = store.image.clone();

    let (mut snap, _remap) = store.take_snapshot();
    let snap_old = snap.clone();

    let mv = MoveParams {
        line: false,
        pivot: Vec3::new(5.0, 5.0, 5.0),
        axis: Quat::identity(),
    };
    let mut preflag = FxHashSet::default();
    move_gen::transform(&mut snap, &mv, &shapes, &sim_box, [0.0; 3], &mut preflag);

    for i in 0..snap.len() {
        snap.position[i] = snap_old.position[i];
        snap.orientation[i] = snap_old.orientation[i];
        snap.image[i] = [0, 0, 0];
    }
    for i in 0..snap.len() {
        sim_box.wrap(&mut snap.position[i], &mut snap.image[i]);
        for a in 0..3 {
            snap.image[i][a] += snap_old.image[i][a];
        }
    }
    store.reload(&snap);

    assert_eq!(positions_of(&store), positions_before);
    assert_eq!(store.image, images_before);
}

#[test]
fn dilute_pivot_accepts_every_singleton() {
    // Far-apart spheres form no links; every particle is its own cluster
    // and every pivot move is accepted.
    let mut store = sphere_store(
        &[
            [2.0, 2.0, 2.0],
            [10.0, 2.0, 2.0],
            [2.0, 10.0, 2.0],
            [2.0, 2.0, 10.0],
        ],
        20.0,
    );
    let mut updater = sphere_updater(5, SingleWorker);
    updater.set_move_ratio(1.0).unwrap();

    let report = updater.update(&mut store, 0).unwrap();
    assert_eq!(report.n_clusters, 4);
    assert_eq!(report.accepted, 4);
    assert_eq!(report.rejected, 0);

    let counters = updater.counters(CounterMode::Absolute);
    assert_eq!(counters.translate_accept, 4);
    assert_eq!(counters.n_moves(), 4);
}

#[test]
fn accepted_and_rejected_counts_partition_clusters() {
    let mut store = lattice_store();
    let mut updater = sphere_updater(123, SingleWorker);
    for ts in 0..5 {
        let report = updater.update(&mut store, ts).unwrap();
        assert_eq!(report.accepted + report.rejected, report.n_clusters as u64);
        assert!(report.n_clusters >= 1);
        assert!(report.n_clusters <= store.len());
    }
}

#[test]
fn counter_windows_track_run_and_step() {
    let mut store = lattice_store();
    let mut updater = sphere_updater(7, SingleWorker);

    updater.update(&mut store, 0).unwrap();
    updater.update(&mut store, 1).unwrap();
    let absolute = updater.counters(CounterMode::Absolute);
    assert!(absolute.n_moves() > 0);

    // the step window covers only the latest update
    let step = updater.counters(CounterMode::SinceStepStart);
    assert!(step.n_moves() <= absolute.n_moves());

    updater.reset_stats();
    assert_eq!(updater.counters(CounterMode::SinceRunStart).n_moves(), 0);
    updater.update(&mut store, 2).unwrap();
    assert!(updater.counters(CounterMode::SinceRunStart).n_moves() > 0);

    for name in ["cluster_moves", "cluster_pivot_acceptance", "cluster_reflection_acceptance"] {
        assert!(updater.log_value(name, store.len()).is_some());
    }
}
