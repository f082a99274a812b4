#![allow(dead_code)]

use gca_clusters::comm::Collective;
use gca_clusters::{ClusterUpdater, SquareWell};
use gca_core::{ParticleStore, ShapeParams, SimBox, Vec3};

pub fn sphere_store(positions: &[[f64; 3]], box_l: f64) -> ParticleStore {
    let mut store = ParticleStore::new(SimBox::cube(box_l).unwrap());
    for &p in positions {
        store.add_particle(Vec3::from_array(p), 0, 1.0, 0.0);
    }
    store
}

/// 27 unit spheres on a 3x3x3 lattice, neighbors within the square-well
/// cutoff so patch bonds and hard overlaps are both exercised.
pub fn lattice_store() -> ParticleStore {
    let spacing = 1.1;
    let mut store = ParticleStore::new(SimBox::cube(3.0 * spacing).unwrap());
    for ix in 0..3 {
        for iy in 0..3 {
            for iz in 0..3 {
                store.add_particle(
                    Vec3::new(
                        (ix as f64 + 0.5) * spacing,
                        (iy as f64 + 0.5) * spacing,
                        (iz as f64 + 0.5) * spacing,
                    ),
                    0,
                    1.0,
                    0.0,
                );
            }
        }
    }
    store
}

pub fn sphere_updater<C: Collective>(seed: u64, collective: C) -> ClusterUpdater<C> {
    ClusterUpdater::new(
        seed,
        vec![ShapeParams::Sphere { diameter: 1.0 }],
        3,
        collective,
    )
    .expect("construct updater")
}

pub fn patchy_updater<C: Collective>(seed: u64, collective: C) -> ClusterUpdater<C> {
    sphere_updater(seed, collective).with_patch(Box::new(SquareWell {
        epsilon: 0.8,
        r_cut: 1.2,
    }))
}

pub fn positions_of(store: &ParticleStore) -> Vec<[f64; 3]> {
    store.position.iter().map(|p| p.to_array()).collect()
}
