use fxhash::FxHashMap;

use crate::boxdim::SimBox;
use crate::geom::{Quat, Vec3};

/// A consistent global particle configuration, ordered by tag.
///
/// Arrays are parallel; index `i` holds the particle whose tag was the
/// `i`-th smallest when the snapshot was taken.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub position: Vec<Vec3>,
    pub orientation: Vec<Quat>,
    pub type_id: Vec<u32>,
    pub diameter: Vec<f64>,
    pub charge: Vec<f64>,
    pub image: Vec<[i32; 3]>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }
}

/// Map from pre-snapshot tag to snapshot index (the particle's new tag).
///
/// A lookup miss is a programming error: every live tag must appear in the
/// table between snapshot-take and reload.
#[derive(Clone, Debug, Default)]
pub struct TagRemap {
    map: FxHashMap<u32, u32>,
}

impl TagRemap {
    pub fn get(&self, old_tag: u32) -> u32 {
        match self.map.get(&old_tag) {
            Some(&new_tag) => new_tag,
            None => panic!("tag {old_tag} missing from remap table"),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Authoritative particle configuration, struct-of-arrays.
#[derive(Clone, Debug)]
pub struct ParticleStore {
    pub sim_box: SimBox,
    pub position: Vec<Vec3>,
    pub orientation: Vec<Quat>,
    pub type_id: Vec<u32>,
    pub diameter: Vec<f64>,
    pub charge: Vec<f64>,
    pub tag: Vec<u32>,
    pub image: Vec<[i32; 3]>,
    next_tag: u32,
}

impl ParticleStore {
    pub fn new(sim_box: SimBox) -> Self {
        Self {
            sim_box,
            position: Vec::new(),
            orientation: Vec::new(),
            type_id: Vec::new(),
            diameter: Vec::new(),
            charge: Vec::new(),
            tag: Vec::new(),
            image: Vec::new(),
            next_tag: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    pub fn add_particle(&mut self, pos: Vec3, type_id: u32, diameter: f64, charge: f64) -> u32 {
        let tag = self.next_tag;
        self.next_tag += 1;
        self.position.push(pos);
        self.orientation.push(Quat::identity());
        self.type_id.push(type_id);
        self.diameter.push(diameter);
        self.charge.push(charge);
        self.tag.push(tag);
        self.image.push([0, 0, 0]);
        tag
    }

    fn assert_consistent(&self) {
        let n = self.position.len();
        if self.orientation.len() != n
            || self.type_id.len() != n
            || self.diameter.len() != n
            || self.charge.len() != n
            || self.tag.len() != n
            || self.image.len() != n
        {
            panic!("particle store arrays have mismatched lengths");
        }
    }

    /// Take a global snapshot ordered by tag, together with the table
    /// mapping each current tag to its snapshot index.
    pub fn take_snapshot(&self) -> (Snapshot, TagRemap) {
        self.assert_consistent();
        let n = self.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| self.tag[i]);

        let mut snap = Snapshot {
            position: Vec::with_capacity(n),
            orientation: Vec::with_capacity(n),
            type_id: Vec::with_capacity(n),
            diameter: Vec::with_capacity(n),
            charge: Vec::with_capacity(n),
            image: Vec::with_capacity(n),
        };
        let mut map = FxHashMap::default();
        for (snap_idx, &i) in order.iter().enumerate() {
            snap.position.push(self.position[i]);
            snap.orientation.push(self.orientation[i]);
            snap.type_id.push(self.type_id[i]);
            snap.diameter.push(self.diameter[i]);
            snap.charge.push(self.charge[i]);
            snap.image.push(self.image[i]);
            map.insert(self.tag[i], snap_idx as u32);
        }
        (snap, TagRemap { map })
    }

    /// Replace the configuration from a snapshot. Tags become contiguous
    /// `0..n` in snapshot order.
    pub fn reload(&mut self, snap: &Snapshot) {
        let n = snap.len();
        if snap.orientation.len() != n
            || snap.type_id.len() != n
            || snap.diameter.len() != n
            || snap.charge.len() != n
            || snap.image.len() != n
        {
            panic!("snapshot arrays have mismatched lengths");
        }
        self.position = snap.position.clone();
        self.orientation = snap.orientation.clone();
        self.type_id = snap.type_id.clone();
        self.diameter = snap.diameter.clone();
        self.charge = snap.charge.clone();
        self.image = snap.image.clone();
        self.tag = (0..n as u32).collect();
        self.next_tag = n as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(n: usize) -> ParticleStore {
        let mut store = ParticleStore::new(SimBox::cube(10.0).unwrap());
        for i in 0..n {
            store.add_particle(Vec3::new(i as f64, 0.0, 0.0), 0, 1.0, 0.0);
        }
        store
    }

    #[test]
    fn snapshot_orders_by_tag() {
        let mut store = store_with(3);
        // shuffle storage order without touching tags
        store.position.swap(0, 2);
        store.tag.swap(0, 2);
        let (snap, remap) = store.take_snapshot();
        assert_eq!(snap.len(), 3);
        for tag in 0..3u32 {
            let idx = remap.get(tag) as usize;
            assert!((snap.position[idx].x - tag as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn reload_retags_contiguously() {
        let store0 = store_with(4);
        let (snap, _) = store0.take_snapshot();
        let mut store = store_with(0);
        store.reload(&snap);
        assert_eq!(store.tag, vec![0, 1, 2, 3]);
        let next = store.add_particle(Vec3::default(), 0, 1.0, 0.0);
        assert_eq!(next, 4);
    }

    #[test]
    #[should_panic(expected = "missing from remap table")]
    fn remap_miss_is_fatal() {
        let store = store_with(2);
        let (_, remap) = store.take_snapshot();
        remap.get(99);
    }

    #[test]
    fn round_trip_preserves_configuration() {
        let store = store_with(5);
        let (snap, _) = store.take_snapshot();
        let mut other = ParticleStore::new(store.sim_box);
        other.reload(&snap);
        assert_eq!(other.position, store.position);
        assert_eq!(other.image, store.image);
    }
}
