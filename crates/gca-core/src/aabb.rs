use crate::geom::Vec3;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub lo: Vec3,
    pub hi: Vec3,
}

impl Aabb {
    pub fn new(lo: Vec3, hi: Vec3) -> Self {
        Self { lo, hi }
    }

    pub fn from_sphere(center: Vec3, radius: f64) -> Self {
        let r = Vec3::new(radius, radius, radius);
        Self {
            lo: center.sub(r),
            hi: center.add(r),
        }
    }

    pub fn translate(self, shift: Vec3) -> Self {
        Self {
            lo: self.lo.add(shift),
            hi: self.hi.add(shift),
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.lo.x <= other.hi.x
            && self.hi.x >= other.lo.x
            && self.lo.y <= other.hi.y
            && self.hi.y >= other.lo.y
            && self.lo.z <= other.hi.z
            && self.hi.z >= other.lo.z
    }

    fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            lo: Vec3::new(
                self.lo.x.min(other.lo.x),
                self.lo.y.min(other.lo.y),
                self.lo.z.min(other.lo.z),
            ),
            hi: Vec3::new(
                self.hi.x.max(other.hi.x),
                self.hi.y.max(other.hi.y),
                self.hi.z.max(other.hi.z),
            ),
        }
    }

    fn center(&self) -> Vec3 {
        self.lo.add(self.hi).scale(0.5)
    }
}

const LEAF_CAPACITY: usize = 4;

#[derive(Debug)]
struct Node {
    aabb: Aabb,
    /// Number of nodes in this subtree, including the node itself. A
    /// non-overlapping query jumps the whole subtree in one step.
    subtree: usize,
    /// Particle indices; empty for internal nodes.
    particles: Vec<u32>,
}

/// Flat bounding-volume tree over particle AABBs.
///
/// Nodes are stored in preorder and traversed with a stackless loop, the
/// subtree length acting as a skip pointer.
#[derive(Debug, Default)]
pub struct AabbTree {
    nodes: Vec<Node>,
}

impl AabbTree {
    pub fn build(aabbs: &[Aabb]) -> Self {
        let mut tree = AabbTree { nodes: Vec::new() };
        if aabbs.is_empty() {
            return tree;
        }
        let mut indices: Vec<u32> = (0..aabbs.len() as u32).collect();
        tree.build_node(aabbs, &mut indices);
        tree
    }

    fn build_node(&mut self, aabbs: &[Aabb], indices: &mut [u32]) -> usize {
        let mut bounds = aabbs[indices[0] as usize];
        for &i in indices.iter().skip(1) {
            bounds = bounds.merge(&aabbs[i as usize]);
        }

        let node_idx = self.nodes.len();
        if indices.len() <= LEAF_CAPACITY {
            self.nodes.push(Node {
                aabb: bounds,
                subtree: 1,
                particles: indices.to_vec(),
            });
            return 1;
        }

        // split on the longest extent of the centroid bounds
        let ext = bounds.hi.sub(bounds.lo);
        let axis = if ext.x >= ext.y && ext.x >= ext.z {
            0
        } else if ext.y >= ext.z {
            1
        } else {
            2
        };
        let mid = indices.len() / 2;
        indices.select_nth_unstable_by(mid, |&a, &b| {
            let ca = aabbs[a as usize].center().to_array()[axis];
            let cb = aabbs[b as usize].center().to_array()[axis];
            ca.partial_cmp(&cb).expect("non-finite AABB center")
        });

        self.nodes.push(Node {
            aabb: bounds,
            subtree: 0,
            particles: Vec::new(),
        });
        let (left, right) = indices.split_at_mut(mid);
        let n_left = self.build_node(aabbs, left);
        let n_right = self.build_node(aabbs, right);
        let subtree = 1 + n_left + n_right;
        self.nodes[node_idx].subtree = subtree;
        subtree
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visit every particle index stored in a leaf whose AABB overlaps
    /// `query`.
    pub fn for_each_overlapping<F>(&self, query: &Aabb, mut f: F)
    where
        F: FnMut(usize),
    {
        let mut i = 0;
        while i < self.nodes.len() {
            let node = &self.nodes[i];
            if query.overlaps(&node.aabb) {
                for &p in &node.particles {
                    f(p as usize);
                }
                i += 1;
            } else {
                i += node.subtree;
            }
        }
    }
}
