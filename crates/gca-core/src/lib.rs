#![forbid(unsafe_code)]

pub mod aabb;
pub mod boxdim;
pub mod error;
pub mod geom;
pub mod particles;
pub mod rng;
pub mod shapes;

pub use aabb::{Aabb, AabbTree};
pub use boxdim::SimBox;
pub use error::{CoreError, CoreResult};
pub use geom::{Quat, Vec3};
pub use particles::{ParticleStore, Snapshot, TagRemap};
pub use rng::StepRng;
pub use shapes::{overlap_test, InteractionMatrix, ShapeParams};
