#![forbid(unsafe_code)]

//! Collective cluster moves for hard-particle and patchy-interaction
//! Monte Carlo: the geometric cluster algorithm of Liu and Luijten
//! (pivot reflections) extended with line reflections for anisotropic
//! particles per Sinkovits, Barr and Luijten.

pub mod comm;
pub mod config;
pub mod counters;
pub mod detect;
pub mod error;
pub mod events;
pub mod graph;
pub mod move_gen;
pub mod patch;
pub mod update;

pub use comm::{Collective, SingleWorker, SplitWorkers};
pub use config::SimulationConfig;
pub use counters::{CounterMode, MoveCounters};
pub use detect::LocalInteractions;
pub use error::{ClusterError, ClusterResult};
pub use events::StreamEmitter;
pub use move_gen::MoveParams;
pub use patch::{PatchEnergy, SquareWell};
pub use update::{ClusterUpdater, UpdateReport};
