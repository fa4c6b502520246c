mod benchmark;
mod config;
mod geometry;
mod mirror;
mod path;
mod run;
mod simulator;
mod sweep;
mod utils;

pub use benchmark::*;
pub use config::*;
pub use geometry::*;
pub use mirror::*;
pub use path::*;
pub use run::*;
pub use simulator::*;
pub use sweep::*;
pub use utils::*;
