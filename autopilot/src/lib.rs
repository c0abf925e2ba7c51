//! Lab tooling around the arena engine: concrete policies, population and
//! leaderboard files, and the runners behind the `arena-autopilot` CLI.

pub mod benchmark;
pub mod config;
pub mod leaderboard_store;
pub mod network;
pub mod policies;
pub mod population;
pub mod runner;
pub mod util;
