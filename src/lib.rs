// Council - multi-persona conversation orchestrator
// Library exports

pub mod cli;
pub mod config;
pub mod conversation;
pub mod logging;
pub mod providers;
pub mod search;
