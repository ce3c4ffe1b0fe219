pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod table;
pub mod util;
