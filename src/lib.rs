pub mod accumulator;
pub mod aligner;
pub mod config;
pub mod error;
pub mod feature_store;
pub mod game_store;
pub mod goalie;
pub mod season;
pub mod shift_ledger;
pub mod synthetic;
pub mod tables;
pub mod timeline;
