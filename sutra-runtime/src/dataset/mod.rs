//! Dataset ingestion modules.

pub mod paris_luco;

pub use paris_luco::{LucoReplayer, LucoReplayerConfig};
