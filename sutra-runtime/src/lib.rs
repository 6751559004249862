//! # Sutra-Runtime: Module Host for the Megha SLAM Stack
//!
//! Pluggable executable units ("modules") wired together by a nameserver.
//! A module exposes three hooks (`initialize_common`, `initialize`, and
//! `spin_once`) and can locate collaborators by interface tag as soon as
//! initialization starts, because the host registers every module before
//! initializing any of them.
//!
//! ```text
//!   Runtime::add_module(...)        registration (nameserver learns names)
//!            │
//!            ▼
//!   Runtime::initialize_all(...)    modules may find_by_interface() here
//!            │
//!            ▼
//!   Runtime::spin_once() × N        each module's scheduling tick
//! ```
//!
//! Shipped modules:
//!
//! - [`LucoReplayer`](dataset::LucoReplayer): replays a Paris-Luco-style
//!   lidar sequence in (scaled) real time, publishing observations over a
//!   crossbeam channel.
//! - [`VoxelMappingModule`](mapping::VoxelMappingModule): consumes that
//!   stream into a [`megha_map::DualVoxelMap`].

pub mod dataset;
pub mod error;
pub mod mapping;
pub mod module;
pub mod registry;
pub mod runtime;

pub use dataset::{LucoReplayer, LucoReplayerConfig};
pub use error::{Result, RuntimeError};
pub use mapping::VoxelMappingModule;
pub use module::{ModuleContext, ModuleHandle, RuntimeModule};
pub use registry::ModuleRegistry;
pub use runtime::Runtime;
