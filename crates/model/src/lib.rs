//! scrubkit model
//!
//! Defines the pure data contracts of the scrubbing engine:
//! - **Metadata:** the sprite-sheet description published next to a recording
//! - **Resolver:** time ↔ frame-index mapping and sprite/thumbnail addressing
//! - **Regions:** speech segments merged into skip-silence playable windows
//! - **Time codec:** compact `1h2m30s` tokens used in shareable links
//! - **Activities:** timestamped annotations shown as a navigable list
//! - **Playback / share / tutorial:** speed mapping, share ranges, onboarding record
//!
//! Nothing in this crate performs I/O; every input is data and every output
//! is data.

pub mod activity;
pub mod metadata;
pub mod playback;
pub mod regions;
pub mod resolver;
pub mod share;
pub mod time_codec;
pub mod tutorial;

pub use activity::*;
pub use metadata::*;
pub use playback::*;
pub use regions::*;
pub use resolver::*;
pub use share::*;
pub use time_codec::*;
pub use tutorial::*;
