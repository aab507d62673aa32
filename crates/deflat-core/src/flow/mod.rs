//! Control-flow reconstruction.
//!
//! Runs after classification, in order:
//! 1. `flatten_if`: if-chains over a dispatch variable become `switch`es.
//! 2. `track`: per-key histograms of the literal values written to the key.
//! 3. `merge`: each dispatcher is expanded into a table of single-state
//!    cases, merged back into structured code and re-emitted; loops left
//!    with a single case are collapsed.

pub mod flatten_if;
pub mod merge;
pub mod track;

mod collapse;

pub use flatten_if::{IfToSwitchFlattener, flatten_if_chains};
pub use merge::{SwitchMerger, merge_dispatchers};
pub use track::{KeyValueTracker, track_keys};
