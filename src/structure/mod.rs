//! Spine structure
//!
//! Track identities, the spine-path tracker that maintains column-to-track
//! bindings through `*^ *v *x *+ *-`, and null-token resolution over the
//! resulting path history.
//!
//! ## Modules
//!
//! - `tracks`: the track arena and lineage rules for split/merge
//! - `spine_path`: per-line bindings and manipulator handling
//! - `null_resolve`: backward/forward walks along a lineage

pub mod null_resolve;
pub mod spine_path;
pub mod tracks;

pub use null_resolve::{resolve_backward, resolve_forward};
pub use spine_path::{ColumnBinding, LineBinding, PathHistory, SpinePathTracker};
pub use tracks::{Track, TrackTable};
