//! Vector document model.
//!
//! The renderer only ever reads a [`Document`]; all mutation happens in the
//! application layer between frames.
//!
//! Storage:
//! - entities live in one contiguous arena owned by the document
//! - layers hold [`EntityId`] indices into that arena
//! - removing an entity invalidates its slot; stale ids resolve to `None`

mod entity;
mod store;

pub use entity::{Circle, Entity, LineSegment};
pub use store::{Document, EntityId, Layer, LayerId};
