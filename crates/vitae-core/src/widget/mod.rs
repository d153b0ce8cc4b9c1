//! Editor-only decorations for scene objects.
//!
//! Decorations describe how the rendering layer lets the user grab an object:
//! whether it is selectable, what its handles look like. They are kept beside
//! the objects, never inside them, so snapshots stay decoration-free. Objects
//! remain pure data.

mod decoration;
mod manager;

pub use decoration::{Decoration, HandleShape};
pub use manager::DecorationManager;
