//! Opaque handles into a [`Scene`](crate::Scene) arena.
//!
//! A handle is a dense index into one of the scene's object arenas. Handles are
//! only meaningful for the scene that issued them; once that scene is dropped
//! every handle it produced is dead.

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Object kind, used in diagnostics.
            pub const KIND: &'static str = $kind;

            /// Arena slot this handle points at.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

arena_id!(
    /// Handle to a [`Node`](crate::Node).
    NodeId,
    "node"
);
arena_id!(
    /// Handle to a [`Mesh`](crate::Mesh).
    MeshId,
    "mesh"
);
arena_id!(
    /// Handle to a [`Material`](crate::Material).
    MaterialId,
    "material"
);
arena_id!(
    /// Handle to a [`Texture`](crate::Texture).
    TextureId,
    "texture"
);
