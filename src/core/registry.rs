//! Name-to-texture registry.
//!
//! The registry maps an [`Identifier`] to a loaded texture and hands out
//! opaque [`TextureHandle`]s. Lookups never fail: an unregistered name
//! resolves to the designated "missing" placeholder so a bad asset shows up
//! as a visibly wrong texture instead of killing the frame loop.
//!
//! All registration happens during startup, before the first frame; after
//! that the registry is only read.

use crate::core::{resources, Identifier};
use log::{error, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to read {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("texture data size mismatch: expected {expected} bytes, got {actual}")]
    DataSize { expected: usize, actual: usize },

    #[error("GPU texture allocation failed")]
    Allocation,
}

/// Opaque reference to a registered texture.
///
/// Handles stay valid for the life of the registry and are cheap to copy
/// and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

impl TextureHandle {
    /// The fallback placeholder, always present once the registry is
    /// initialized.
    pub const MISSING: Self = Self(0);
}

/// Platform facility that turns files into GPU textures.
///
/// The registry is written against this seam so the Metal-backed loader and
/// the test stubs plug into the same code path.
pub trait TextureLoader {
    type Texture;

    /// Loads a texture from `path`.
    fn load(&self, path: &Path) -> Result<Self::Texture, TextureError>;

    /// Builds the "missing texture" placeholder bound to
    /// [`TextureHandle::MISSING`].
    fn placeholder(&self) -> Result<Self::Texture, TextureError>;
}

struct Bound<L> {
    loader: L,
    asset_root: PathBuf,
}

/// Registry of named textures with a fallback for unresolved lookups.
pub struct TextureRegistry<L: TextureLoader> {
    bound: Option<Bound<L>>,
    // Slot 0 is the placeholder; handles index into this.
    slots: Vec<L::Texture>,
    bindings: HashMap<Identifier, TextureHandle>,
}

impl<L: TextureLoader> TextureRegistry<L> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bound: None,
            slots: Vec::new(),
            bindings: HashMap::new(),
        }
    }

    /// Binds the registry to its loader and asset root, and creates the
    /// fallback placeholder.
    ///
    /// Must be called once before any [`register`](Self::register) call; a
    /// repeated call logs a warning and is ignored.
    ///
    /// # Errors
    /// Fails if the placeholder itself cannot be created. That is a
    /// setup-time failure the caller decides about; the registry stays
    /// uninitialized.
    pub fn initialize(
        &mut self,
        loader: L,
        asset_root: impl Into<PathBuf>,
    ) -> Result<(), TextureError> {
        if self.bound.is_some() {
            warn!("texture registry already initialized, ignoring");
            return Ok(());
        }

        let placeholder = loader.placeholder()?;
        debug_assert!(self.slots.is_empty());
        self.slots.push(placeholder);
        self.bound = Some(Bound {
            loader,
            asset_root: asset_root.into(),
        });
        Ok(())
    }

    /// Loads the texture named by `source` and binds it under `id`.
    ///
    /// Returns the new handle, or `None` when the registry is not yet
    /// initialized or the load fails. Failures are logged and leave `id`
    /// unbound, so later lookups fall back to the placeholder; nothing is
    /// retried.
    pub fn register(&mut self, id: Identifier, source: &Identifier) -> Option<TextureHandle> {
        let Some(bound) = &self.bound else {
            error!("failed to load texture {id} (registry not initialized)");
            return None;
        };

        let path = resources::texture_path(&bound.asset_root, source);
        match bound.loader.load(&path) {
            Ok(texture) => {
                let handle = TextureHandle(self.slots.len() as u32);
                self.slots.push(texture);
                self.bindings.insert(id, handle);
                Some(handle)
            }
            Err(e) => {
                error!("failed to load texture {id} ({e})");
                None
            }
        }
    }

    /// Looks up the handle bound to `id`, falling back to
    /// [`TextureHandle::MISSING`]. Never fails.
    #[must_use]
    pub fn get(&self, id: &Identifier) -> TextureHandle {
        self.bindings
            .get(id)
            .copied()
            .unwrap_or(TextureHandle::MISSING)
    }

    /// Dereferences a handle to its loaded texture.
    ///
    /// `None` only before [`initialize`](Self::initialize) has run (there
    /// is no placeholder to fall back to yet).
    #[must_use]
    pub fn texture(&self, handle: TextureHandle) -> Option<&L::Texture> {
        self.slots
            .get(handle.0 as usize)
            .or_else(|| self.slots.first())
    }
}

impl<L: TextureLoader> Default for TextureRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Loader that records requested paths and yields string "textures".
    struct StubLoader {
        fail: bool,
    }

    impl TextureLoader for StubLoader {
        type Texture = String;

        fn load(&self, path: &Path) -> Result<String, TextureError> {
            if self.fail {
                Err(TextureError::Load {
                    path: path.to_path_buf(),
                    reason: "no such file".into(),
                })
            } else {
                Ok(format!("loaded:{}", path.display()))
            }
        }

        fn placeholder(&self) -> Result<String, TextureError> {
            Ok("placeholder".into())
        }
    }

    fn initialized(fail: bool) -> TextureRegistry<StubLoader> {
        let mut registry = TextureRegistry::new();
        registry
            .initialize(StubLoader { fail }, "assets")
            .unwrap();
        registry
    }

    #[test]
    fn unregistered_lookup_returns_the_fallback() {
        let registry = initialized(false);
        let handle = registry.get(&Identifier::of("dirt"));
        assert_eq!(handle, TextureHandle::MISSING);
        assert_eq!(registry.texture(handle), Some(&"placeholder".to_string()));
    }

    #[test]
    fn registered_texture_is_distinct_from_the_fallback() {
        let mut registry = initialized(false);
        let id = Identifier::of("dirt");
        let handle = registry.register(id.clone(), &id).unwrap();

        assert_ne!(handle, TextureHandle::MISSING);
        assert_eq!(registry.get(&id), handle);
        assert_eq!(
            registry.texture(handle),
            Some(&"loaded:assets/cube/textures/dirt.png".to_string())
        );
    }

    #[test]
    fn register_before_initialize_is_a_no_op() {
        let mut registry: TextureRegistry<StubLoader> = TextureRegistry::new();
        let id = Identifier::of("dirt");
        assert_eq!(registry.register(id.clone(), &id), None);

        registry
            .initialize(StubLoader { fail: false }, "assets")
            .unwrap();
        assert_eq!(registry.get(&id), TextureHandle::MISSING);
    }

    #[test]
    fn failed_load_leaves_the_id_unbound() {
        let mut registry = initialized(true);
        let id = Identifier::of("dirt");
        assert_eq!(registry.register(id.clone(), &id), None);
        assert_eq!(registry.get(&id), TextureHandle::MISSING);
    }

    #[test]
    fn repeated_initialize_is_ignored() {
        let mut registry = initialized(false);
        let id = Identifier::of("dirt");
        let handle = registry.register(id.clone(), &id).unwrap();

        registry
            .initialize(StubLoader { fail: false }, "elsewhere")
            .unwrap();
        assert_eq!(registry.get(&id), handle);
    }
}
