//! Asset-path resolution.
//!
//! Resources live under a fixed layout rooted at an asset directory:
//! `<root>/<namespace>/textures/<path>.png`. The registry resolves every
//! texture source through here and never walks the file system itself.

use crate::core::Identifier;
use std::path::{Path, PathBuf};

/// Resolves a texture identifier to its on-disk location.
#[must_use]
pub fn texture_path(asset_root: &Path, id: &Identifier) -> PathBuf {
    asset_root
        .join(id.namespace())
        .join("textures")
        .join(format!("{}.png", id.path()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_path_follows_layout_convention() {
        let id = Identifier::of("dirt");
        assert_eq!(
            texture_path(Path::new("assets"), &id),
            Path::new("assets/cube/textures/dirt.png")
        );

        let namespaced = Identifier::new("pack", "blocks/grass_top");
        assert_eq!(
            texture_path(Path::new("/opt/game/assets"), &namespaced),
            Path::new("/opt/game/assets/pack/textures/blocks/grass_top.png")
        );
    }
}
