mod identifier;
mod registry;
pub mod resources;
#[cfg(target_os = "macos")]
mod texture;

pub use identifier::Identifier;
pub use registry::{TextureError, TextureHandle, TextureLoader, TextureRegistry};
#[cfg(target_os = "macos")]
pub use texture::{MetalTextureLoader, Texture, TextureFormat};
