//! A minimal macOS renderer that draws a single rotating cube with Metal.
//!
//! The crate is split into a small set of modules: [`math`] holds the 4x4
//! transform utilities the render loop composes each frame, [`core`] holds the
//! texture registry and its identifier key type, [`scene`] supplies the fixed
//! cube geometry, and [`renderer`] owns the Metal pipeline and issues one
//! indexed draw per display refresh. Everything GPU-facing only exists on
//! macOS; the remaining modules are platform-neutral.
//!
//! # Example
//! ```no_run
//! # #[cfg(target_os = "macos")]
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use metal_cube::app::App;
//!
//! App::run()
//! # }
//! ```

#[cfg(target_os = "macos")]
pub mod app;
pub mod core;
pub mod math;
#[cfg(target_os = "macos")]
pub mod renderer;
pub mod scene;
