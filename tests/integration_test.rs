use approx::assert_abs_diff_eq;
use metal_cube::core::{Identifier, TextureError, TextureHandle, TextureLoader, TextureRegistry};
use metal_cube::math::{wrap_angle, Mat4, Vec3, Vec4};
use metal_cube::scene::{Mesh, TexturedVertex};
use std::f32::consts::FRAC_PI_4;
use std::path::Path;

const ROTATION_STEP: f32 = 0.02;
const ROTATION_AXIS: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// The per-frame matrix composition the renderer performs.
fn mvp_for(angle: f32, aspect: f32) -> Mat4 {
    let model = Mat4::rotation(angle, ROTATION_AXIS);
    let view = Mat4::translation(0.0, 0.0, -5.0);
    let projection = Mat4::perspective(aspect, FRAC_PI_4, 0.1, 100.0).unwrap();
    projection.multiply(&view.multiply(&model))
}

#[test]
fn four_frame_ticks_accumulate_rotation_and_change_the_mvp() {
    let mut angle = 0.0f32;
    let mut previous = mvp_for(angle, 16.0 / 9.0);

    for _ in 0..4 {
        angle = wrap_angle(angle + ROTATION_STEP);
        let mvp = mvp_for(angle, 16.0 / 9.0);
        assert_ne!(mvp, previous, "consecutive frames must differ");
        previous = mvp;
    }

    assert_abs_diff_eq!(angle, 0.08, epsilon = 1e-6);
}

#[test]
fn cube_stays_inside_the_view_frustum() {
    let mvp = mvp_for(ROTATION_STEP, 1.0);

    for vertex in Mesh::<TexturedVertex>::textured_cube().vertices {
        let [x, y, z] = vertex.position;
        let clip = mvp.multiply_vec4(&Vec4::new(x, y, z, 1.0));

        assert!(clip.w > 0.0, "vertex behind the camera");
        for ndc in [clip.x / clip.w, clip.y / clip.w, clip.z / clip.w] {
            assert!((-1.0..=1.0).contains(&ndc), "vertex clipped: {ndc}");
        }
    }
}

struct MemoryLoader;

impl TextureLoader for MemoryLoader {
    type Texture = Vec<u8>;

    fn load(&self, path: &Path) -> Result<Vec<u8>, TextureError> {
        if path.ends_with("cube/textures/dirt.png") {
            // 2x2 solid-color RGBA stand-in.
            Ok(vec![134, 96, 67, 255].repeat(4))
        } else {
            Err(TextureError::Load {
                path: path.to_path_buf(),
                reason: "no such file".into(),
            })
        }
    }

    fn placeholder(&self) -> Result<Vec<u8>, TextureError> {
        Ok(vec![255, 0, 255, 255])
    }
}

#[test]
fn registered_dirt_texture_resolves_and_unknown_names_fall_back() {
    let mut registry = TextureRegistry::new();
    registry.initialize(MemoryLoader, "assets").unwrap();

    let dirt = Identifier::of("dirt");
    let handle = registry.register(dirt.clone(), &dirt).unwrap();

    assert_ne!(handle, TextureHandle::MISSING);
    assert_eq!(registry.get(&dirt), handle);
    assert_eq!(registry.texture(handle).map(Vec::len), Some(16));

    // A registration that fails to load leaves the name on the fallback.
    let grass = Identifier::of("grass");
    assert!(registry.register(grass.clone(), &grass).is_none());
    assert_eq!(registry.get(&grass), TextureHandle::MISSING);
    assert_eq!(
        registry.texture(registry.get(&grass)),
        Some(&vec![255, 0, 255, 255])
    );
}
