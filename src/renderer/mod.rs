//! Metal frame renderer for the rotating cube.
//!
//! Construction acquires all GPU state up front (pipeline, depth state,
//! vertex/index/uniform buffers, resolved texture); each frame only advances
//! the rotation angle, rebuilds the model-view-projection matrix, and issues
//! a single indexed draw.

use crate::core::{Identifier, MetalTextureLoader, TextureRegistry};
use crate::math::{wrap_angle, Mat4, MathError, Vec3};
use crate::scene::{ColoredVertex, Mesh, RenderMode, TexturedVertex};
use objc2::msg_send;
use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2_core_foundation::CGSize;
use objc2_foundation::NSString;
use objc2_metal::{
    MTLBuffer, MTLClearColor, MTLCommandBuffer, MTLCommandEncoder, MTLCommandQueue,
    MTLCompileOptions, MTLDepthStencilDescriptor, MTLDepthStencilState, MTLDevice, MTLDrawable,
    MTLIndexType, MTLLibrary, MTLLoadAction, MTLPixelFormat, MTLPrimitiveType,
    MTLRenderCommandEncoder, MTLRenderPassDescriptor, MTLRenderPipelineDescriptor,
    MTLRenderPipelineState, MTLResourceOptions, MTLSamplerDescriptor, MTLSamplerMinMagFilter,
    MTLSamplerState, MTLStoreAction, MTLTexture, MTLTextureDescriptor, MTLTextureUsage,
    MTLVertexDescriptor, MTLVertexFormat,
};
use objc2_quartz_core::{CAMetalDrawable, CAMetalLayer};
use thiserror::Error;
use winit::raw_window_handle::RawWindowHandle;

/// Radians added to the cube's rotation on every frame tick.
pub const ROTATION_STEP: f32 = 0.02;

const ROTATION_AXIS: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const CAMERA_DISTANCE: f32 = 5.0;
const FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("failed to create command queue")]
    CommandQueue,

    #[error("unsupported window handle type")]
    UnsupportedWindowHandle,

    #[error("failed to compile shader library: {0}")]
    ShaderCompilation(String),

    #[error("shader function `{0}` not found")]
    MissingShaderFunction(&'static str),

    #[error("failed to create render pipeline state: {0}")]
    PipelineCreation(String),

    #[error("failed to create depth stencil state")]
    DepthStencilState,

    #[error("failed to create {0} buffer")]
    BufferAllocation(&'static str),

    #[error("failed to create depth texture")]
    DepthTexture,

    #[error("failed to create sampler state")]
    SamplerState,

    #[error("failed to create command buffer")]
    CommandBuffer,

    #[error("texture {0} is not resolvable (registry uninitialized)")]
    UnresolvedTexture(Identifier),

    #[error(transparent)]
    Math(#[from] MathError),
}

#[repr(C)]
struct Uniforms {
    mvp_matrix: Mat4,
}

/// Per-mode bindings fixed at construction time.
enum ModeState {
    Textured {
        texture: Retained<ProtocolObject<dyn MTLTexture>>,
        sampler: Retained<ProtocolObject<dyn MTLSamplerState>>,
    },
    VertexColored,
}

pub struct CubeRenderer {
    device: Retained<ProtocolObject<dyn MTLDevice>>,
    command_queue: Retained<ProtocolObject<dyn MTLCommandQueue>>,
    layer: Retained<CAMetalLayer>,
    pipeline_state: Retained<ProtocolObject<dyn MTLRenderPipelineState>>,
    depth_stencil_state: Retained<ProtocolObject<dyn MTLDepthStencilState>>,
    vertex_buffer: Retained<ProtocolObject<dyn MTLBuffer>>,
    index_buffer: Retained<ProtocolObject<dyn MTLBuffer>>,
    uniform_buffer: Retained<ProtocolObject<dyn MTLBuffer>>,
    depth_texture: Option<Retained<ProtocolObject<dyn MTLTexture>>>,
    mode_state: ModeState,
    index_count: usize,
    drawable_size: (u32, u32),
    rotation: f32,
}

impl CubeRenderer {
    /// Builds the full render state for `mode`.
    ///
    /// In textured mode the texture named `texture_id` is resolved through
    /// the registry exactly once, here; an unregistered name silently binds
    /// the registry's fallback texture.
    ///
    /// # Errors
    /// Any failure (queue, shader compilation, pipeline, buffers) is fatal
    /// to renderer setup and surfaced to the caller; there is no degraded
    /// mode without a pipeline.
    pub fn new(
        device: Retained<ProtocolObject<dyn MTLDevice>>,
        window_handle: RawWindowHandle,
        width: u32,
        height: u32,
        mode: RenderMode,
        registry: &TextureRegistry<MetalTextureLoader>,
        texture_id: &Identifier,
    ) -> Result<Self, RendererError> {
        let command_queue = device.newCommandQueue().ok_or(RendererError::CommandQueue)?;

        let layer = Self::create_metal_layer(&device, window_handle)?;

        let (vertex_buffer, index_buffer, index_count) = match mode {
            RenderMode::Textured => {
                let mesh = Mesh::<TexturedVertex>::textured_cube();
                (
                    Self::create_buffer(&device, &mesh.vertices, "vertex")?,
                    Self::create_buffer(&device, &mesh.indices, "index")?,
                    mesh.indices.len(),
                )
            }
            RenderMode::VertexColored => {
                let mesh = Mesh::<ColoredVertex>::colored_cube();
                (
                    Self::create_buffer(&device, &mesh.vertices, "vertex")?,
                    Self::create_buffer(&device, &mesh.indices, "index")?,
                    mesh.indices.len(),
                )
            }
        };
        let uniform_buffer = Self::create_uniform_buffer(&device)?;

        let pipeline_state = Self::create_pipeline_state(&device, mode)?;
        let depth_stencil_state = Self::create_depth_stencil_state(&device)?;
        let depth_texture = Self::create_depth_texture(&device, width, height)?;

        let mode_state = match mode {
            RenderMode::Textured => {
                let handle = registry.get(texture_id);
                let texture = registry
                    .texture(handle)
                    .ok_or_else(|| RendererError::UnresolvedTexture(texture_id.clone()))?;
                ModeState::Textured {
                    texture: texture.texture.clone(),
                    sampler: Self::create_sampler_state(&device)?,
                }
            }
            RenderMode::VertexColored => ModeState::VertexColored,
        };

        Ok(Self {
            device,
            command_queue,
            layer,
            pipeline_state,
            depth_stencil_state,
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            depth_texture: Some(depth_texture),
            mode_state,
            index_count,
            drawable_size: (width, height),
            rotation: 0.0,
        })
    }

    fn create_metal_layer(
        device: &ProtocolObject<dyn MTLDevice>,
        window_handle: RawWindowHandle,
    ) -> Result<Retained<CAMetalLayer>, RendererError> {
        let layer = unsafe { CAMetalLayer::new() };

        unsafe {
            layer.setDevice(Some(device));
            layer.setPixelFormat(MTLPixelFormat::BGRA8Unorm);
            layer.setOpaque(true);
        }

        match window_handle {
            RawWindowHandle::AppKit(handle) => unsafe {
                use objc2::runtime::AnyObject;

                let view = handle.ns_view.as_ptr().cast::<AnyObject>();
                let _: () = msg_send![view, setWantsLayer: true];
                let _: () = msg_send![view, setLayer: &*layer];
            },
            _ => return Err(RendererError::UnsupportedWindowHandle),
        }

        Ok(layer)
    }

    fn create_buffer<T>(
        device: &ProtocolObject<dyn MTLDevice>,
        data: &[T],
        label: &'static str,
    ) -> Result<Retained<ProtocolObject<dyn MTLBuffer>>, RendererError> {
        let bytes = data.as_ptr().cast::<std::ffi::c_void>();
        let length = std::mem::size_of_val(data);
        let bytes =
            std::ptr::NonNull::new(bytes.cast_mut()).ok_or(RendererError::BufferAllocation(label))?;

        let buffer = unsafe {
            device.newBufferWithBytes_length_options(
                bytes,
                length,
                MTLResourceOptions::CPUCacheModeDefaultCache,
            )
        }
        .ok_or(RendererError::BufferAllocation(label))?;

        Ok(buffer)
    }

    fn create_uniform_buffer(
        device: &ProtocolObject<dyn MTLDevice>,
    ) -> Result<Retained<ProtocolObject<dyn MTLBuffer>>, RendererError> {
        device
            .newBufferWithLength_options(
                std::mem::size_of::<Uniforms>(),
                MTLResourceOptions::CPUCacheModeDefaultCache,
            )
            .ok_or(RendererError::BufferAllocation("uniform"))
    }

    fn create_pipeline_state(
        device: &ProtocolObject<dyn MTLDevice>,
        mode: RenderMode,
    ) -> Result<Retained<ProtocolObject<dyn MTLRenderPipelineState>>, RendererError> {
        // One shader source, one entry-point pair per rendering mode.
        let (vertex_fn, fragment_fn, attr_format, attr_offset, stride) = match mode {
            RenderMode::Textured => (
                "textured_vertex",
                "textured_fragment",
                MTLVertexFormat::Float2,
                std::mem::offset_of!(TexturedVertex, tex_coord),
                std::mem::size_of::<TexturedVertex>(),
            ),
            RenderMode::VertexColored => (
                "colored_vertex",
                "colored_fragment",
                MTLVertexFormat::Float4,
                std::mem::offset_of!(ColoredVertex, color),
                std::mem::size_of::<ColoredVertex>(),
            ),
        };

        let shader_source = include_str!("../shaders/cube.metal");
        let source_string = NSString::from_str(shader_source);
        let compile_options = MTLCompileOptions::new();

        let library = device
            .newLibraryWithSource_options_error(&source_string, Some(&compile_options))
            .map_err(|e| RendererError::ShaderCompilation(format!("{e:?}")))?;

        let vertex_function = library
            .newFunctionWithName(&NSString::from_str(vertex_fn))
            .ok_or(RendererError::MissingShaderFunction(vertex_fn))?;

        let fragment_function = library
            .newFunctionWithName(&NSString::from_str(fragment_fn))
            .ok_or(RendererError::MissingShaderFunction(fragment_fn))?;

        // The attribute layout must mirror the Rust vertex structs exactly:
        // position at offset 0, second attribute after three floats, stride
        // covering the whole vertex.
        let vertex_descriptor = unsafe { MTLVertexDescriptor::new() };
        unsafe {
            let position_attr = vertex_descriptor.attributes().objectAtIndexedSubscript(0);
            position_attr.setFormat(MTLVertexFormat::Float3);
            position_attr.setOffset(0);
            position_attr.setBufferIndex(0);

            let second_attr = vertex_descriptor.attributes().objectAtIndexedSubscript(1);
            second_attr.setFormat(attr_format);
            second_attr.setOffset(attr_offset);
            second_attr.setBufferIndex(0);

            let layout = vertex_descriptor.layouts().objectAtIndexedSubscript(0);
            layout.setStride(stride);
        }

        let pipeline_descriptor = MTLRenderPipelineDescriptor::new();
        unsafe {
            pipeline_descriptor.setVertexFunction(Some(&vertex_function));
            pipeline_descriptor.setFragmentFunction(Some(&fragment_function));
            pipeline_descriptor.setVertexDescriptor(Some(&vertex_descriptor));
            pipeline_descriptor.setDepthAttachmentPixelFormat(MTLPixelFormat::Depth32Float);

            let color_attachment = pipeline_descriptor
                .colorAttachments()
                .objectAtIndexedSubscript(0);
            color_attachment.setPixelFormat(MTLPixelFormat::BGRA8Unorm);
        }

        device
            .newRenderPipelineStateWithDescriptor_error(&pipeline_descriptor)
            .map_err(|e| RendererError::PipelineCreation(format!("{e:?}")))
    }

    fn create_depth_stencil_state(
        device: &ProtocolObject<dyn MTLDevice>,
    ) -> Result<Retained<ProtocolObject<dyn MTLDepthStencilState>>, RendererError> {
        let descriptor = unsafe { MTLDepthStencilDescriptor::new() };
        descriptor.setDepthCompareFunction(objc2_metal::MTLCompareFunction::Less);
        descriptor.setDepthWriteEnabled(true);

        device
            .newDepthStencilStateWithDescriptor(&descriptor)
            .ok_or(RendererError::DepthStencilState)
    }

    fn create_depth_texture(
        device: &ProtocolObject<dyn MTLDevice>,
        width: u32,
        height: u32,
    ) -> Result<Retained<ProtocolObject<dyn MTLTexture>>, RendererError> {
        let descriptor = unsafe { MTLTextureDescriptor::new() };
        unsafe {
            descriptor.setPixelFormat(MTLPixelFormat::Depth32Float);
            descriptor.setWidth(width as usize);
            descriptor.setHeight(height as usize);
            descriptor.setUsage(MTLTextureUsage::RenderTarget);
        }

        device
            .newTextureWithDescriptor(&descriptor)
            .ok_or(RendererError::DepthTexture)
    }

    fn create_sampler_state(
        device: &ProtocolObject<dyn MTLDevice>,
    ) -> Result<Retained<ProtocolObject<dyn MTLSamplerState>>, RendererError> {
        let descriptor = MTLSamplerDescriptor::new();
        // Nearest filtering keeps low-resolution block textures crisp.
        descriptor.setMinFilter(MTLSamplerMinMagFilter::Nearest);
        descriptor.setMagFilter(MTLSamplerMinMagFilter::Nearest);

        device
            .newSamplerStateWithDescriptor(&descriptor)
            .ok_or(RendererError::SamplerState)
    }

    /// Renders one frame: advance the rotation, recompute the MVP matrix,
    /// draw the cube, present.
    ///
    /// A missing drawable is a normal transient condition (occluded window,
    /// resize in flight) and skips the frame without an error.
    pub fn render(&mut self) -> Result<(), RendererError> {
        let Some(drawable) = (unsafe { self.layer.nextDrawable() }) else {
            return Ok(());
        };

        let command_buffer = self
            .command_queue
            .commandBuffer()
            .ok_or(RendererError::CommandBuffer)?;

        let label = NSString::from_str("Cube Render Pass");
        command_buffer.setLabel(Some(&label));

        self.rotation = wrap_angle(self.rotation + ROTATION_STEP);

        let model = Mat4::rotation(self.rotation, ROTATION_AXIS);
        let view = Mat4::translation(0.0, 0.0, -CAMERA_DISTANCE);
        let (width, height) = self.drawable_size;
        let projection =
            Mat4::perspective(width as f32 / height as f32, FOV_Y, NEAR_PLANE, FAR_PLANE)?;
        let mvp_matrix = projection.multiply(&view.multiply(&model));

        let uniforms = Uniforms { mvp_matrix };
        unsafe {
            let contents = self.uniform_buffer.contents();
            std::ptr::copy_nonoverlapping(
                &raw const uniforms,
                contents.as_ptr().cast::<Uniforms>(),
                1,
            );
        }

        let render_pass_descriptor = unsafe { MTLRenderPassDescriptor::new() };
        let color_attachment = unsafe {
            render_pass_descriptor
                .colorAttachments()
                .objectAtIndexedSubscript(0)
        };

        unsafe {
            color_attachment.setTexture(Some(&drawable.texture()));
            color_attachment.setLoadAction(MTLLoadAction::Clear);
            color_attachment.setClearColor(MTLClearColor {
                red: 0.1,
                green: 0.1,
                blue: 0.12,
                alpha: 1.0,
            });
            color_attachment.setStoreAction(MTLStoreAction::Store);
        }

        if let Some(depth_texture) = &self.depth_texture {
            let depth_attachment = render_pass_descriptor.depthAttachment();
            depth_attachment.setTexture(Some(depth_texture));
            depth_attachment.setLoadAction(MTLLoadAction::Clear);
            depth_attachment.setClearDepth(1.0);
            depth_attachment.setStoreAction(MTLStoreAction::DontCare);
        }

        if let Some(render_encoder) =
            command_buffer.renderCommandEncoderWithDescriptor(&render_pass_descriptor)
        {
            let label = NSString::from_str("Cube Encoder");
            render_encoder.setLabel(Some(&label));

            render_encoder.setRenderPipelineState(&self.pipeline_state);
            render_encoder.setDepthStencilState(Some(&self.depth_stencil_state));

            unsafe {
                render_encoder.setVertexBuffer_offset_atIndex(Some(&self.vertex_buffer), 0, 0);
                render_encoder.setVertexBuffer_offset_atIndex(Some(&self.uniform_buffer), 0, 1);

                if let ModeState::Textured { texture, sampler } = &self.mode_state {
                    render_encoder.setFragmentTexture_atIndex(Some(texture), 0);
                    render_encoder.setFragmentSamplerState_atIndex(Some(sampler), 0);
                }

                render_encoder
                    .drawIndexedPrimitives_indexCount_indexType_indexBuffer_indexBufferOffset(
                        MTLPrimitiveType::Triangle,
                        self.index_count,
                        MTLIndexType::UInt16,
                        &self.index_buffer,
                        0,
                    );
            }

            render_encoder.endEncoding();
        }

        unsafe {
            let mtl_drawable = (&raw const *drawable).cast::<ProtocolObject<dyn MTLDrawable>>();
            command_buffer.presentDrawable(&*mtl_drawable);
        }

        command_buffer.commit();

        Ok(())
    }

    /// Adopts a new drawable size: updates the projection aspect ratio and
    /// recreates the depth texture. Zero-sized updates are ignored.
    pub fn update_drawable_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.drawable_size = (width, height);

        let size = CGSize {
            width: f64::from(width),
            height: f64::from(height),
        };
        unsafe {
            self.layer.setDrawableSize(size);
        }

        if let Ok(depth_texture) = Self::create_depth_texture(&self.device, width, height) {
            self.depth_texture = Some(depth_texture);
        }
    }

    /// Accumulated rotation angle in radians, normalized to `[0, 2π)`.
    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }
}
