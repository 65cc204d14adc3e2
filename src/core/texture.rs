use crate::core::{TextureError, TextureLoader};
use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2_metal::{MTLDevice, MTLPixelFormat, MTLTexture, MTLTextureDescriptor, MTLTextureUsage};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    Bgra8,
}

impl TextureFormat {
    pub fn metal_format(&self) -> MTLPixelFormat {
        match self {
            Self::Rgba8 => MTLPixelFormat::RGBA8Unorm,
            Self::Bgra8 => MTLPixelFormat::BGRA8Unorm,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }
}

/// A 2D texture resident in GPU memory.
pub struct Texture {
    pub texture: Retained<ProtocolObject<dyn MTLTexture>>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl Texture {
    /// Decodes an image file and uploads it.
    pub fn load(
        device: &ProtocolObject<dyn MTLDevice>,
        path: impl AsRef<Path>,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| TextureError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let rgba_image = image.to_rgba8();
        let (width, height) = rgba_image.dimensions();
        Self::create_from_data(device, rgba_image.as_raw(), width, height, TextureFormat::Rgba8)
    }

    /// Uploads raw pixel data as a shader-readable texture.
    pub fn create_from_data(
        device: &ProtocolObject<dyn MTLDevice>,
        data: &[u8],
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(TextureError::DataSize {
                expected,
                actual: data.len(),
            });
        }

        let descriptor = unsafe { MTLTextureDescriptor::new() };
        unsafe {
            descriptor.setPixelFormat(format.metal_format());
            descriptor.setWidth(width as usize);
            descriptor.setHeight(height as usize);
            descriptor.setUsage(MTLTextureUsage::ShaderRead);
        }

        let texture = device
            .newTextureWithDescriptor(&descriptor)
            .ok_or(TextureError::Allocation)?;

        let bytes_per_row = width as usize * format.bytes_per_pixel();
        let region = objc2_metal::MTLRegion {
            origin: objc2_metal::MTLOrigin { x: 0, y: 0, z: 0 },
            size: objc2_metal::MTLSize {
                width: width as usize,
                height: height as usize,
                depth: 1,
            },
        };

        // Safety: `data` is a valid slice for the whole call and Metal copies
        // it into the texture before returning.
        unsafe {
            let data_ptr = std::ptr::NonNull::new(data.as_ptr().cast_mut().cast())
                .ok_or(TextureError::Allocation)?;

            texture.replaceRegion_mipmapLevel_withBytes_bytesPerRow(
                region,
                0,
                data_ptr,
                bytes_per_row,
            );
        }

        Ok(Self {
            texture,
            width,
            height,
            format,
        })
    }
}

/// [`TextureLoader`] backed by a Metal device.
pub struct MetalTextureLoader {
    device: Retained<ProtocolObject<dyn MTLDevice>>,
}

impl MetalTextureLoader {
    #[must_use]
    pub fn new(device: Retained<ProtocolObject<dyn MTLDevice>>) -> Self {
        Self { device }
    }
}

impl TextureLoader for MetalTextureLoader {
    type Texture = Texture;

    fn load(&self, path: &Path) -> Result<Texture, TextureError> {
        Texture::load(&self.device, path)
    }

    fn placeholder(&self) -> Result<Texture, TextureError> {
        // Magenta/black checkerboard, the conventional "missing texture".
        const SIZE: u32 = 16;
        const CHECKER_SIZE: u32 = 8;
        let mut data = vec![0u8; (SIZE * SIZE * 4) as usize];

        for y in 0..SIZE {
            for x in 0..SIZE {
                let is_magenta = ((x / CHECKER_SIZE) + (y / CHECKER_SIZE)) % 2 == 0;
                let idx = ((y * SIZE + x) * 4) as usize;
                data[idx] = if is_magenta { 255 } else { 0 };
                data[idx + 1] = 0;
                data[idx + 2] = if is_magenta { 255 } else { 0 };
                data[idx + 3] = 255;
            }
        }

        Texture::create_from_data(&self.device, &data, SIZE, SIZE, TextureFormat::Rgba8)
    }
}
