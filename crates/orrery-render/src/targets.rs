//! GPU side of the render targets: the offscreen color + depth target, the
//! shadow depth cubemap and the shared full-screen quad.

use orrery_scene::{MeshHandle, TextureHandle};

use crate::buffer::VertexLayoutKind;
use crate::depth::DepthBuffer;
use crate::error::ResourceError;
use crate::mesh::screen_quad;
use crate::render_target::TargetHandles;
use crate::resources::{GpuResources, TextureBindingKind};

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A target is usable only if both sides are within `1..=max`.
pub fn validate_target_size(width: u32, height: u32, max: u32) -> Result<(), ResourceError> {
    if width == 0 || height == 0 || width > max || height > max {
        Err(ResourceError::IncompleteTarget { width, height, max })
    } else {
        Ok(())
    }
}

/// The nearest usable size.
pub fn clamp_target_size(width: u32, height: u32, max: u32) -> (u32, u32) {
    let max = max.max(1);
    (width.clamp(1, max), height.clamp(1, max))
}

struct ShadowCubemap {
    _texture: wgpu::Texture,
    face_views: Vec<wgpu::TextureView>,
    handle: TextureHandle,
    resolution: u32,
}

impl ShadowCubemap {
    fn new(resources: &mut GpuResources, resolution: u32) -> Self {
        let texture = resources.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow-cubemap"),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let face_views = (0..6)
            .map(|face| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("shadow-cubemap-face"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: face,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();
        let cube_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("shadow-cubemap"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let handle =
            resources.register_view(TextureBindingKind::DepthCube, "shadow-cubemap", &cube_view);

        Self {
            _texture: texture,
            face_views,
            handle,
            resolution,
        }
    }
}

pub struct RenderTargets {
    width: u32,
    height: u32,
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    color_handle: TextureHandle,
    depth: DepthBuffer,
    shadow: Option<ShadowCubemap>,
    screen_quad: MeshHandle,
}

impl RenderTargets {
    /// Allocate the targets. `shadow_resolution` of `None` skips the shadow
    /// cubemap entirely.
    pub fn new(
        resources: &mut GpuResources,
        width: u32,
        height: u32,
        shadow_resolution: Option<u32>,
    ) -> Result<Self, ResourceError> {
        let max = resources.device().limits().max_texture_dimension_2d;
        validate_target_size(width, height, max)?;
        if let Some(resolution) = shadow_resolution {
            validate_target_size(resolution, resolution, max)?;
        }

        let (color_texture, color_view) = create_color_target(resources.device(), width, height);
        let color_handle =
            resources.register_view(TextureBindingKind::D2, "offscreen-color", &color_view);
        let depth = DepthBuffer::new(resources.device(), width, height);
        let shadow = shadow_resolution.map(|resolution| ShadowCubemap::new(resources, resolution));
        let screen_quad = resources.upload_mesh(
            "screen-quad",
            &screen_quad(),
            None,
            VertexLayoutKind::PositionUv,
        );

        log::info!(
            "Render targets {width}x{height}, shadow cubemap {}",
            shadow_resolution.map_or("off".to_string(), |r| format!("{r}x{r}"))
        );

        Ok(Self {
            width,
            height,
            color_texture,
            color_view,
            color_handle,
            depth,
            shadow,
            screen_quad,
        })
    }

    /// Re-create the size-dependent attachments. Handles stay valid; the
    /// shadow cubemap is untouched.
    pub fn resize(
        &mut self,
        resources: &mut GpuResources,
        width: u32,
        height: u32,
    ) -> Result<(), ResourceError> {
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }
        let max = resources.device().limits().max_texture_dimension_2d;
        validate_target_size(width, height, max)?;

        let (color_texture, color_view) = create_color_target(resources.device(), width, height);
        resources.replace_view(self.color_handle, &color_view);
        self.color_texture = color_texture;
        self.color_view = color_view;
        self.depth.resize(resources.device(), width, height);
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn handles(&self) -> TargetHandles {
        TargetHandles {
            color: self.color_handle,
            shadow_map: self.shadow.as_ref().map(|shadow| shadow.handle),
            screen_quad: self.screen_quad,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    pub fn color_texture(&self) -> &wgpu::Texture {
        &self.color_texture
    }

    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn shadow_resolution(&self) -> Option<u32> {
        self.shadow.as_ref().map(|shadow| shadow.resolution)
    }

    pub fn shadow_face_views(&self) -> Option<&[wgpu::TextureView]> {
        self.shadow.as_ref().map(|shadow| shadow.face_views.as_slice())
    }
}

fn create_color_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen-color"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
