//! Registry of GPU textures and meshes addressed by handle.
//!
//! Scene code only ever holds [`TextureHandle`]s and [`MeshHandle`]s. The
//! registry owns the wgpu objects behind them, plus one fallback texture per
//! binding kind so a missing or mistyped handle still draws something.

use std::path::Path;
use std::sync::Arc;

use bytemuck::Pod;
use image::RgbaImage;
use orrery_scene::{MeshHandle, TextureHandle};

use crate::buffer::{BufferAllocator, IndexData, MeshBuffer, VertexLayoutKind};
use crate::error::ResourceError;
use crate::texture::{CubemapFaces, load_rgba, mip_chain};

/// Format of uploaded color images.
pub const COLOR_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// How a texture is bound, which fixes its bind group layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureBindingKind {
    /// 2D color image with a filtering sampler.
    D2,
    /// Color cubemap with a filtering sampler.
    Cube,
    /// Depth cubemap with a comparison sampler.
    DepthCube,
}

struct TextureEntry {
    kind: TextureBindingKind,
    bind_group: wgpu::BindGroup,
    // Keeps uploaded textures alive; views registered from elsewhere are
    // owned by their creator.
    _texture: Option<wgpu::Texture>,
}

pub struct GpuResources {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    uniform_layout: wgpu::BindGroupLayout,
    texture_2d_layout: wgpu::BindGroupLayout,
    cube_layout: wgpu::BindGroupLayout,
    depth_cube_layout: wgpu::BindGroupLayout,
    color_sampler: wgpu::Sampler,
    cube_sampler: wgpu::Sampler,
    shadow_sampler: wgpu::Sampler,
    textures: Vec<TextureEntry>,
    meshes: Vec<MeshBuffer>,
    fallback_2d: TextureHandle,
    fallback_cube: TextureHandle,
    fallback_depth_cube: TextureHandle,
}

impl GpuResources {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform-bind-group-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_2d_layout = sampled_texture_layout(
            &device,
            "texture-2d-layout",
            wgpu::TextureViewDimension::D2,
            wgpu::TextureSampleType::Float { filterable: true },
            wgpu::SamplerBindingType::Filtering,
        );
        let cube_layout = sampled_texture_layout(
            &device,
            "cubemap-layout",
            wgpu::TextureViewDimension::Cube,
            wgpu::TextureSampleType::Float { filterable: true },
            wgpu::SamplerBindingType::Filtering,
        );
        let depth_cube_layout = sampled_texture_layout(
            &device,
            "depth-cubemap-layout",
            wgpu::TextureViewDimension::Cube,
            wgpu::TextureSampleType::Depth,
            wgpu::SamplerBindingType::Comparison,
        );

        let color_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sampler-color"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });
        let cube_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sampler-cubemap"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sampler-shadow"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let mut resources = Self {
            device,
            queue,
            uniform_layout,
            texture_2d_layout,
            cube_layout,
            depth_cube_layout,
            color_sampler,
            cube_sampler,
            shadow_sampler,
            textures: Vec::new(),
            meshes: Vec::new(),
            fallback_2d: TextureHandle(0),
            fallback_cube: TextureHandle(0),
            fallback_depth_cube: TextureHandle(0),
        };

        resources.fallback_2d = resources.upload_texture_2d(
            "fallback-white",
            RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255])),
        );
        resources.fallback_cube =
            resources.upload_cubemap("fallback-black-cube", &CubemapFaces::solid([0, 0, 0, 255], 1));
        resources.fallback_depth_cube = resources.create_empty_depth_cube();
        resources
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn uniform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_layout
    }

    pub fn texture_layout(&self, kind: TextureBindingKind) -> &wgpu::BindGroupLayout {
        match kind {
            TextureBindingKind::D2 => &self.texture_2d_layout,
            TextureBindingKind::Cube => &self.cube_layout,
            TextureBindingKind::DepthCube => &self.depth_cube_layout,
        }
    }

    pub fn fallback(&self, kind: TextureBindingKind) -> TextureHandle {
        match kind {
            TextureBindingKind::D2 => self.fallback_2d,
            TextureBindingKind::Cube => self.fallback_cube,
            TextureBindingKind::DepthCube => self.fallback_depth_cube,
        }
    }

    pub fn texture_kind(&self, handle: TextureHandle) -> Option<TextureBindingKind> {
        self.textures.get(handle.0 as usize).map(|entry| entry.kind)
    }

    /// Bind group for `handle` if it is registered as `kind`, otherwise the
    /// fallback for `kind`.
    pub fn texture_bind_group(
        &self,
        handle: Option<TextureHandle>,
        kind: TextureBindingKind,
    ) -> &wgpu::BindGroup {
        let resolved = handle
            .filter(|h| self.texture_kind(*h) == Some(kind))
            .unwrap_or_else(|| self.fallback(kind));
        &self.textures[resolved.0 as usize].bind_group
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&MeshBuffer> {
        self.meshes.get(handle.0 as usize)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn load_texture_2d(&mut self, path: &Path) -> Result<TextureHandle, ResourceError> {
        let image = load_rgba(path)?;
        Ok(self.upload_texture_2d(&path.display().to_string(), image))
    }

    /// Upload an sRGB color image with a full mip chain.
    pub fn upload_texture_2d(&mut self, label: &str, image: RgbaImage) -> TextureHandle {
        let (width, height) = image.dimensions();
        let levels = mip_chain(image);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, mip) in levels.iter().enumerate() {
            self.write_layer(&texture, level as u32, 0, mip);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::info!(
            "Created texture '{label}' ({width}x{height}, {} mips)",
            levels.len()
        );
        self.push_texture(TextureBindingKind::D2, label, &view, Some(texture))
    }

    /// Upload six faces as one cubemap.
    pub fn upload_cubemap(&mut self, label: &str, faces: &CubemapFaces) -> TextureHandle {
        let size = faces.size();
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in faces.faces().iter().enumerate() {
            self.write_layer(&texture, 0, layer as u32, face);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        log::info!("Created cubemap '{label}' ({size}x{size})");
        self.push_texture(TextureBindingKind::Cube, label, &view, Some(texture))
    }

    /// Register a view owned elsewhere, such as a render target attachment.
    pub fn register_view(
        &mut self,
        kind: TextureBindingKind,
        label: &str,
        view: &wgpu::TextureView,
    ) -> TextureHandle {
        self.push_texture(kind, label, view, None)
    }

    /// Point an existing handle at a new view of the same kind, e.g. after
    /// a render target is re-created at a new size.
    pub fn replace_view(&mut self, handle: TextureHandle, view: &wgpu::TextureView) -> bool {
        let Some(kind) = self.texture_kind(handle) else {
            return false;
        };
        let bind_group = self.create_texture_bind_group(kind, "replaced-view", view);
        let entry = &mut self.textures[handle.0 as usize];
        entry.bind_group = bind_group;
        entry._texture = None;
        true
    }

    pub fn upload_mesh<V: Pod>(
        &mut self,
        label: &str,
        vertices: &[V],
        indices: Option<IndexData<'_>>,
        layout: VertexLayoutKind,
    ) -> MeshHandle {
        let mesh = BufferAllocator::new(&self.device).create_mesh(label, vertices, indices, layout);
        self.meshes.push(mesh);
        log::debug!("Uploaded mesh '{label}' ({} vertices)", vertices.len());
        MeshHandle(self.meshes.len() as u32 - 1)
    }

    fn push_texture(
        &mut self,
        kind: TextureBindingKind,
        label: &str,
        view: &wgpu::TextureView,
        texture: Option<wgpu::Texture>,
    ) -> TextureHandle {
        let bind_group = self.create_texture_bind_group(kind, label, view);
        self.textures.push(TextureEntry {
            kind,
            bind_group,
            _texture: texture,
        });
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn create_texture_bind_group(
        &self,
        kind: TextureBindingKind,
        label: &str,
        view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        let sampler = match kind {
            TextureBindingKind::D2 => &self.color_sampler,
            TextureBindingKind::Cube => &self.cube_sampler,
            TextureBindingKind::DepthCube => &self.shadow_sampler,
        };
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bind-group")),
            layout: self.texture_layout(kind),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn write_layer(&self, texture: &wgpu::Texture, mip_level: u32, layer: u32, image: &RgbaImage) {
        let (width, height) = image.dimensions();
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Stand-in shadow map bound while no shadow pass exists. The planet
    /// program only samples it when shadows are on.
    fn create_empty_depth_cube(&mut self) -> TextureHandle {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fallback-shadow-cube"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: crate::targets::SHADOW_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        self.push_texture(
            TextureBindingKind::DepthCube,
            "fallback-shadow-cube",
            &view,
            Some(texture),
        )
    }
}

fn sampled_texture_layout(
    device: &wgpu::Device,
    label: &str,
    view_dimension: wgpu::TextureViewDimension,
    sample_type: wgpu::TextureSampleType,
    sampler: wgpu::SamplerBindingType,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type,
                    view_dimension,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(sampler),
                count: None,
            },
        ],
    })
}
