//! Render pipelines, built lazily per program, target and depth state.

use std::collections::HashMap;

use crate::buffer::VertexLayoutKind;
use crate::command::{DepthCompare, ProgramId, RenderTarget};
use crate::depth::DepthBuffer;
use crate::resources::{GpuResources, TextureBindingKind};
use crate::shader::{ShaderError, ShaderLibrary};
use crate::targets::{COLOR_FORMAT, SHADOW_FORMAT};

/// A texture input of a program: recorded slot, bind group index, kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInput {
    pub slot: u32,
    pub group: u32,
    pub kind: TextureBindingKind,
}

/// Bind group arrangement of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramLayout {
    /// Whether group 0 is the dynamic-offset uniform block.
    pub uniforms: bool,
    pub textures: &'static [TextureInput],
}

impl ProgramLayout {
    pub fn of(program: ProgramId) -> Self {
        const PLANET: &[TextureInput] = &[
            TextureInput {
                slot: 0,
                group: 1,
                kind: TextureBindingKind::D2,
            },
            TextureInput {
                slot: 1,
                group: 2,
                kind: TextureBindingKind::DepthCube,
            },
        ];
        const SKYBOX: &[TextureInput] = &[TextureInput {
            slot: 0,
            group: 1,
            kind: TextureBindingKind::Cube,
        }];
        const COMPOSITE: &[TextureInput] = &[TextureInput {
            slot: 0,
            group: 0,
            kind: TextureBindingKind::D2,
        }];

        match program {
            ProgramId::Planet => Self {
                uniforms: true,
                textures: PLANET,
            },
            ProgramId::ShadowDepth => Self {
                uniforms: true,
                textures: &[],
            },
            ProgramId::Skybox => Self {
                uniforms: true,
                textures: SKYBOX,
            },
            ProgramId::Composite => Self {
                uniforms: false,
                textures: COMPOSITE,
            },
        }
    }

    pub fn texture_input(&self, slot: u32) -> Option<&TextureInput> {
        self.textures.iter().find(|input| input.slot == slot)
    }
}

/// Depth state of a draw; `None` when depth testing is off.
pub type DepthState = Option<DepthCompare>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: ProgramId,
    pub target: RenderTarget,
    pub depth: DepthState,
}

/// Attachment formats of a target: color (if any) and depth (if any).
pub fn target_formats(
    target: RenderTarget,
    surface_format: wgpu::TextureFormat,
) -> (Option<wgpu::TextureFormat>, Option<wgpu::TextureFormat>) {
    match target {
        RenderTarget::Screen => (Some(surface_format), None),
        RenderTarget::Offscreen => (Some(COLOR_FORMAT), Some(DepthBuffer::FORMAT)),
        RenderTarget::ShadowCubemap => (None, Some(SHADOW_FORMAT)),
    }
}

/// Depth-stencil state for a target with a depth attachment. Disabled
/// testing still needs a state; it always passes and never writes.
pub fn depth_stencil_state(
    format: wgpu::TextureFormat,
    depth: DepthState,
) -> wgpu::DepthStencilState {
    let (depth_compare, depth_write_enabled) = match depth {
        Some(compare) => (compare.to_wgpu(), true),
        None => (wgpu::CompareFunction::Always, false),
    };
    wgpu::DepthStencilState {
        format,
        depth_write_enabled,
        depth_compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub struct PipelineCache {
    shaders: ShaderLibrary,
    surface_format: wgpu::TextureFormat,
    layouts: HashMap<ProgramId, wgpu::PipelineLayout>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new(resources: &GpuResources, surface_format: wgpu::TextureFormat) -> Self {
        let device = resources.device();
        let shaders = ShaderLibrary::with_builtin_programs(device);

        let layouts = ProgramId::ALL
            .into_iter()
            .map(|program| {
                let layout = ProgramLayout::of(program);
                let mut groups: Vec<&wgpu::BindGroupLayout> = Vec::new();
                if layout.uniforms {
                    groups.push(resources.uniform_layout());
                }
                for input in layout.textures {
                    groups.push(resources.texture_layout(input.kind));
                }
                let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(program.label()),
                    bind_group_layouts: &groups,
                    immediate_size: 0,
                });
                (program, pipeline_layout)
            })
            .collect();

        Self {
            shaders,
            surface_format,
            layouts,
            pipelines: HashMap::new(),
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    /// Build the pipeline for `key` unless it already exists.
    pub fn prepare(&mut self, device: &wgpu::Device, key: PipelineKey) -> Result<(), ShaderError> {
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }
        let module = self.shaders.get(key.program)?;
        let layout = self.layouts.get(&key.program);
        let (color_format, depth_format) = target_formats(key.target, self.surface_format);

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = color_format
            .map(|format| wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
            .into_iter()
            .map(Some)
            .collect();

        let label = format!("{}-{:?}", key.program.label(), key.target);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout,
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[VertexLayoutKind::for_program(key.program).layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // Rings are two-sided and the shadow faces are Y-flipped.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: depth_format.map(|format| depth_stencil_state(format, key.depth)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &color_targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("Built pipeline '{label}' (depth {:?})", key.depth);
        self.pipelines.insert(key, pipeline);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planet_reads_diffuse_and_shadow_slots() {
        let layout = ProgramLayout::of(ProgramId::Planet);
        assert!(layout.uniforms);
        assert_eq!(layout.texture_input(0).map(|t| t.group), Some(1));
        assert_eq!(
            layout.texture_input(1).map(|t| t.kind),
            Some(TextureBindingKind::DepthCube)
        );
        // Specular and normal maps are bound by drawables but unused here.
        assert!(layout.texture_input(2).is_none());
    }

    #[test]
    fn test_composite_has_no_uniform_group() {
        let layout = ProgramLayout::of(ProgramId::Composite);
        assert!(!layout.uniforms);
        assert_eq!(layout.textures[0].group, 0);
    }

    #[test]
    fn test_bind_groups_are_contiguous_from_zero() {
        for program in ProgramId::ALL {
            let layout = ProgramLayout::of(program);
            let first = if layout.uniforms { 1 } else { 0 };
            for (i, input) in layout.textures.iter().enumerate() {
                assert_eq!(input.group, first + i as u32, "{program:?}");
            }
        }
    }

    #[test]
    fn test_target_formats() {
        let surface = wgpu::TextureFormat::Bgra8UnormSrgb;
        assert_eq!(target_formats(RenderTarget::Screen, surface), (Some(surface), None));
        assert_eq!(
            target_formats(RenderTarget::ShadowCubemap, surface),
            (None, Some(wgpu::TextureFormat::Depth32Float))
        );
        assert_eq!(
            target_formats(RenderTarget::Offscreen, surface).1,
            Some(wgpu::TextureFormat::Depth24PlusStencil8)
        );
    }

    #[test]
    fn test_disabled_depth_never_writes() {
        let state = depth_stencil_state(wgpu::TextureFormat::Depth32Float, None);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Always);
        assert!(!state.depth_write_enabled);

        let state = depth_stencil_state(
            wgpu::TextureFormat::Depth32Float,
            Some(DepthCompare::LessEqual),
        );
        assert_eq!(state.depth_compare, wgpu::CompareFunction::LessEqual);
        assert!(state.depth_write_enabled);
    }
}
