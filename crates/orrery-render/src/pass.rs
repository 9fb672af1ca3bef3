//! Render pass abstraction for reducing wgpu boilerplate.
//!
//! Provides [`RenderPassBuilder`] for declarative render pass configuration
//! and [`FrameEncoder`] for managing per-frame command encoding lifecycle.

use std::sync::Arc;

/// Builder for configuring render pass descriptors with a fluent API.
///
/// Attachments whose clear value is unset keep their previous contents.
#[derive(Debug, Clone, Default)]
pub struct RenderPassBuilder {
    clear_color: Option<wgpu::Color>,
    clear_depth: Option<f32>,
    stencil: bool,
    label: Option<&'static str>,
}

impl RenderPassBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = Some(color);
        self
    }

    pub fn clear_depth(mut self, value: f32) -> Self {
        self.clear_depth = Some(value);
        self
    }

    /// The depth attachment also carries a stencil aspect that must be
    /// given load/store ops.
    pub fn with_stencil(mut self, stencil: bool) -> Self {
        self.stencil = stencil;
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn color_load_op(&self) -> wgpu::LoadOp<wgpu::Color> {
        self.clear_color.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear)
    }

    pub fn depth_load_op(&self) -> wgpu::LoadOp<f32> {
        self.clear_depth.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear)
    }

    /// Begin the pass. Either attachment may be absent (depth-only shadow
    /// faces, color-only screen).
    pub fn begin<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        color_view: Option<&'encoder wgpu::TextureView>,
        depth_view: Option<&'encoder wgpu::TextureView>,
    ) -> wgpu::RenderPass<'encoder> {
        let color_attachment = color_view.map(|view| wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: self.color_load_op(),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        });

        let stencil_ops = self.stencil.then_some(wgpu::Operations {
            load: if self.clear_depth.is_some() {
                wgpu::LoadOp::Clear(0)
            } else {
                wgpu::LoadOp::Load
            },
            store: wgpu::StoreOp::Store,
        });
        let depth_stencil_attachment =
            depth_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: self.depth_load_op(),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops,
            });

        let color_attachments: Vec<_> = color_attachment.into_iter().map(Some).collect();
        let descriptor = wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        };

        encoder.begin_render_pass(&descriptor)
    }
}

/// One frame's command encoder and swapchain image.
///
/// `submit` finishes the encoder and presents. Dropping an unsubmitted
/// frame discards its work.
pub struct FrameEncoder {
    encoder: Option<wgpu::CommandEncoder>,
    queue: Arc<wgpu::Queue>,
    surface_texture: Option<wgpu::SurfaceTexture>,
    surface_view: wgpu::TextureView,
}

impl FrameEncoder {
    pub fn new(
        device: &wgpu::Device,
        queue: Arc<wgpu::Queue>,
        surface_texture: wgpu::SurfaceTexture,
    ) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame-encoder"),
        });

        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            encoder: Some(encoder),
            queue,
            surface_texture: Some(surface_texture),
            surface_view,
        }
    }

    /// The encoder and the swapchain view, borrowed together so passes can
    /// target the screen.
    pub fn parts(&mut self) -> Option<(&mut wgpu::CommandEncoder, &wgpu::TextureView)> {
        let encoder = self.encoder.as_mut()?;
        Some((encoder, &self.surface_view))
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Submit the command buffer and present the surface texture.
    pub fn submit(mut self) {
        if let (Some(encoder), Some(surface_texture)) =
            (self.encoder.take(), self.surface_texture.take())
        {
            self.queue.submit([encoder.finish()]);
            surface_texture.present();
        }
    }
}

impl Drop for FrameEncoder {
    fn drop(&mut self) {
        if self.encoder.is_some() {
            log::warn!("FrameEncoder dropped without submit(); frame discarded");
        }
    }
}
