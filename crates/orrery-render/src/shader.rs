//! Shader module compilation and caching.

use std::{collections::HashMap, sync::Arc};

use log::{debug, info};
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

use crate::{command::ProgramId, programs};

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader for {0:?} has not been loaded")]
    NotLoaded(ProgramId),
}

/// Compiled shader modules, one per program.
pub struct ShaderLibrary {
    modules: HashMap<ProgramId, Arc<wgpu::ShaderModule>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Compile every built-in program.
    pub fn with_builtin_programs(device: &wgpu::Device) -> Self {
        let mut library = Self::new();
        for program in ProgramId::ALL {
            library.load_from_source(device, program, programs::source(program));
        }
        library
    }

    /// Compile `source` as `program`'s module, replacing any earlier one.
    ///
    /// WGSL errors surface through the device's uncaptured error handler.
    pub fn load_from_source(
        &mut self,
        device: &wgpu::Device,
        program: ProgramId,
        source: &str,
    ) -> Arc<wgpu::ShaderModule> {
        debug!("Compiling shader '{}'", program.label());

        let module = Arc::new(device.create_shader_module(ShaderModuleDescriptor {
            label: Some(program.label()),
            source: ShaderSource::Wgsl(source.into()),
        }));

        if self.modules.insert(program, module.clone()).is_some() {
            info!("Replaced shader '{}'", program.label());
        } else {
            info!("Loaded shader '{}'", program.label());
        }
        module
    }

    pub fn get(&self, program: ProgramId) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        self.modules
            .get(&program)
            .cloned()
            .ok_or(ShaderError::NotLoaded(program))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}
