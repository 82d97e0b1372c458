use std::borrow::Cow;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage,
    ShaderType,
};

use crate::error::GpuError;

/// A WGSL entry shader and the path it is reported under.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource {
    /// WGSL text, possibly with `#import` directives.
    pub source: &'static str,
    /// Path used in composition diagnostics.
    pub file_path: &'static str,
}

/// Instanced cube raster shader.
pub const CUBE_SHADER: ShaderSource = ShaderSource {
    source: include_str!("../../assets/shaders/raster/cube.wgsl"),
    file_path: "raster/cube.wgsl",
};

/// Nearest-hit picking compute shader.
pub const PICK_SHADER: ShaderSource = ShaderSource {
    source: include_str!("../../assets/shaders/compute/pick.wgsl"),
    file_path: "compute/pick.wgsl",
};

/// Shared modules, in dependency order.
const MODULES: [ShaderSource; 2] = [
    ShaderSource {
        source: include_str!("../../assets/shaders/modules/camera.wgsl"),
        file_path: "modules/camera.wgsl",
    },
    ShaderSource {
        source: include_str!("../../assets/shaders/modules/instance.wgsl"),
        file_path: "modules/instance.wgsl",
    },
];

/// Wraps `naga_oil::compose::Composer` so entry shaders can
/// `#import cubefield::camera` and `cubefield::instance`.
///
/// Output is `naga::Module` IR handed straight to wgpu, skipping a WGSL
/// re-parse.
pub struct ShaderComposer {
    composer: Composer,
}

impl ShaderComposer {
    /// Register the shared modules.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::Shader`] if a shared module fails to parse.
    pub fn new() -> Result<Self, GpuError> {
        let mut composer = Composer::default();
        for module in &MODULES {
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: module.source,
                    file_path: module.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| {
                    GpuError::Shader(format!(
                        "failed to register '{}': {e}",
                        module.file_path
                    ))
                })?;
        }
        Ok(Self { composer })
    }

    /// Compose `shader` into a `wgpu::ShaderModule`.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::Shader`] if composition fails.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        shader: ShaderSource,
    ) -> Result<wgpu::ShaderModule, GpuError> {
        let naga_module = self.compose_naga(shader)?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose `shader` into naga IR without a device.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::Shader`] if composition fails.
    pub fn compose_naga(
        &mut self,
        shader: ShaderSource,
    ) -> Result<naga::Module, GpuError> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source: shader.source,
                file_path: shader.file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| {
                GpuError::Shader(format!(
                    "failed to compose '{}': {e}",
                    shader.file_path
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_shaders_compose() {
        let mut composer = ShaderComposer::new().unwrap();
        for shader in [CUBE_SHADER, PICK_SHADER] {
            let module = composer
                .compose_naga(shader)
                .unwrap_or_else(|e| panic!("{e}"));
            assert!(!module.entry_points.is_empty(), "{}", shader.file_path);
        }
    }

    #[test]
    fn entry_points_are_present() {
        let mut composer = ShaderComposer::new().unwrap();
        let mut names = |shader: ShaderSource| {
            composer
                .compose_naga(shader)
                .unwrap()
                .entry_points
                .iter()
                .map(|e| e.name.clone())
                .collect::<Vec<_>>()
        };
        let cube = names(CUBE_SHADER);
        assert!(cube.contains(&"vs_main".to_owned()));
        assert!(cube.contains(&"fs_main".to_owned()));
        let pick = names(PICK_SHADER);
        assert!(pick.contains(&"find_nearest".to_owned()));
        assert!(pick.contains(&"resolve_slot".to_owned()));
    }
}
