use std::borrow::Cow;
use std::fmt;

use thiserror::Error;
use wgpu::naga;
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

/// Cube vertex stage: transform, texcoord passthrough, per-vertex lighting.
pub const VERTEX_SHADER: &str = r#"#version 450

layout(location = 0) in vec3 position;
layout(location = 1) in vec3 normal;
layout(location = 2) in vec2 texcoord;

layout(location = 0) out vec2 v_texcoord;
layout(location = 1) out vec3 v_lighting;

layout(std140, set = 0, binding = 0) uniform SceneParams {
    mat4 projection;
    mat4 model_view;
    mat4 normal_matrix;
} scene;

const vec3 AMBIENT_LIGHT = vec3(0.3, 0.3, 0.3);
const vec3 DIRECTIONAL_COLOR = vec3(1.0, 1.0, 1.0);
const vec3 DIRECTIONAL_VECTOR = vec3(0.85, 0.8, 0.75);

void main() {
    gl_Position = scene.projection * scene.model_view * vec4(position, 1.0);
    v_texcoord = texcoord;

    vec3 lit_normal = normalize((scene.normal_matrix * vec4(normal, 0.0)).xyz);
    float directional = max(dot(lit_normal, normalize(DIRECTIONAL_VECTOR)), 0.0);
    v_lighting = AMBIENT_LIGHT + DIRECTIONAL_COLOR * directional;
}
"#;

/// Cube fragment stage: sample the face texture and apply the lighting.
pub const FRAGMENT_SHADER: &str = r#"#version 450

layout(location = 0) in vec2 v_texcoord;
layout(location = 1) in vec3 v_lighting;

layout(location = 0) out vec4 out_color;

layout(set = 1, binding = 0) uniform texture2D cube_texture;
layout(set = 1, binding = 1) uniform sampler cube_sampler;

void main() {
    vec4 texel = texture(sampler2D(cube_texture, cube_sampler), v_texcoord);
    out_color = vec4(texel.rgb * v_lighting, texel.a);
}
"#;

/// Shader stage discriminator carried in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
}

impl ShaderStageKind {
    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Errors raised while building the render pipeline. All of them are fatal
/// to start-up; the texture path is the only place that degrades silently.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The GLSL source failed to parse or validate. The log carries the
    /// diagnostics rendered against the offending source.
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile {
        stage: ShaderStageKind,
        log: String,
    },
    /// A name the renderer relies on is missing from the shader interface.
    #[error("shader interface mismatch: {0}")]
    Integration(String),
    /// The GPU rejected the pipeline at creation time.
    #[error("pipeline link failed: {0}")]
    Link(String),
}

/// A parsed and validated shader stage.
///
/// Holds the naga module for interface reflection; no GPU object exists yet,
/// so a failed compile leaves nothing to release.
#[derive(Debug)]
pub(crate) struct CompiledStage {
    pub kind: ShaderStageKind,
    pub module: naga::Module,
    source: String,
}

impl CompiledStage {
    /// Hands the validated source to wgpu. Driver-side rejection surfaces
    /// later through the link error scope, not here.
    pub(crate) fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(match self.kind {
                ShaderStageKind::Vertex => "cube vertex",
                ShaderStageKind::Fragment => "cube fragment",
            }),
            source: wgpu::ShaderSource::Glsl {
                shader: Cow::Borrowed(self.source.as_str()),
                stage: self.kind.naga_stage(),
                defines: &[],
            },
        })
    }
}

/// Parses and validates one GLSL stage through naga.
pub(crate) fn compile_stage(
    kind: ShaderStageKind,
    source: &str,
) -> Result<CompiledStage, PipelineError> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(kind.naga_stage());
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| PipelineError::Compile {
            stage: kind,
            log: errors.emit_to_string(source),
        })?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|err| PipelineError::Compile {
            stage: kind,
            log: err.emit_to_string(source),
        })?;

    Ok(CompiledStage {
        kind,
        module,
        source: source.to_owned(),
    })
}

/// Compiles both cube stages, vertex first. A compile failure short-circuits
/// before any reflection or link work happens.
pub(crate) fn compile_stages(
    vertex_source: &str,
    fragment_source: &str,
) -> Result<(CompiledStage, CompiledStage), PipelineError> {
    let vertex = compile_stage(ShaderStageKind::Vertex, vertex_source)?;
    let fragment = compile_stage(ShaderStageKind::Fragment, fragment_source)?;
    Ok((vertex, fragment))
}

/// Attribute and uniform slots resolved by name from the shader modules.
///
/// The renderer never assumes hard-coded locations; everything it binds is
/// looked up here once, after validation and before the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ShaderInterface {
    pub position_location: u32,
    pub normal_location: u32,
    pub texcoord_location: u32,
    pub scene_group: u32,
    pub scene_binding: u32,
    pub texture_group: u32,
    pub texture_binding: u32,
    pub sampler_group: u32,
    pub sampler_binding: u32,
}

impl ShaderInterface {
    pub(crate) fn resolve(
        vertex: &CompiledStage,
        fragment: &CompiledStage,
    ) -> Result<Self, PipelineError> {
        let position_location = attribute_location(vertex, "position")?;
        let normal_location = attribute_location(vertex, "normal")?;
        let texcoord_location = attribute_location(vertex, "texcoord")?;
        let (scene_group, scene_binding) = uniform_block(
            vertex,
            "scene",
            "SceneParams",
            &["projection", "model_view", "normal_matrix"],
        )?;
        let (texture_group, texture_binding) = texture_binding_for(fragment, "cube_texture")?;
        let (sampler_group, sampler_binding) = sampler_binding_for(fragment, "cube_sampler")?;

        Ok(Self {
            position_location,
            normal_location,
            texcoord_location,
            scene_group,
            scene_binding,
            texture_group,
            texture_binding,
            sampler_group,
            sampler_binding,
        })
    }
}

fn attribute_location(stage: &CompiledStage, name: &str) -> Result<u32, PipelineError> {
    let entry = stage
        .module
        .entry_points
        .iter()
        .find(|entry| entry.stage == naga::ShaderStage::Vertex)
        .ok_or_else(|| PipelineError::Integration("vertex shader has no entry point".into()))?;

    for argument in &entry.function.arguments {
        if argument.name.as_deref() != Some(name) {
            continue;
        }
        if let Some(naga::Binding::Location { location, .. }) = argument.binding {
            return Ok(location);
        }
    }

    Err(PipelineError::Integration(format!(
        "vertex shader does not declare attribute '{name}'"
    )))
}

fn uniform_block(
    stage: &CompiledStage,
    instance_name: &str,
    block_name: &str,
    members: &[&str],
) -> Result<(u32, u32), PipelineError> {
    for (_, variable) in stage.module.global_variables.iter() {
        if variable.space != naga::AddressSpace::Uniform {
            continue;
        }
        let ty = &stage.module.types[variable.ty];
        let named_after_instance = variable.name.as_deref() == Some(instance_name);
        let named_after_block = ty.name.as_deref() == Some(block_name);
        if !named_after_instance && !named_after_block {
            continue;
        }

        let naga::TypeInner::Struct {
            members: declared, ..
        } = &ty.inner
        else {
            return Err(PipelineError::Integration(format!(
                "uniform '{instance_name}' is not a block"
            )));
        };
        for required in members {
            if !declared
                .iter()
                .any(|member| member.name.as_deref() == Some(*required))
            {
                return Err(PipelineError::Integration(format!(
                    "uniform block '{block_name}' is missing member '{required}'"
                )));
            }
        }

        let binding = variable.binding.as_ref().ok_or_else(|| {
            PipelineError::Integration(format!("uniform block '{block_name}' has no binding"))
        })?;
        return Ok((binding.group, binding.binding));
    }

    Err(PipelineError::Integration(format!(
        "shader does not declare uniform block '{block_name}'"
    )))
}

fn texture_binding_for(stage: &CompiledStage, name: &str) -> Result<(u32, u32), PipelineError> {
    let (variable, binding) = named_global(stage, name)?;
    match stage.module.types[variable.ty].inner {
        naga::TypeInner::Image { .. } => Ok(binding),
        _ => Err(PipelineError::Integration(format!(
            "'{name}' is not a texture"
        ))),
    }
}

fn sampler_binding_for(stage: &CompiledStage, name: &str) -> Result<(u32, u32), PipelineError> {
    let (variable, binding) = named_global(stage, name)?;
    match stage.module.types[variable.ty].inner {
        naga::TypeInner::Sampler { .. } => Ok(binding),
        _ => Err(PipelineError::Integration(format!(
            "'{name}' is not a sampler"
        ))),
    }
}

fn named_global<'module>(
    stage: &'module CompiledStage,
    name: &str,
) -> Result<(&'module naga::GlobalVariable, (u32, u32)), PipelineError> {
    for (_, variable) in stage.module.global_variables.iter() {
        if variable.name.as_deref() != Some(name) {
            continue;
        }
        let binding = variable.binding.as_ref().ok_or_else(|| {
            PipelineError::Integration(format!("'{name}' has no resource binding"))
        })?;
        return Ok((variable, (binding.group, binding.binding)));
    }
    Err(PipelineError::Integration(format!(
        "fragment shader does not declare '{name}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_shaders_compile_and_validate() {
        compile_stages(VERTEX_SHADER, FRAGMENT_SHADER).expect("embedded shaders must compile");
    }

    #[test]
    fn interface_resolves_the_expected_slots() {
        let (vertex, fragment) = compile_stages(VERTEX_SHADER, FRAGMENT_SHADER).unwrap();
        let interface = ShaderInterface::resolve(&vertex, &fragment).unwrap();

        assert_eq!(interface.position_location, 0);
        assert_eq!(interface.normal_location, 1);
        assert_eq!(interface.texcoord_location, 2);
        assert_eq!((interface.scene_group, interface.scene_binding), (0, 0));
        assert_eq!((interface.texture_group, interface.texture_binding), (1, 0));
        assert_eq!((interface.sampler_group, interface.sampler_binding), (1, 1));
    }

    #[test]
    fn broken_fragment_reports_a_compile_error_with_diagnostics() {
        let broken = "#version 450\nvoid main() { undeclared = 1.0; }\n";
        let err = compile_stages(VERTEX_SHADER, broken).unwrap_err();
        match err {
            PipelineError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStageKind::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("expected a compile error, got {other}"),
        }
    }

    #[test]
    fn vertex_errors_surface_before_the_fragment_is_touched() {
        let broken = "#version 450\nvoid main() { nonsense }\n";
        let err = compile_stages(broken, broken).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Compile {
                stage: ShaderStageKind::Vertex,
                ..
            }
        ));
    }

    #[test]
    fn missing_attribute_is_an_integration_error() {
        let no_normal = r#"#version 450
layout(location = 0) in vec3 position;
layout(location = 2) in vec2 texcoord;
layout(location = 0) out vec2 v_texcoord;
layout(location = 1) out vec3 v_lighting;
layout(std140, set = 0, binding = 0) uniform SceneParams {
    mat4 projection;
    mat4 model_view;
    mat4 normal_matrix;
} scene;
void main() {
    gl_Position = scene.projection * scene.model_view * vec4(position, 1.0);
    v_texcoord = texcoord;
    v_lighting = vec3(1.0);
}
"#;
        let vertex = compile_stage(ShaderStageKind::Vertex, no_normal).unwrap();
        let fragment = compile_stage(ShaderStageKind::Fragment, FRAGMENT_SHADER).unwrap();
        let err = ShaderInterface::resolve(&vertex, &fragment).unwrap_err();
        match err {
            PipelineError::Integration(message) => assert!(message.contains("normal")),
            other => panic!("expected an integration error, got {other}"),
        }
    }

    #[test]
    fn missing_uniform_member_is_an_integration_error() {
        let no_normal_matrix = r#"#version 450
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 normal;
layout(location = 2) in vec2 texcoord;
layout(location = 0) out vec2 v_texcoord;
layout(location = 1) out vec3 v_lighting;
layout(std140, set = 0, binding = 0) uniform SceneParams {
    mat4 projection;
    mat4 model_view;
} scene;
void main() {
    gl_Position = scene.projection * scene.model_view * vec4(position, 1.0);
    v_texcoord = texcoord;
    v_lighting = vec3(length(normal));
}
"#;
        let vertex = compile_stage(ShaderStageKind::Vertex, no_normal_matrix).unwrap();
        let fragment = compile_stage(ShaderStageKind::Fragment, FRAGMENT_SHADER).unwrap();
        let err = ShaderInterface::resolve(&vertex, &fragment).unwrap_err();
        match err {
            PipelineError::Integration(message) => assert!(message.contains("normal_matrix")),
            other => panic!("expected an integration error, got {other}"),
        }
    }

    #[test]
    fn missing_sampler_is_an_integration_error() {
        let flat = r#"#version 450
layout(location = 0) in vec2 v_texcoord;
layout(location = 1) in vec3 v_lighting;
layout(location = 0) out vec4 out_color;
void main() {
    out_color = vec4(v_lighting, 1.0) * vec4(v_texcoord, 1.0, 1.0);
}
"#;
        let vertex = compile_stage(ShaderStageKind::Vertex, VERTEX_SHADER).unwrap();
        let fragment = compile_stage(ShaderStageKind::Fragment, flat).unwrap();
        let err = ShaderInterface::resolve(&vertex, &fragment).unwrap_err();
        assert!(matches!(err, PipelineError::Integration(_)));
    }
}
