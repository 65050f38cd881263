use std::borrow::Cow;

use anyhow::{bail, Result};
use material::{RESOLUTION_PARAMETER, TIME_PARAMETER};
use wgpu::naga::ShaderStage;

/// Fragment shader used when the caller does not supply one.
pub const DEFAULT_FRAGMENT: &str = include_str!("../shaders/default.frag");

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Wraps the user shader with the feed prelude and compiles it as GLSL.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    source: &str,
) -> Result<wgpu::ShaderModule> {
    let wrapped = wrap_fragment(source)?;
    tracing::trace!(bytes = wrapped.len(), "wrapped fragment shader");

    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("toyfeed fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    }))
}

/// Produces a self-contained GLSL fragment shader from `mainImage` code.
///
/// 1. Drop `#version` and any user declarations of the fed uniforms so the
///    prelude's uniform block is the only definition.
/// 2. Prepend [`HEADER`], which declares `_Resolution`/`_MyTime` in a std140
///    block matching `UniformLayout::shadertoy()` and aliases the ShaderToy
///    names onto them.
/// 3. Append [`FOOTER`], which flips to a bottom-left origin and calls
///    `mainImage`.
pub(crate) fn wrap_fragment(source: &str) -> Result<String> {
    if !source.contains("mainImage") {
        bail!("shader does not define mainImage(out vec4, in vec2)");
    }

    let mut sanitized = String::with_capacity(source.len());
    let mut skipped_version = false;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if !skipped_version && trimmed.starts_with("#version") {
            skipped_version = true;
            continue;
        }
        if redeclares_fed_uniform(trimmed) {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }

    Ok(format!("{HEADER}\n#line 1\n{sanitized}{FOOTER}"))
}

/// True when `line` is a `uniform` declaration naming one of the fed
/// parameters or their ShaderToy aliases.
fn redeclares_fed_uniform(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("uniform") else {
        return false;
    };
    if !rest.starts_with(char::is_whitespace) {
        return false;
    }
    let declaration = rest.split("//").next().unwrap_or_default();
    let declaration = declaration.split(';').next().unwrap_or_default();
    declaration
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| token.split('[').next().unwrap_or_default())
        .any(|token| {
            [TIME_PARAMETER, RESOLUTION_PARAMETER, "iTime", "iResolution"].contains(&token)
        })
}

/// GLSL prologue injected ahead of every fragment shader.
///
/// Member order and types must match `UniformLayout::shadertoy()`.
const HEADER: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform FeedParams {
    vec4 _Resolution;
    float _MyTime;
};

#define iResolution vec3(_Resolution.xy, 1.0)
#define iTime _MyTime
";

const FOOTER: &str = r"
void main() {
    vec2 fragCoord = vec2(gl_FragCoord.x, _Resolution.y - gl_FragCoord.y);
    vec4 color = vec4(0.0);
    mainImage(color, fragCoord);
    outColor = vec4(color.rgb, 1.0);
}
";

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_strips_redeclared_uniforms() {
        let source = r#"
            #version 300 es
            uniform float iTime;
            uniform vec3 iResolution;
            uniform float _MyTime;
            uniform vec4 _Resolution;
            void mainImage(out vec4 fragColor, in vec2 fragCoord) {
                fragColor = vec4(fragCoord / _Resolution.xy, sin(_MyTime), 1.0);
            }
        "#;

        let wrapped = wrap_fragment(source).unwrap();
        assert!(!wrapped.contains("uniform float iTime"));
        assert!(!wrapped.contains("uniform vec3 iResolution"));
        assert!(!wrapped.contains("uniform float _MyTime"));
        assert!(!wrapped.contains("#version 300 es"));
        assert_eq!(wrapped.matches("#version 450").count(), 1);
        assert!(wrapped.contains("mainImage(color, fragCoord)"));
    }

    #[test]
    fn wrap_keeps_uniforms_that_only_mention_fed_names() {
        let source = r#"
uniform float iTimeDelta;
uniform sampler2D tex; // uses iTime
uniform vec4 _ResolutionScale;
uniform highp float iTime;
uniform vec3 iResolution[1];
void mainImage(out vec4 fragColor, in vec2 fragCoord) {
    fragColor = texture(tex, fragCoord) * iTimeDelta;
}
"#;

        let wrapped = wrap_fragment(source).unwrap();
        assert!(wrapped.contains("uniform float iTimeDelta;"));
        assert!(wrapped.contains("uniform sampler2D tex; // uses iTime"));
        assert!(wrapped.contains("uniform vec4 _ResolutionScale;"));
        assert!(!wrapped.contains("uniform highp float iTime;"));
        assert!(!wrapped.contains("uniform vec3 iResolution[1];"));
    }

    #[test]
    fn prelude_declares_fed_parameters_in_layout_order() {
        let resolution = HEADER.find("vec4 _Resolution;").unwrap();
        let time = HEADER.find("float _MyTime;").unwrap();
        assert!(resolution < time);
    }

    #[test]
    fn wrap_rejects_shader_without_entry_point() {
        assert!(wrap_fragment("void main() {}").is_err());
    }

    #[test]
    fn default_fragment_wraps() {
        let wrapped = wrap_fragment(DEFAULT_FRAGMENT).unwrap();
        assert!(wrapped.contains("_MyTime"));
    }
}
