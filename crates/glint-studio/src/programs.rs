//! Demo programs.

use glint_engine::pipeline::{AttributeConfig, DrawMode, PanelSpec, PassConfig, TargetConfig};

const TRIANGLE_VS: &str = r#"#version 450
layout(location = 0) in vec2 position;
layout(location = 1) in vec3 color;

layout(location = 0) out vec3 vcolor;

layout(set = 0, binding = 0) uniform Globals {
    vec2 resolution;
    vec2 mouse;
    float time;
    float spin;
    float scale;
};

void main() {
    float a = time * spin;
    mat2 r = mat2(cos(a), sin(a), -sin(a), cos(a));
    vec2 p = r * position * scale;
    p.x *= resolution.y / resolution.x;
    vcolor = color;
    gl_Position = vec4(p + (mouse - 0.5) * 0.5, 0.0, 1.0);
}
"#;

const TRIANGLE_FS: &str = r#"#version 450
layout(location = 0) in vec3 vcolor;

layout(location = 0) out vec4 frag_color;

void main() {
    frag_color = vec4(vcolor, 1.0);
}
"#;

const ECHO_FS: &str = r#"#version 450
layout(location = 0) in vec2 vtex;

layout(location = 0) out vec4 frag_color;

layout(set = 0, binding = 0) uniform Globals {
    vec2 resolution;
    vec2 mouse;
    float time;
    float zoom;
    float fade;
};

layout(set = 0, binding = 1) uniform texture2D scene;
layout(set = 0, binding = 2) uniform sampler scene_sampler;

void main() {
    vec3 acc = vec3(0.0);
    float w = 1.0;
    float total = 0.0;
    for (int i = 1; i <= 6; i++) {
        vec2 uv = (vtex - 0.5) / pow(zoom, float(i)) + 0.5;
        acc += w * texture(sampler2D(scene, scene_sampler), uv).rgb;
        total += w;
        w *= fade;
    }
    frag_color = vec4(acc / total, 0.6);
}
"#;

const BLUR_FS: &str = r#"#version 450
layout(location = 0) in vec2 vtex;

layout(location = 0) out vec4 frag_color;

layout(set = 0, binding = 0) uniform Globals {
    vec2 resolution;
    vec2 mouse;
    float time;
    float radius;
};

layout(set = 0, binding = 1) uniform texture2D echo;
layout(set = 0, binding = 2) uniform sampler echo_sampler;

void main() {
    vec2 px = radius / resolution;
    vec3 c = vec3(0.0);
    for (int x = -2; x <= 2; x++) {
        for (int y = -2; y <= 2; y++) {
            c += texture(sampler2D(echo, echo_sampler), vtex + vec2(float(x), float(y)) * px).rgb;
        }
    }
    frag_color = vec4(c / 25.0, 1.0);
}
"#;

/// The stock program: default quad and animated gradient.
pub fn gradient() -> PassConfig {
    PassConfig::new()
        .name("gradient")
        .panel(PanelSpec::new().title("gradient"))
}

/// A spinning triangle rendered multisampled, echoed into a texture target,
/// with an optional blur over the echo.
pub fn feedback() -> PassConfig {
    let triangle = PassConfig::new()
        .name("feedback")
        .attribute("position", AttributeConfig::new(2, [0.0, 0.8, -0.7, -0.4, 0.7, -0.4]))
        .attribute("color", AttributeConfig::new(3, [1.0, 0.3, 0.2, 0.2, 1.0, 0.4, 0.3, 0.4, 1.0]))
        .uniform("spin", 0.8_f32)
        .uniform("scale", 0.9_f32)
        .vertex_shader(TRIANGLE_VS)
        .fragment_shader(TRIANGLE_FS)
        .draw_mode(DrawMode::Triangles)
        .target(TargetConfig::resolve().sampled_as("scene"))
        .clear_color([0.02, 0.02, 0.05, 1.0])
        .panel(
            PanelSpec::new()
                .title("feedback")
                .open(true)
                .param("spin", -4.0, 4.0, 0.01)
                .param("scale", 0.1, 1.5, 0.01),
        );

    let echo = PassConfig::new()
        .name("echo")
        .sample_target("scene")
        .uniform("zoom", 1.15_f32)
        .uniform("fade", 0.7_f32)
        .fragment_shader(ECHO_FS)
        .target(TargetConfig::texture().sampled_as("echo"))
        .panel(
            PanelSpec::new()
                .title("echo")
                .param("zoom", 1.0, 2.0, 0.01)
                .param("fade", 0.0, 1.0, 0.01),
        );

    let blur = PassConfig::new()
        .name("blur")
        .sample_target("echo")
        .uniform("radius", 1.5_f32)
        .fragment_shader(BLUR_FS)
        .enabled(false)
        .panel(PanelSpec::new().title("blur").with_switch().param("radius", 0.0, 8.0, 0.1));

    triangle.chain_pass(echo).chain_pass(blur)
}
