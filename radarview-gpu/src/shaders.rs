//! WGSL shader library
//!
//! Every stage declares the same per-program uniform block at group 0,
//! binding 0. Vertex stages use the `vs_main` entry point, fragment stages
//! `fs_main`.

/// Uniform block shared by all programs
pub const UNIFORMS: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    scale: f32,
    linewidth: f32,
    antialias: f32,
    _pad0: f32,
    viewport: vec2<f32>,
    _pad1: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;
"#;

/// Detection markers: one instanced quad per detection
pub const DETECTION_VERTEX: &str = r#"
struct DetectionInput {
    @location(0) position: vec3<f32>,
    @location(1) bg_color: vec4<f32>,
    @location(2) fg_color: vec4<f32>,
    @location(3) size: f32,
    @location(4) selected: f32,
};

struct DetectionOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) bg_color: vec4<f32>,
    @location(2) fg_color: vec4<f32>,
    @location(3) size: f32,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, input: DetectionInput) -> DetectionOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vertex_index];

    // Marker diameter in pixels, plus room for the outline and its falloff
    let size = input.size * u.scale;
    let extent = size + 2.0 * (u.linewidth + 1.5 * u.antialias);

    let clip = u.projection * u.view * u.model * vec4<f32>(input.position, 1.0);
    let offset = corner * extent / max(u.viewport, vec2<f32>(1.0, 1.0)) * clip.w;

    var out: DetectionOutput;
    out.clip_position = vec4<f32>(clip.xy + offset, clip.z, clip.w);
    out.local = corner * extent * 0.5;
    out.bg_color = input.bg_color;
    out.fg_color = input.fg_color;
    if (input.selected > 0.5) {
        out.fg_color = vec4<f32>(1.0, 1.0, 0.2, input.bg_color.a);
    }
    out.size = size;
    return out;
}
"#;

/// Filled disc with an antialiased outline
pub const DETECTION_FRAGMENT: &str = r#"
struct DetectionOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) bg_color: vec4<f32>,
    @location(2) fg_color: vec4<f32>,
    @location(3) size: f32,
};

@fragment
fn fs_main(input: DetectionOutput) -> @location(0) vec4<f32> {
    let antialias = max(u.antialias, 0.001);
    let t = 0.5 * u.linewidth - antialias;
    let r = length(input.local) - 0.5 * input.size;
    let d = abs(r) - t;

    if (r > 0.5 * u.linewidth + antialias) {
        discard;
    }
    if (d < 0.0) {
        return input.fg_color;
    }

    var alpha = d / antialias;
    alpha = exp(-alpha * alpha);
    if (r > 0.0) {
        return vec4<f32>(input.fg_color.rgb, alpha * input.fg_color.a);
    }
    return mix(input.bg_color, input.fg_color, alpha);
}
"#;

pub const LINE_VERTEX: &str = r#"
struct LineInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(input: LineInput) -> LineOutput {
    var out: LineOutput;
    out.clip_position = u.projection * u.view * u.model * vec4<f32>(input.position, 1.0);
    out.color = input.color;
    return out;
}
"#;

pub const LINE_FRAGMENT: &str = r#"
struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@fragment
fn fs_main(input: LineOutput) -> @location(0) vec4<f32> {
    if (input.color.a <= 0.0) {
        discard;
    }
    return input.color;
}
"#;

/// Flat shaded meshes such as the vehicle model
pub const MODEL_VERTEX: &str = r#"
struct ModelInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

struct ModelOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(input: ModelInput) -> ModelOutput {
    var out: ModelOutput;
    out.clip_position = u.projection * u.view * u.model * vec4<f32>(input.position, 1.0);
    out.normal = (u.model * vec4<f32>(input.normal, 0.0)).xyz;
    out.color = input.color;
    return out;
}
"#;

pub const MODEL_FRAGMENT: &str = r#"
struct ModelOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@fragment
fn fs_main(input: ModelOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(0.3, 0.5, 1.0));
    var light = 0.4;
    let len = length(input.normal);
    if (len > 0.0) {
        light = max(0.2, abs(dot(input.normal / len, light_dir)));
    }
    return vec4<f32>(input.color.rgb * light, input.color.a);
}
"#;

/// Complete WGSL source for the stage called `name`, uniform block included
pub fn shader_source(name: &str) -> Option<String> {
    let body = match name {
        "detection_vertex" => DETECTION_VERTEX,
        "detection_fragment" => DETECTION_FRAGMENT,
        "line_vertex" => LINE_VERTEX,
        "line_fragment" => LINE_FRAGMENT,
        "model_vertex" => MODEL_VERTEX,
        "model_fragment" => MODEL_FRAGMENT,
        _ => return None,
    };
    Some(format!("{}{}", UNIFORMS, body))
}
