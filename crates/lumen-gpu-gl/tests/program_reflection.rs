mod common;

use lumen_gpu::{stream, BindingSet, ResourceType, Semantic, INVALID_LOCATION};
use lumen_gpu_gl::headless::HeadlessGl;
use lumen_gpu_gl::{GlBackend, GlDriver, GlError};
use pretty_assertions::assert_eq;

const MODEL_VS: &str = r#"
in vec3 inNormal;
in vec4 inTexCoord0;
in vec4 inPosition;
in ivec2 _drawCallInfo;

uniform samplerBuffer transformObjectBuffer;

uniform transformCameraBuffer {
    mat4 view;
    mat4 projection;
    vec4 eye;
};

void main() {
    gl_Position = inPosition;
}
"#;

const MODEL_FS: &str = r#"
uniform materialBuffer {
    vec4 albedo;
    vec4 emissive;
};

uniform lightBuffer {
    vec4 lightColor[4];
};

uniform sampler2D albedoMap;
uniform sampler2DShadow shadowMap;
uniform vec4 tint;
uniform float fade[2];

out vec4 fragColor;

void main() {
    fragColor = tint;
}
"#;

#[test]
fn model_program_interface() {
    common::init_tracing();

    let mut backend = GlBackend::new(HeadlessGl::new());
    let mut fixture = common::program(MODEL_VS, MODEL_FS);
    let bindings = BindingSet::new()
        .with("materialBuffer", 3)
        .with("shadowMap", 7);

    backend.make_program(&mut fixture.program, &bindings).unwrap();
    let program = &fixture.program;

    let inputs: Vec<_> = program
        .inputs()
        .iter()
        .map(|s| (s.name.as_str(), s.location))
        .collect();
    assert_eq!(
        inputs,
        vec![
            ("_drawCallInfo", stream::DRAW_CALL_INFO as i32),
            ("inNormal", stream::NORMAL as i32),
            ("inPosition", stream::POSITION as i32),
            ("inTexCoord0", stream::TEXCOORD0 as i32),
        ]
    );

    let buffers: Vec<_> = program
        .buffers()
        .iter()
        .map(|s| (s.name.as_str(), s.location))
        .collect();
    assert_eq!(
        buffers,
        vec![
            ("lightBuffer", 0),
            ("materialBuffer", 3),
            ("transformCameraBuffer", stream::TRANSFORM_CAMERA_SLOT as i32),
        ]
    );

    let uniforms: Vec<_> = program.uniforms().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(uniforms, vec!["fade", "tint", "transformObjectBuffer"]);
    assert!(program.uniforms().get("transformObjectBuffer").unwrap().element.is_unrecognized());

    assert_eq!(program.textures().find_location("albedoMap"), 0);
    let shadow = program.samplers().get("shadowMap").unwrap();
    assert_eq!(shadow.location, 7);
    assert_eq!(shadow.resource, ResourceType::Texture2D);
    assert_eq!(shadow.element.semantic(), Some(Semantic::SamplerShadow));
    assert!(program.outputs().is_empty());

    let object = backend.gpu_object(&program.id()).unwrap();
    let linked = object.program_version(0).unwrap();
    assert_eq!(linked.transform_object_slot, Some(stream::TRANSFORM_OBJECT_SLOT));
    assert_eq!(linked.transform_camera_slot, Some(stream::TRANSFORM_CAMERA_SLOT));

    let gl = backend.driver();
    let location = gl
        .uniform_location(linked.program, "transformObjectBuffer")
        .unwrap();
    assert_eq!(
        gl.uniform_i32(linked.program, location),
        stream::TRANSFORM_OBJECT_SLOT as i32
    );
}

#[test]
fn reflecting_twice_reuses_the_linked_program() {
    let mut backend = GlBackend::new(HeadlessGl::new());
    let mut fixture = common::program(MODEL_VS, MODEL_FS);

    backend
        .make_program(&mut fixture.program, &BindingSet::new())
        .unwrap();
    let first = fixture.program.interface().clone();
    let compiles = backend.driver().compile_calls();
    let links = backend.driver().link_calls();

    backend
        .make_program(&mut fixture.program, &BindingSet::new())
        .unwrap();

    assert_eq!(fixture.program.interface(), &first);
    assert_eq!(backend.driver().compile_calls(), compiles);
    assert_eq!(backend.driver().link_calls(), links);
    assert_eq!(backend.stats().cache_hits, 1);
}

#[test]
fn stages_are_shared_between_programs() {
    let mut backend = GlBackend::new(HeadlessGl::new());
    let fixture = common::program(MODEL_VS, MODEL_FS);
    let mut other = lumen_gpu::Shader::new_program(vec![
        fixture.vertex.clone(),
        std::sync::Arc::new(lumen_gpu::Shader::new_pixel("uniform vec4 tint;\nvoid main() {}\n")),
    ]);
    let mut program = fixture.program;

    backend.make_program(&mut program, &BindingSet::new()).unwrap();
    backend.make_program(&mut other, &BindingSet::new()).unwrap();

    // Vertex stage compiled once, each pixel stage once.
    assert_eq!(backend.driver().compile_calls(), 3);
    assert_eq!(other.uniforms().len(), 2);
}

#[test]
fn link_failure_caches_nothing_and_retries() {
    common::init_tracing();

    let mut backend = GlBackend::new(HeadlessGl::new());
    let mut fixture = common::program(
        MODEL_VS,
        "#link_error 'shade' : no matching overloaded function found\nvoid main() {}\n",
    );

    for attempt in 1..=2 {
        let err = backend
            .make_program(&mut fixture.program, &BindingSet::new())
            .unwrap_err();
        assert!(matches!(err, GlError::Link { .. }), "{err:?}");
        assert!(backend.gpu_object(&fixture.program.id()).is_none());
        assert_eq!(backend.driver().live_programs(), 0);
        assert_eq!(backend.stats().build_failures, attempt);
    }

    // The stages themselves compiled fine and stay cached.
    assert!(backend.gpu_object(&fixture.vertex.id()).is_some());
    assert!(backend.gpu_object(&fixture.pixel.id()).is_some());
    assert_eq!(backend.driver().compile_calls(), 2);
    assert!(fixture.program.uniforms().is_empty());
}

#[test]
fn exhausted_uniform_buffer_bindings() {
    let mut gl = HeadlessGl::new();
    gl.set_max_uniform_buffer_bindings(1);
    let mut backend = GlBackend::new(gl);
    let mut fixture = common::program(
        "uniform a { vec4 x; };\nvoid main() {}\n",
        "uniform b { vec4 y; };\nvoid main() {}\n",
    );

    backend
        .make_program(&mut fixture.program, &BindingSet::new())
        .unwrap();

    assert_eq!(fixture.program.buffers().find_location("a"), 0);
    assert_eq!(fixture.program.buffers().find_location("b"), INVALID_LOCATION);
}

#[test]
fn automatic_bindings_never_collide_with_the_camera_buffer() {
    let mut vs: String = (0..16)
        .map(|i| format!("uniform b{i:02} {{ vec4 v{i:02}; }};\n"))
        .collect();
    vs.push_str("uniform transformCameraBuffer { mat4 view; };\nvoid main() {}\n");

    let mut backend = GlBackend::new(HeadlessGl::new());
    let mut fixture = common::program(&vs, "void main() {}\n");
    backend
        .make_program(&mut fixture.program, &BindingSet::new())
        .unwrap();

    let buffers = fixture.program.buffers();
    assert_eq!(buffers.len(), 17);
    assert_eq!(
        buffers.find_location("transformCameraBuffer"),
        stream::TRANSFORM_CAMERA_SLOT as i32
    );
    let mut bindings: Vec<_> = buffers.iter().map(|s| s.location).collect();
    bindings.sort_unstable();
    bindings.dedup();
    assert_eq!(bindings.len(), 17, "{bindings:?}");
    assert_eq!(buffers.find_location("b15"), 16);
}

#[test]
fn clear_releases_every_object() {
    let mut backend = GlBackend::new(HeadlessGl::new());
    let mut fixture = common::program(MODEL_VS, MODEL_FS);
    backend
        .make_program(&mut fixture.program, &BindingSet::new())
        .unwrap();
    assert_eq!(backend.stats().cached_objects, 3);

    backend.clear();

    let gl = backend.driver();
    assert_eq!(gl.live_shaders(), 0);
    assert_eq!(gl.live_programs(), 0);
    assert_eq!(gl.invalid_deletes(), 0);
    assert_eq!(backend.stats().cached_objects, 0);
}
