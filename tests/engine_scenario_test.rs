use gpu_stress::{
    EngineState, LoadLevel, Renderer,
    config::{BACKGROUND, BASELINE_SCALE, CUBE_VERTEX_COUNT, MAX_INSTANCES, PixelFormatRequest, TEXTURE_HEIGHT, TEXTURE_WIDTH},
    data_structures::mesh::CUBE_VERTICES,
    gpu::{BufferKind, ShaderStage, VertexStream},
    transform::scale_at,
};

use crate::common::test_utils::{
    CYCLES_PER_SECOND, ManualCounter, RecordingGpu, blank_atlas, millisecond_timer,
};

mod common;

fn ready_renderer() -> (
    Renderer<RecordingGpu, ManualCounter>,
    std::rc::Rc<std::cell::RefCell<common::test_utils::GpuLog>>,
    ManualCounter,
) {
    let (gpu, log) = RecordingGpu::new();
    let (counter, timer) = millisecond_timer();
    let mut renderer = Renderer::new(gpu, timer);
    renderer
        .init(&PixelFormatRequest::default(), &blank_atlas())
        .expect("init with a recording gpu succeeds");
    (renderer, log, counter)
}

#[test]
fn init_creates_every_resource() {
    let (renderer, log, _) = ready_renderer();
    assert_eq!(renderer.state(), EngineState::Ready);

    let log = log.borrow();
    assert_eq!(log.viewport, Some((990, 750)));
    assert_eq!(log.vertex_arrays_created, 1);
    assert_eq!(log.textures_created, vec![(TEXTURE_WIDTH, TEXTURE_HEIGHT)]);
    assert_eq!(log.texture_bytes, blank_atlas().len());
    assert_eq!(
        log.buffers_created,
        vec![
            (BufferKind::StaticVertices, 36 * 20),
            (BufferKind::DynamicInstances, MAX_INSTANCES as u64 * 4),
        ]
    );
    // Both shader objects are released once linked.
    assert_eq!(log.deleted_shaders.len(), 2);

    let streams: Vec<VertexStream> = log.streams.iter().map(|(_, _, s)| *s).collect();
    assert_eq!(streams, vec![VertexStream::Mesh, VertexStream::InstanceScale]);

    let (_, mesh) = &log.uploads[0];
    assert_eq!(mesh.as_slice(), bytemuck::cast_slice::<_, u8>(&CUBE_VERTICES));
    let (_, instances) = &log.uploads[1];
    let scales: &[f32] = bytemuck::cast_slice(instances);
    assert_eq!(scales.len(), MAX_INSTANCES as usize);
    assert!(scales.iter().all(|&s| s == BASELINE_SCALE));
}

#[test]
fn init_writes_adapter_info_and_labels() {
    let (renderer, _, _) = ready_renderer();
    let status = renderer.status();
    let top = status.row(3).unwrap();
    let bottom = status.row(0).unwrap();
    assert!(top.starts_with(" Test vendor"), "{top:?}");
    assert!(bottom.starts_with(" GLSL 450"), "{bottom:?}");
}

#[test]
fn one_frame_at_minimal_load() {
    let (mut renderer, log, _) = ready_renderer();
    log.borrow_mut().events.clear();

    renderer.draw(LoadLevel::Minimal, true);

    let log = log.borrow();
    assert_eq!(log.draws.len(), 1);
    let (_, vertices, instances) = log.draws[0];
    assert_eq!(vertices, CUBE_VERTEX_COUNT);
    assert_eq!(instances, 1000);
    assert_eq!(log.writes.len(), 1);
    assert_eq!(log.writes[0].1.len(), 4000);
    assert_eq!(log.depth_test, Some(true));
    assert_eq!(log.clear, Some(BACKGROUND));
    assert_eq!(log.presents, 1);
    assert_eq!(
        log.events,
        vec!["clear", "set_model_matrix", "write_buffer", "draw_instanced", "present", "set_status_text"]
    );
}

#[test]
fn every_load_level_uploads_four_bytes_per_instance() {
    let (mut renderer, log, _) = ready_renderer();
    for level in LoadLevel::ALL {
        renderer.draw(level, false);
        let log = log.borrow();
        let (_, bytes) = log.writes.last().unwrap();
        assert_eq!(bytes.len() as u64, level.instances() as u64 * 4, "{level:?}");
        assert_eq!(bytes.len() as u64, level.upload_bytes());
        assert_eq!(log.draws.last().unwrap().2, level.instances());
    }
}

#[test]
fn model_matrix_is_identity_at_start() {
    let (mut renderer, log, _) = ready_renderer();
    renderer.draw(LoadLevel::Minimal, true);

    let identity: [[f32; 4]; 4] = cgmath::Matrix4::from_scale(1.0).into();
    assert_eq!(log.borrow().model, Some(identity));
}

#[test]
fn instance_scale_follows_application_time() {
    let (mut renderer, log, counter) = ready_renderer();
    counter.advance(2 * CYCLES_PER_SECOND);
    renderer.draw(LoadLevel::Light, true);

    let expected = scale_at(2.0);
    let log = log.borrow();
    let scales: &[f32] = bytemuck::cast_slice(&log.writes[0].1);
    assert_eq!(scales.len(), 30_000);
    assert!(scales.iter().all(|&s| s == expected));
}

#[test]
fn status_text_shows_the_load_and_depth_flag() {
    let (mut renderer, log, counter) = ready_renderer();
    counter.advance(10);
    renderer.draw(LoadLevel::Moderate, false);

    let row = renderer.status().row(4).unwrap();
    assert!(row[36..].starts_with("100000 "), "{row:?}");
    assert!(row[82..].starts_with("OFF"), "{row:?}");

    let words = log.borrow().status_text.clone().unwrap();
    assert_eq!(words.as_slice(), renderer.status().pack().as_slice());
}

#[test]
fn missing_entry_point_stops_before_any_resource() {
    let (mut gpu, log) = RecordingGpu::new();
    gpu.missing_entry_point = Some("vertex_attrib_divisor");
    let (_, timer) = millisecond_timer();
    let mut renderer = Renderer::new(gpu, timer);

    let err = renderer
        .init(&PixelFormatRequest::default(), &blank_atlas())
        .unwrap_err();
    assert_eq!(err.code(), 0x105);
    assert_eq!(renderer.state(), EngineState::Failed);
    {
        let log = log.borrow();
        assert!(log.buffers_created.is_empty());
        assert!(log.textures_created.is_empty());
        assert_eq!(log.vertex_arrays_created, 0);
    }

    drop(renderer);
    let log = log.borrow();
    assert!(log.context_destroyed);
    assert!(log.deleted_buffers.is_empty());
    assert!(log.deleted_vertex_arrays.is_empty());
}

#[test]
fn shader_failures_carry_the_driver_log() {
    for (stage, code) in [(ShaderStage::Vertex, 0x108), (ShaderStage::Fragment, 0x10B)] {
        let (mut gpu, _) = RecordingGpu::new();
        gpu.failing_stage = Some(stage);
        let (_, timer) = millisecond_timer();
        let mut renderer = Renderer::new(gpu, timer);

        let err = renderer
            .init(&PixelFormatRequest::default(), &blank_atlas())
            .unwrap_err();
        assert_eq!(err.code(), code);
        assert_eq!(err.diagnostics(), Some("0:1: syntax error"));
    }
}

#[test]
fn link_failure_carries_the_driver_log() {
    let (mut gpu, _) = RecordingGpu::new();
    gpu.link_error = Some("error: varying v_tex not written".to_owned());
    let (_, timer) = millisecond_timer();
    let mut renderer = Renderer::new(gpu, timer);

    let err = renderer
        .init(&PixelFormatRequest::default(), &blank_atlas())
        .unwrap_err();
    assert_eq!(err.code(), 0x10E);
    assert_eq!(err.diagnostics(), Some("error: varying v_tex not written"));
}

#[test]
fn texture_failure_releases_what_was_created() {
    let (mut gpu, log) = RecordingGpu::new();
    gpu.fail_texture = true;
    let (_, timer) = millisecond_timer();
    let mut renderer = Renderer::new(gpu, timer);

    let err = renderer
        .init(&PixelFormatRequest::default(), &blank_atlas())
        .unwrap_err();
    assert_eq!(err.code(), 0x118);

    drop(renderer);
    let log = log.borrow();
    assert_eq!(log.deleted_vertex_arrays.len(), 1);
    assert_eq!(log.deleted_buffers.len(), 1);
    assert!(log.context_destroyed);
}

#[test]
fn draw_before_init_does_nothing() {
    let (gpu, log) = RecordingGpu::new();
    let (_, timer) = millisecond_timer();
    let mut renderer = Renderer::new(gpu, timer);

    renderer.draw(LoadLevel::Maximum, true);

    assert_eq!(renderer.state(), EngineState::Uninitialized);
    assert!(log.borrow().events.is_empty());
}

#[test]
fn drop_releases_the_vertex_array_both_buffers_and_the_context() {
    let (renderer, log, _) = ready_renderer();
    drop(renderer);

    let log = log.borrow();
    assert_eq!(log.deleted_vertex_arrays.len(), 1);
    assert_eq!(log.deleted_buffers.len(), 2);
    assert!(log.context_destroyed);
}

#[test]
fn resize_ignores_empty_surfaces() {
    let (mut renderer, log, _) = ready_renderer();
    renderer.resize(0, 600);
    assert_eq!(log.borrow().viewport, Some((990, 750)));
    renderer.resize(1280, 720);
    assert_eq!(log.borrow().viewport, Some((1280, 720)));
}

#[test]
fn failed_init_is_terminal() {
    let (mut gpu, log) = RecordingGpu::new();
    gpu.fail_texture = true;
    let (_, timer) = millisecond_timer();
    let mut renderer = Renderer::new(gpu, timer);

    renderer
        .init(&PixelFormatRequest::default(), &blank_atlas())
        .unwrap_err();
    assert_eq!(renderer.state(), EngineState::Failed);
    let events = log.borrow().events.len();
    let buffers = log.borrow().buffers_created.len();

    renderer
        .init(&PixelFormatRequest::default(), &blank_atlas())
        .unwrap();
    renderer.draw(LoadLevel::Minimal, true);
    assert_eq!(renderer.state(), EngineState::Failed);
    assert_eq!(log.borrow().events.len(), events);
    assert_eq!(log.borrow().buffers_created.len(), buffers);

    drop(renderer);
    let log = log.borrow();
    assert_eq!(log.deleted_vertex_arrays.len(), 1);
    assert_eq!(log.deleted_buffers.len(), buffers);
}

#[test]
fn second_init_is_ignored() {
    let (mut renderer, log, _) = ready_renderer();
    let created = log.borrow().buffers_created.len();
    renderer
        .init(&PixelFormatRequest::default(), &blank_atlas())
        .unwrap();
    assert_eq!(log.borrow().buffers_created.len(), created);
}
