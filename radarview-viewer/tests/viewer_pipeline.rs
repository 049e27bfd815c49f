use nalgebra::Vector3;
use radarview_core::{ColorBy, DetectionVertex, Point3f, RadarDetection, TriangleMesh};
use radarview_io::parse_sequence;
use radarview_scene::{BackendCall, RecordingBackend};
use radarview_viewer::{LoaderMessage, RadarCanvas, Ray, SequenceLoader, Settings, Timeline};
use std::time::Duration;

const TABLE: &str = "\
timestamp,sensor_id,range_sc,azimuth_sc,rcs,vr_compensated,x_cc,y_cc,uuid
1000,1,10,0,5,1,10,0,a
1000,2,20,0,-5,-1,0,20,b
2000,1,11,0,0,0,11,0,c
";

fn test_settings() -> Settings {
    Settings {
        detection_capacity: 8,
        circle_capacity: 16,
        num_circles: 2,
        ..Default::default()
    }
}

#[test]
fn test_frame_reaches_backend_once() {
    let sequence = parse_sequence("pipeline", TABLE.as_bytes()).unwrap();
    let mut backend = RecordingBackend::new();
    let mut canvas = RadarCanvas::new(&mut backend, test_settings(), 1.5).unwrap();
    let points = canvas.graph().node(canvas.points_node()).unwrap().buffer().unwrap();

    let frame = sequence.window_at(1000);
    canvas.update_scene(&frame.detections(), ColorBy::SensorId).unwrap();
    backend.clear();
    canvas.render(&mut backend).unwrap();

    let uploads = backend.uploads_to(points);
    assert_eq!(uploads.len(), 1);
    let vertices: Vec<DetectionVertex> = uploads[0]
        .chunks_exact(std::mem::size_of::<DetectionVertex>())
        .map(bytemuck::pod_read_unaligned)
        .collect();
    assert_eq!(vertices.len(), 8);
    assert_eq!(vertices[0].position, [10.0, 0.0, 0.0]);
    assert_eq!(vertices[1].position, [0.0, 20.0, 0.0]);
    assert_eq!(vertices[2].bg_color[3], 0.0);

    let draw_count = backend
        .calls()
        .iter()
        .filter(|call| matches!(call, BackendCall::Draw { .. }))
        .count();
    assert_eq!(draw_count, canvas.graph().len());
}

#[test]
fn test_scrubbing_and_picking() {
    let sequence = parse_sequence("pipeline", TABLE.as_bytes()).unwrap();
    let mut backend = RecordingBackend::new();
    let mut canvas = RadarCanvas::new(&mut backend, test_settings(), 1.0).unwrap();
    let mut timeline = Timeline::from_sequence(&sequence);

    timeline.step(1);
    let frame = sequence.window_at(timeline.current().unwrap());
    canvas.update_scene(&frame.detections(), ColorBy::Doppler).unwrap();
    assert_eq!(canvas.detections().len(), 2);
    assert!(timeline.status_line(frame.window_size_ms()).starts_with("Frame 1/1"));

    // detection "c" at car (11, 0) is drawn at world (0, 11) after the root rotation
    let ray = Ray::new(Point3f::new(0.0, 11.0, 50.0), Vector3::new(0.0, 0.0, -1.0));
    let hit = canvas.pick(&ray).unwrap();
    let selected = canvas.select(hit).unwrap().cloned();
    assert_eq!(selected.map(|d| d.uuid), Some("c".to_string()));
}

#[test]
fn test_car_mesh_is_drawn_after_detections() {
    let mut backend = RecordingBackend::new();
    let mut canvas = RadarCanvas::new(&mut backend, test_settings(), 1.0).unwrap();
    let mesh = TriangleMesh::from_vertices_and_faces(
        vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 0.0, 0.0), Point3f::new(0.0, 1.0, 0.0)],
        vec![[0, 1, 2]],
    );
    let car = canvas.set_car_mesh(&mut backend, &mesh).unwrap();
    canvas.update_scene(&[RadarDetection::default()], ColorBy::Uniform).unwrap();

    backend.clear();
    canvas.render(&mut backend).unwrap();
    let car_program = canvas.graph().node(car).unwrap().program().unwrap();
    assert_eq!(backend.draws().last(), Some(&car_program));
}

#[test]
fn test_background_loader() {
    let path = std::env::temp_dir().join(format!("radarview_loader_{}.csv", std::process::id()));
    std::fs::write(&path, TABLE).unwrap();

    let loader = SequenceLoader::new();
    loader.load(path.clone());
    match loader.wait(Duration::from_secs(10)) {
        Some(LoaderMessage::Loaded(sequence)) => assert_eq!(sequence.timestamps(), &[1000, 2000]),
        other => panic!("unexpected loader result: {:?}", other),
    }

    loader.load(path.with_extension("missing"));
    assert!(matches!(loader.wait(Duration::from_secs(10)), Some(LoaderMessage::Failed { .. })));

    let _ = std::fs::remove_file(path);
}
