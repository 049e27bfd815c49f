//! Render a whole sequence without a window, against the recording backend

use crate::canvas::RadarCanvas;
use crate::settings::Settings;
use crate::timeline::Timeline;
use radarview_core::{Result, TriangleMesh};
use radarview_io::Sequence;
use radarview_scene::RecordingBackend;

/// Totals gathered while rendering every frame of a sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessReport {
    pub frames: usize,
    pub detections: usize,
    pub uploads: usize,
    pub draws: usize,
    pub nodes: usize,
}

/// Step through every frame of `sequence`, updating and drawing the scene each time
pub fn run_headless(settings: Settings, sequence: &Sequence, mesh: Option<&TriangleMesh>) -> Result<HeadlessReport> {
    let mut backend = RecordingBackend::new();
    let aspect_ratio = settings.window_width as f32 / settings.window_height.max(1) as f32;
    let mut canvas = RadarCanvas::new(&mut backend, settings, aspect_ratio)?;
    if let Some(mesh) = mesh {
        canvas.set_car_mesh(&mut backend, mesh)?;
    }
    let color_by = canvas.color_by();

    let mut timeline = Timeline::from_sequence(sequence);
    let mut report = HeadlessReport { nodes: canvas.graph().len(), ..Default::default() };

    for index in 0..timeline.len() {
        timeline.seek(index);
        let Some(timestamp) = timeline.current() else { break };
        let window = sequence.window_at(timestamp);
        let detections = window.detections();

        canvas.update_scene(&detections, color_by)?;
        canvas.render(&mut backend)?;

        report.frames += 1;
        report.detections += detections.len();
        report.uploads += backend.upload_count();
        report.draws += backend.draws().len();
        backend.clear();

        log::debug!("{}", timeline.status_line(window.window_size_ms()));
    }

    canvas.release(&mut backend);
    log::info!(
        "Rendered {} frames of '{}': {} detections, {} uploads, {} draw calls",
        report.frames,
        sequence.name(),
        report.detections,
        report.uploads,
        report.draws
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use radarview_io::parse_sequence;

    #[test]
    fn test_every_frame_drawn() {
        let table = "timestamp,sensor_id,range_sc,azimuth_sc,rcs,vr_compensated\n\
                     10,1,5,0,1,0\n10,1,6,0,2,0\n20,2,7,0,1,1\n30,1,8,0,1,-1\n";
        let sequence = parse_sequence("drive", table.as_bytes()).unwrap();
        let settings = Settings { detection_capacity: 16, circle_capacity: 8, num_circles: 1, ..Default::default() };

        let report = run_headless(settings, &sequence, None).unwrap();
        assert_eq!(report.frames, 3);
        // frame windows hold 2, 3 and 2 detections
        assert_eq!(report.detections, 7);
        // root, grid, two circles, points, lines: every node uploads and draws each frame
        assert_eq!(report.nodes, 6);
        assert_eq!(report.uploads, 18);
        assert_eq!(report.draws, 18);
    }
}
