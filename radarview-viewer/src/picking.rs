//! Detection picking by ray casting against the world positions of the points

use crate::camera::Ray;
use crate::canvas::RadarCanvas;
use radarview_core::{Error, Point3f, RadarDetection, Result};

/// Index of the point closest to `ray`, if any lies within `radius`
pub fn nearest_to_ray<I>(points: I, ray: &Ray, radius: f32) -> Option<usize>
where
    I: IntoIterator<Item = Point3f>,
{
    points
        .into_iter()
        .enumerate()
        .map(|(i, p)| (i, ray.distance_to_point(&p)))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

impl RadarCanvas {
    /// The detection of the current frame hit by `ray`, using the configured pick radius
    pub fn pick(&mut self, ray: &Ray) -> Result<Option<usize>> {
        let radius = self.settings().pick_radius;
        let world = self.graph.compute_world_transform(self.points)?;
        let node = self.graph.node(self.points)?;
        let vertices = node
            .geometry()
            .detections()
            .ok_or_else(|| Error::InvalidData("detection node has no detection vertices".to_string()))?;

        let positions = vertices
            .iter()
            .take(self.detections.len())
            .map(|v| world.transform_point(&v.point()));
        Ok(nearest_to_ray(positions, ray, radius))
    }

    /// Mark one detection as selected and clear every other selection mark.
    /// `None` clears the selection.
    pub fn select(&mut self, index: Option<usize>) -> Result<Option<&RadarDetection>> {
        if let Some(i) = index {
            if i >= self.detections.len() {
                return Err(Error::InvalidData(format!(
                    "detection {} out of range, frame has {}",
                    i,
                    self.detections.len()
                )));
            }
        }

        let node = self.graph.node_mut(self.points)?;
        if let Some(vertices) = node.detections_mut() {
            for (i, vertex) in vertices.iter_mut().enumerate() {
                vertex.selected = if Some(i) == index { 1.0 } else { 0.0 };
            }
        }
        self.selected = index;
        Ok(index.and_then(|i| self.detections.get(i)))
    }

    pub fn selected(&self) -> Option<&RadarDetection> {
        self.selected.and_then(|i| self.detections.get(i))
    }
}
