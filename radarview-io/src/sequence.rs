//! Radar sequence reader
//!
//! A sequence file is a delimited text table with one detection per row and a
//! header naming the columns. The delimiter (comma, tab, semicolon or space) is
//! detected from the header line, columns are matched by name and may appear in
//! any order. Rows sharing a timestamp and sensor form one [`Scan`].

use crate::IoError;
use radarview_core::{get_mounting, RadarDetection, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Supported delimiters for sequence files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
    Semicolon,
    Space,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
            Delimiter::Space => ' ',
        }
    }

    /// Detect the delimiter from a line of text.
    ///
    /// The most frequent of comma, tab and semicolon wins, ties going to the
    /// earlier one. Space is only chosen when none of them occurs, so padding
    /// after a comma never counts as a separator.
    pub fn detect_from_line(line: &str) -> Option<Self> {
        let mut best: Option<(usize, Delimiter)> = None;
        for delimiter in [Delimiter::Comma, Delimiter::Tab, Delimiter::Semicolon] {
            let count = line.matches(delimiter.as_char()).count();
            if count > 0 && best.map_or(true, |(most, _)| count > most) {
                best = Some((count, delimiter));
            }
        }

        best.map(|(_, delimiter)| delimiter)
            .or_else(|| line.trim().contains(' ').then_some(Delimiter::Space))
    }

    /// Split a line into fields. Empty fields are kept for every delimiter
    /// except space, where runs of blanks separate a single field.
    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Space => line.split_whitespace().collect(),
            other => line.split(other.as_char()).map(|s| s.trim()).collect(),
        }
    }
}

/// Detection fields that can be read from a sequence file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Timestamp,
    SensorId,
    RangeSc,
    AzimuthSc,
    Rcs,
    Vr,
    VrCompensated,
    XCc,
    YCc,
    XSeq,
    YSeq,
    Uuid,
    TrackId,
    LabelId,
    Unknown,
}

impl Column {
    /// Columns every sequence file must provide
    pub const REQUIRED: [Column; 6] = [
        Column::Timestamp,
        Column::SensorId,
        Column::RangeSc,
        Column::AzimuthSc,
        Column::Rcs,
        Column::VrCompensated,
    ];

    pub fn from_header(header: &str) -> Self {
        match header.trim().to_lowercase().as_str() {
            "timestamp" => Column::Timestamp,
            "sensor_id" => Column::SensorId,
            "range_sc" | "range" => Column::RangeSc,
            "azimuth_sc" | "azimuth" => Column::AzimuthSc,
            "rcs" => Column::Rcs,
            "vr" => Column::Vr,
            "vr_compensated" => Column::VrCompensated,
            "x_cc" => Column::XCc,
            "y_cc" => Column::YCc,
            "x_seq" => Column::XSeq,
            "y_seq" => Column::YSeq,
            "uuid" => Column::Uuid,
            "track_id" => Column::TrackId,
            "label_id" => Column::LabelId,
            _ => Column::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Column::Timestamp => "timestamp",
            Column::SensorId => "sensor_id",
            Column::RangeSc => "range_sc",
            Column::AzimuthSc => "azimuth_sc",
            Column::Rcs => "rcs",
            Column::Vr => "vr",
            Column::VrCompensated => "vr_compensated",
            Column::XCc => "x_cc",
            Column::YCc => "y_cc",
            Column::XSeq => "x_seq",
            Column::YSeq => "y_seq",
            Column::Uuid => "uuid",
            Column::TrackId => "track_id",
            Column::LabelId => "label_id",
            Column::Unknown => "unknown",
        }
    }
}

/// Column layout detected from a header line
#[derive(Debug, Clone)]
pub struct SequenceSchema {
    pub columns: Vec<Column>,
    pub delimiter: Delimiter,
}

impl SequenceSchema {
    pub fn from_header(line: &str) -> std::result::Result<Self, IoError> {
        let delimiter = Delimiter::detect_from_line(line).ok_or_else(|| IoError::InvalidFormat {
            format: "could not detect delimiter in header".to_string(),
        })?;
        let columns: Vec<Column> = delimiter.split(line).iter().map(|h| Column::from_header(h)).collect();

        if let Some(missing) = Column::REQUIRED.iter().find(|c| !columns.contains(c)) {
            return Err(IoError::MissingColumn { column: missing.name().to_string() });
        }
        Ok(Self { columns, delimiter })
    }

    fn parse_row(&self, line: &str, line_number: usize) -> std::result::Result<RadarDetection, IoError> {
        let parts = self.delimiter.split(line);
        if parts.len() < self.columns.len() {
            return Err(IoError::ParseError {
                line: line_number,
                message: format!("expected {} fields, found {}", self.columns.len(), parts.len()),
            });
        }

        let mut detection = RadarDetection::default();
        let mut has_position = (false, false);

        for (column, value) in self.columns.iter().zip(parts) {
            let number = |value: &str| {
                value.parse::<f32>().map_err(|_| IoError::ParseError {
                    line: line_number,
                    message: format!("invalid {} value '{}'", column.name(), value),
                })
            };
            let integer = |value: &str| {
                value.parse::<i64>().map_err(|_| IoError::ParseError {
                    line: line_number,
                    message: format!("invalid {} value '{}'", column.name(), value),
                })
            };

            match column {
                Column::Timestamp => {
                    detection.timestamp = u64::try_from(integer(value)?).map_err(|_| IoError::ParseError {
                        line: line_number,
                        message: format!("timestamp '{}' is negative", value),
                    })?
                }
                Column::SensorId => {
                    detection.sensor_id = u8::try_from(integer(value)?).map_err(|_| IoError::ParseError {
                        line: line_number,
                        message: format!("sensor id '{}' out of range", value),
                    })?
                }
                Column::RangeSc => detection.range_sc = number(value)?,
                Column::AzimuthSc => detection.azimuth_sc = number(value)?,
                Column::Rcs => detection.rcs = number(value)?,
                Column::Vr => detection.vr = number(value)?,
                Column::VrCompensated => detection.vr_compensated = number(value)?,
                Column::XCc => {
                    detection.x_cc = number(value)?;
                    has_position.0 = true;
                }
                Column::YCc => {
                    detection.y_cc = number(value)?;
                    has_position.1 = true;
                }
                Column::XSeq => detection.x_seq = number(value)?,
                Column::YSeq => detection.y_seq = number(value)?,
                Column::Uuid => detection.uuid = value.to_string(),
                Column::TrackId => detection.track_id = value.to_string(),
                Column::LabelId => {
                    detection.label_id = i32::try_from(integer(value)?).map_err(|_| IoError::ParseError {
                        line: line_number,
                        message: format!("label id '{}' out of range", value),
                    })?
                }
                Column::Unknown => {}
            }
        }

        // Derive car coordinates from the polar measurement when the file lacks them
        if !(has_position.0 && has_position.1) {
            if let Some(mounting) = get_mounting(detection.sensor_id) {
                let p = mounting.polar_to_car(detection.range_sc, detection.azimuth_sc);
                detection.x_cc = p.x;
                detection.y_cc = p.y;
            }
        }
        Ok(detection)
    }
}

/// All detections of one sensor measured at one timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub timestamp: u64,
    pub sensor_id: u8,
    pub detections: Vec<RadarDetection>,
}

/// A recorded radar sequence, scans sorted by timestamp then sensor
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    name: String,
    scans: Vec<Scan>,
    timestamps: Vec<u64>,
}

impl Sequence {
    /// Group detections into scans
    pub fn from_detections(name: impl Into<String>, mut detections: Vec<RadarDetection>) -> Self {
        detections.sort_by_key(|d| (d.timestamp, d.sensor_id));

        let mut scans: Vec<Scan> = Vec::new();
        for detection in detections {
            match scans.last_mut() {
                Some(scan) if scan.timestamp == detection.timestamp && scan.sensor_id == detection.sensor_id => {
                    scan.detections.push(detection)
                }
                _ => scans.push(Scan {
                    timestamp: detection.timestamp,
                    sensor_id: detection.sensor_id,
                    detections: vec![detection],
                }),
            }
        }

        let mut timestamps: Vec<u64> = scans.iter().map(|s| s.timestamp).collect();
        timestamps.dedup();

        Self { name: name.into(), scans, timestamps }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }

    /// Distinct scan timestamps in ascending order
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    pub fn first_timestamp(&self) -> Option<u64> {
        self.timestamps.first().copied()
    }

    /// The next scan timestamp strictly after `timestamp`
    pub fn next_timestamp_after(&self, timestamp: u64) -> Option<u64> {
        let index = self.timestamps.partition_point(|&t| t <= timestamp);
        self.timestamps.get(index).copied()
    }

    /// Scans measured exactly at `timestamp`
    pub fn scene(&self, timestamp: u64) -> &[Scan] {
        let start = self.scans.partition_point(|s| s.timestamp < timestamp);
        let end = self.scans.partition_point(|s| s.timestamp <= timestamp);
        &self.scans[start..end]
    }

    pub fn detection_count(&self) -> usize {
        self.scans.iter().map(|s| s.detections.len()).sum()
    }

    /// The frame shown at `timestamp`
    pub fn window_at(&self, timestamp: u64) -> FrameWindow {
        FrameWindow::at(self, timestamp)
    }
}

/// Detections visible at one point of the timeline: the latest scan of every
/// sensor measured at or before it
#[derive(Debug, Clone, Default)]
pub struct FrameWindow {
    pub timestamp: u64,
    pub scans: Vec<Scan>,
}

impl FrameWindow {
    pub fn at(sequence: &Sequence, timestamp: u64) -> Self {
        let end = sequence.scans.partition_point(|s| s.timestamp <= timestamp);
        let mut scans: Vec<Scan> = Vec::new();
        for scan in sequence.scans[..end].iter().rev() {
            if !scans.iter().any(|s| s.sensor_id == scan.sensor_id) {
                scans.push(scan.clone());
            }
        }
        scans.sort_by_key(|s| s.sensor_id);
        Self { timestamp, scans }
    }

    /// All detections of the window, ordered by sensor id
    pub fn detections(&self) -> Vec<RadarDetection> {
        self.scans.iter().flat_map(|s| s.detections.iter().cloned()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.iter().all(|s| s.detections.is_empty())
    }

    /// Time between the oldest and newest detection in milliseconds
    pub fn window_size_ms(&self) -> f64 {
        let stamps = self.scans.iter().flat_map(|s| s.detections.iter().map(|d| d.timestamp));
        let (min, max) = stamps.fold((u64::MAX, 0u64), |(lo, hi), t| (lo.min(t), hi.max(t)));
        if min > max {
            return 0.0;
        }
        (max - min) as f64 / 1_000.0
    }
}

/// Read a sequence file; the sequence is named after the file stem
pub fn read_sequence<P: AsRef<Path>>(path: P) -> Result<Sequence> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::FileNotFound { path: path.display().to_string() }.into());
    }
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sequence")
        .to_string();

    let file = File::open(path)?;
    let sequence = parse_sequence(name, BufReader::new(file))?;
    log::info!(
        "Loaded sequence '{}': {} detections in {} scans, {} timestamps",
        sequence.name(),
        sequence.detection_count(),
        sequence.scans().len(),
        sequence.timestamps().len()
    );
    Ok(sequence)
}

/// Parse a sequence table from any buffered reader
pub fn parse_sequence<R: BufRead>(name: impl Into<String>, reader: R) -> Result<Sequence> {
    let mut schema: Option<SequenceSchema> = None;
    let mut detections = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(IoError::from)?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(active) = schema.as_ref() else {
            schema = Some(SequenceSchema::from_header(trimmed)?);
            continue;
        };
        // Only the line ending is stripped; a trailing tab still closes an empty field
        detections.push(active.parse_row(line.trim_end_matches('\r'), index + 1)?);
    }

    if schema.is_none() {
        return Err(IoError::InvalidFormat { format: "empty sequence file".to_string() }.into());
    }
    Ok(Sequence::from_detections(name, detections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TABLE: &str = "\
timestamp,sensor_id,range_sc,azimuth_sc,rcs,vr,vr_compensated,x_cc,y_cc,uuid,track_id,label_id
1000,1,10.0,0.1,5.0,-1.0,-0.5,1.0,2.0,a,,11
1000,1,12.0,0.2,6.0,-1.0,-0.6,3.0,4.0,b,,11
1500,2,8.0,-0.1,-3.0,2.0,1.5,5.0,6.0,c,t1,0
2000,1,9.0,0.0,1.0,0.0,0.0,7.0,8.0,d,,-1
";

    #[test]
    fn test_delimiter_detection() {
        assert_eq!(Delimiter::detect_from_line("a,b,c"), Some(Delimiter::Comma));
        assert_eq!(Delimiter::detect_from_line("a\tb\tc"), Some(Delimiter::Tab));
        assert_eq!(Delimiter::detect_from_line("a;b;c"), Some(Delimiter::Semicolon));
        assert_eq!(Delimiter::detect_from_line("a b  c"), Some(Delimiter::Space));
        assert_eq!(Delimiter::detect_from_line("abc"), None);
    }

    #[test]
    fn test_padded_separators_are_not_spaces() {
        assert_eq!(Delimiter::detect_from_line("timestamp, sensor_id, rcs"), Some(Delimiter::Comma));
        assert_eq!(Delimiter::detect_from_line("timestamp; sensor_id; rcs"), Some(Delimiter::Semicolon));
        assert_eq!(Delimiter::detect_from_line("timestamp\t sensor_id\t rcs"), Some(Delimiter::Tab));
        // ties go to the earlier delimiter
        assert_eq!(Delimiter::detect_from_line("a,b;c"), Some(Delimiter::Comma));
    }

    #[test]
    fn test_parse_comma_space_table() {
        let table = "timestamp, sensor_id, range_sc, azimuth_sc, rcs, vr_compensated, uuid\n\
                     1000, 1, 10.0, 0.0, 2.0, 0.5, a\n";
        let sequence = parse_sequence("padded", table.as_bytes()).unwrap();
        let detection = &sequence.scans()[0].detections[0];
        assert_eq!(detection.timestamp, 1000);
        assert_relative_eq!(detection.rcs, 2.0);
        assert_eq!(detection.uuid, "a");
    }

    #[test]
    fn test_empty_fields_kept_for_tab_and_semicolon() {
        let tsv = "timestamp\tsensor_id\trange_sc\tazimuth_sc\trcs\tvr_compensated\ttrack_id\tuuid\n\
                   1000\t1\t10\t0\t1\t0\t\tx\n\
                   1000\t1\t11\t0\t1\t0\tt7\t\n";
        let sequence = parse_sequence("tsv", tsv.as_bytes()).unwrap();
        let detections = &sequence.scans()[0].detections;
        assert_eq!(detections[0].track_id, "");
        assert_eq!(detections[0].uuid, "x");
        assert_eq!(detections[1].track_id, "t7");
        assert_eq!(detections[1].uuid, "");

        let csv = "timestamp; sensor_id; range_sc; azimuth_sc; rcs; vr_compensated; track_id; label_id\n\
                   1000; 1; 10; 0; 1; 0; ; 4\n";
        let sequence = parse_sequence("semicolon", csv.as_bytes()).unwrap();
        let detection = &sequence.scans()[0].detections[0];
        assert_eq!(detection.track_id, "");
        assert_eq!(detection.label_id, 4);
    }

    #[test]
    fn test_out_of_range_integers_rejected() {
        let header = "timestamp,sensor_id,range_sc,azimuth_sc,rcs,vr_compensated,label_id\n";
        let negative = format!("{}-5,1,1,0,0,0,1\n", header);
        let err = parse_sequence("bad", negative.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("negative"));

        let huge = format!("{}5,1,1,0,0,0,4294967296\n", header);
        let err = parse_sequence("bad", huge.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("label id"));
    }

    #[test]
    fn test_parse_groups_scans() {
        let sequence = parse_sequence("test", TABLE.as_bytes()).unwrap();
        assert_eq!(sequence.timestamps(), &[1000, 1500, 2000]);
        assert_eq!(sequence.scans().len(), 3);
        assert_eq!(sequence.scene(1000)[0].detections.len(), 2);
        assert_eq!(sequence.scene(1000)[0].detections[1].uuid, "b");
        assert_eq!(sequence.scene(1500)[0].detections[0].track_id, "t1");
        assert!(sequence.scene(1200).is_empty());
    }

    #[test]
    fn test_timestamp_navigation() {
        let sequence = parse_sequence("test", TABLE.as_bytes()).unwrap();
        assert_eq!(sequence.first_timestamp(), Some(1000));
        assert_eq!(sequence.next_timestamp_after(1000), Some(1500));
        assert_eq!(sequence.next_timestamp_after(1200), Some(1500));
        assert_eq!(sequence.next_timestamp_after(2000), None);
    }

    #[test]
    fn test_window_keeps_latest_scan_per_sensor() {
        let sequence = parse_sequence("test", TABLE.as_bytes()).unwrap();

        let window = sequence.window_at(1500);
        assert_eq!(window.scans.len(), 2);
        assert_eq!(window.detections().len(), 3);
        assert_relative_eq!(window.window_size_ms(), 0.5);

        // sensor 1 at 2000 replaces its scan from 1000
        let window = sequence.window_at(2000);
        let uuids: Vec<String> = window.detections().into_iter().map(|d| d.uuid).collect();
        assert_eq!(uuids, vec!["d", "c"]);
        assert_relative_eq!(window.window_size_ms(), 0.5);
    }

    #[test]
    fn test_missing_required_column() {
        let result = parse_sequence("bad", "timestamp,sensor_id,range_sc\n1,1,1\n".as_bytes());
        assert!(result.is_err());
        let err = SequenceSchema::from_header("timestamp,sensor_id,range_sc").unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { ref column } if column == "azimuth_sc"));
    }

    #[test]
    fn test_bad_value_reports_line() {
        let table = "timestamp;sensor_id;range_sc;azimuth_sc;rcs;vr_compensated\n1;1;x;0;0;0\n";
        let err = parse_sequence("bad", table.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_car_position_derived_from_polar() {
        let table = "timestamp sensor_id range_sc azimuth_sc rcs vr_compensated\n1 3 10 0 0 0\n";
        let sequence = parse_sequence("polar", table.as_bytes()).unwrap();
        let detection = &sequence.scans()[0].detections[0];
        let expected = get_mounting(3).unwrap().polar_to_car(10.0, 0.0);
        assert_relative_eq!(detection.x_cc, expected.x);
        assert_relative_eq!(detection.y_cc, expected.y);
    }
}
