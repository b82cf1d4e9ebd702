use serde::{Deserialize, Serialize};

/// Transport type for an audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioTransportType {
    BuiltIn,
    Bluetooth,
    Usb,
    Virtual,
    Unknown,
}

/// An input device a provider captures from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub transport_type: Option<AudioTransportType>,
}

/// RMS and peak level of a block of samples (0.0–1.0 for normalized audio).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioLevels {
    pub rms: f32,
    pub peak: f32,
}

/// One horizontal pixel of a waveform: the lowest and highest sample seen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvelopePoint {
    pub min: f32,
    pub max: f32,
}

/// A vertical line to draw for one envelope point, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelSegment {
    pub x: usize,
    pub y_top: f32,
    pub y_bottom: f32,
}

/// Min/max envelope with exactly one point per pixel of the target width.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Envelope {
    pub points: Vec<EnvelopePoint>,
}

impl Envelope {
    pub fn width(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Map each point onto a canvas of `height` pixels.
    ///
    /// The mid-line sits at `height / 2`; a sample value `v` lands on
    /// `mid + v * mid`, so -1.0 is the top edge and 1.0 the bottom.
    pub fn segments(&self, height: u32) -> Vec<PixelSegment> {
        let mid = height as f32 / 2.0;
        self.points
            .iter()
            .enumerate()
            .map(|(x, point)| PixelSegment {
                x,
                y_top: mid + point.min * mid,
                y_bottom: mid + point.max * mid,
            })
            .collect()
    }
}

/// Counters for debugging capture sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionDiagnostics {
    pub chunks_accepted: u64,
    pub chunks_dropped: u64,
    pub bytes_accepted: u64,
    pub sessions_started: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_use_midline() {
        let envelope = Envelope {
            points: vec![
                EnvelopePoint { min: -1.0, max: 1.0 },
                EnvelopePoint { min: 0.0, max: 0.0 },
                EnvelopePoint { min: -0.5, max: 0.25 },
            ],
        };

        let segments = envelope.segments(150);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].y_top, 0.0);
        assert_eq!(segments[0].y_bottom, 150.0);
        assert_eq!(segments[1].y_top, 75.0);
        assert_eq!(segments[1].y_bottom, 75.0);
        assert_eq!(segments[2].x, 2);
        assert!((segments[2].y_top - 37.5).abs() < 1e-6);
        assert!((segments[2].y_bottom - 93.75).abs() < 1e-6);
    }

    #[test]
    fn envelope_serializes_as_point_list() {
        let envelope = Envelope {
            points: vec![EnvelopePoint { min: -0.5, max: 0.5 }],
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["points"][0]["min"], -0.5);
        assert_eq!(json["points"][0]["max"], 0.5);
    }
}
