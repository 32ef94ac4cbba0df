/*!
 * Timeline resolution.
 *
 * Millisecond markers become frames on a single axis shared by every document of a
 * run. Each document starts where the previous one ended, plus one frame, so the
 * interviews of a corpus never overlap.
 */

use std::collections::HashMap;

use crate::corpus::model::FrameSpan;
use crate::errors::ConversionError;
use crate::tei::Marker;

/// Frames per second of the corpus time axis
pub const FRAMES_PER_SECOND: f64 = 25.0;

/// Last frame a marker may resolve to; leaves room for a one-frame span and the gap to the next document
pub const MAX_FRAME: u64 = u64::MAX - 2;

/// Running frame offset threaded from one document conversion to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timeline {
    offset: u64,
}

impl Timeline {
    /// Timeline of a fresh run, starting at frame 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeline whose next document starts at `offset`
    pub fn starting_at(offset: u64) -> Self {
        Self { offset }
    }

    /// First frame available to the next document
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Frame of a millisecond timestamp: `offset + round(25 * ms / 1000)`
    ///
    /// Halves round to the even neighbour. `None` when the frame does not fit the axis.
    pub fn frame(&self, ms: f64) -> Option<u64> {
        let frames = (FRAMES_PER_SECOND * ms / 1000.0).round_ties_even();
        if !(0.0..MAX_FRAME as f64).contains(&frames) {
            return None;
        }
        self.offset
            .checked_add(frames as u64)
            .filter(|frame| *frame <= MAX_FRAME)
    }

    /// Map every marker of a document to its frame
    pub fn resolve(&self, markers: &[Marker]) -> Result<FrameMap, ConversionError> {
        let mut frames = HashMap::with_capacity(markers.len());
        for marker in markers {
            let ms = parse_interval(marker)?;
            let frame = self.frame(ms).ok_or_else(|| ConversionError::InvalidInterval {
                marker: marker.id.clone(),
                value: marker.interval.as_deref().unwrap_or_default().trim().to_string(),
            })?;
            frames.insert(format!("#{}", marker.id), frame);
        }
        Ok(FrameMap { frames })
    }

    /// Timeline for the document following one that ended at `end_frame`
    pub fn advance_past(self, end_frame: u64) -> Self {
        Self {
            offset: end_frame.max(self.offset).saturating_add(1),
        }
    }
}

fn parse_interval(marker: &Marker) -> Result<f64, ConversionError> {
    let Some(raw) = marker.interval.as_deref() else {
        return Ok(0.0);
    };

    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }

    match raw.parse::<f64>() {
        Ok(ms) if ms.is_finite() && ms >= 0.0 => Ok(ms),
        _ => Err(ConversionError::InvalidInterval {
            marker: marker.id.clone(),
            value: raw.to_string(),
        }),
    }
}

/// Marker reference (`#id`) to frame lookup for one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameMap {
    frames: HashMap<String, u64>,
}

impl FrameMap {
    /// Frame of a marker reference such as `#T3`
    pub fn get(&self, reference: &str) -> Result<u64, ConversionError> {
        self.frames
            .get(reference.trim())
            .copied()
            .ok_or_else(|| ConversionError::UnknownMarker(reference.to_string()))
    }

    /// Clamped span between two marker references
    pub fn span(&self, from: &str, to: &str) -> Result<FrameSpan, ConversionError> {
        let start = self.get(from)?;
        let end = self.get(to)?;
        Ok(FrameSpan::clamped(start, end))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
