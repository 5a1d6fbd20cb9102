//! Lazy sliding-window traversal of a sequence.
//!
//! The walker reads through a probe point held by its own orphan topology,
//! so traversal never shows up in the model's topology tree.

use crate::{
    error::{CoordinateError, Result},
    model_object::PositionedTarget,
    point::{Point, PointId},
    sequence::Sequence,
    topology::Topology,
};
use log::{trace, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkSettings {
    /// Coordinate units between two elements of a window; must be even.
    /// Negative values walk towards the start of the sequence.
    pub step_size: i64,
    pub slice_size: usize,
    /// Yield a trailing window shorter than `slice_size`.
    pub allow_incomplete: bool,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            step_size: 2,
            slice_size: 1,
            allow_incomplete: false,
        }
    }
}

impl WalkSettings {
    pub fn validate(&self) -> Result<()> {
        if self.step_size == 0 || self.step_size % 2 != 0 || self.step_size == i64::MIN {
            return Err(CoordinateError::InvalidConfiguration(format!(
                "walker steps must be even and non-zero, got {}",
                self.step_size
            )));
        }
        if self.slice_size < 1 {
            return Err(CoordinateError::InvalidConfiguration(
                "slices must hold at least one element".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SequenceWalker<'a> {
    sequence: &'a Sequence,
    settings: WalkSettings,
    start: i64,
    scratch: Topology,
    probe: PointId,
    travelled: i64,
    exhausted: bool,
}

impl<'a> SequenceWalker<'a> {
    pub fn new(sequence: &'a Sequence, start: i64, settings: WalkSettings) -> Result<Self> {
        settings.validate()?;
        if start % 2 == 0 {
            return Err(CoordinateError::InvalidConfiguration(format!(
                "walks start on an element (odd position), not at {start}"
            )));
        }
        let point = Point::with_step_size(sequence, start, settings.step_size.abs())?;
        if point.is_between() {
            return Err(CoordinateError::InvalidConfiguration(format!(
                "start {start} lies beyond the last element of sequence {}",
                sequence.id()
            )));
        }
        let start = point.position();
        let mut scratch = Topology::orphan();
        scratch.set_caption("sequence walker");
        let probe = scratch.add_point(point).ok_or_else(|| {
            CoordinateError::InvalidConfiguration("scratch topology refused the probe".to_string())
        })?;
        Ok(Self {
            sequence,
            settings,
            start,
            scratch,
            probe,
            travelled: 0,
            exhausted: false,
        })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn settings(&self) -> &WalkSettings {
        &self.settings
    }

    /// Rewinds to the original start position.
    pub fn restart(&mut self) -> Result<()> {
        self.scratch
            .set_point_position(self.probe, self.start, self.sequence)?;
        self.travelled = 0;
        self.exhausted = false;
        Ok(())
    }

    fn probe(&self) -> Result<&Point> {
        self.scratch.point(self.probe).ok_or_else(|| {
            CoordinateError::InvalidArgument("walker lost its probe point".to_string())
        })
    }

    /// Moves the probe to the next element. Returns `false` once that would
    /// come back around to the start or run off a linear end.
    fn advance(&mut self) -> Result<bool> {
        let before = self.probe()?.position();
        let step = self.settings.step_size;
        if !self
            .scratch
            .move_point_by(self.probe, step.signum(), self.sequence)?
        {
            return Ok(false);
        }
        if self.sequence.allows_wrap() {
            self.travelled += step.abs();
            let looped = self.travelled >= self.sequence.size();
            if looped {
                trace!("Walk from {} completed a full loop", self.start);
            }
            Ok(!looped)
        } else {
            let inside = self.probe()?.position() == before + step;
            if !inside {
                trace!("Walk from {} reached the end at {before}", self.start);
            }
            Ok(inside)
        }
    }

    fn next_window(&mut self) -> Result<Option<String>> {
        if self.exhausted {
            return Ok(None);
        }
        let mut slice = String::with_capacity(self.settings.slice_size);
        let mut count = 0;
        while count < self.settings.slice_size {
            slice.push(self.sequence.char_at(self.probe()?)?);
            count += 1;
            if !self.advance()? {
                self.exhausted = true;
                break;
            }
        }
        if count == self.settings.slice_size || (count > 0 && self.settings.allow_incomplete) {
            Ok(Some(slice))
        } else {
            self.exhausted = true;
            Ok(None)
        }
    }
}

impl Iterator for SequenceWalker<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_window() {
            Ok(window) => window,
            Err(e) => {
                warn!("Walk from {} stopped: {e}", self.start);
                self.exhausted = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{identity::IdentityRegistry, model_object::Shape};

    fn dna(text: &str, shape: Shape) -> Sequence {
        Sequence::nucleotide(&IdentityRegistry::new(), text, shape)
    }

    fn settings(step_size: i64, slice_size: usize, allow_incomplete: bool) -> WalkSettings {
        WalkSettings {
            step_size,
            slice_size,
            allow_incomplete,
        }
    }

    #[test]
    fn test_circular_walk_stops_before_revisiting_start() {
        let seq = dna("ACGT", Shape::Circular);
        let windows: Vec<String> = seq.walk_with(1, settings(2, 2, false)).unwrap().collect();
        assert_eq!(windows, vec!["AC", "GT"]);
    }

    #[test]
    fn test_circular_walk_from_middle_wraps() {
        let seq = dna("ACGTA", Shape::Circular);
        let windows: Vec<String> = seq.walk_with(5, settings(2, 2, false)).unwrap().collect();
        assert_eq!(windows, vec!["GT", "AA"]);
        let windows: Vec<String> = seq.walk_with(5, settings(2, 2, true)).unwrap().collect();
        assert_eq!(windows, vec!["GT", "AA", "C"]);
    }

    #[test]
    fn test_linear_walk_drops_incomplete_window() {
        let seq = dna("ACG", Shape::Linear);
        let windows: Vec<String> = seq.walk_with(1, settings(2, 2, false)).unwrap().collect();
        assert_eq!(windows, vec!["AC"]);
        let windows: Vec<String> = seq.walk_with(1, settings(2, 2, true)).unwrap().collect();
        assert_eq!(windows, vec!["AC", "G"]);
    }

    #[test]
    fn test_walk_backwards() {
        let seq = dna("ACGTT", Shape::Linear);
        let windows: Vec<String> = seq.walk_with(9, settings(-2, 2, false)).unwrap().collect();
        assert_eq!(windows, vec!["TT", "GC"]);

        let ring = dna("ACGT", Shape::Circular);
        let windows: Vec<String> = ring.walk_with(1, settings(-2, 1, false)).unwrap().collect();
        assert_eq!(windows, vec!["A", "T", "G", "C"]);
    }

    #[test]
    fn test_wider_steps_skip_elements() {
        let seq = dna("ACGTACGT", Shape::Linear);
        let windows: Vec<String> = seq.walk_with(1, settings(4, 1, false)).unwrap().collect();
        assert_eq!(windows, vec!["A", "G", "A", "G"]);
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let seq = dna("ACGT", Shape::Linear);
        for (start, walk) in [
            (2, settings(2, 1, false)),
            (1, settings(0, 1, false)),
            (1, settings(3, 1, false)),
            (1, settings(2, 0, false)),
            (1, settings(i64::MIN, 1, false)),
            (11, settings(2, 1, false)),
        ] {
            assert!(matches!(
                seq.walk_with(start, walk),
                Err(CoordinateError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_restart_replays_windows() {
        let seq = dna("ACGTAC", Shape::Circular);
        let mut walker = seq.walk_with(3, settings(2, 3, false)).unwrap();
        let first: Vec<String> = walker.by_ref().collect();
        assert_eq!(first, vec!["CGT", "ACA"]);
        assert_eq!(walker.next(), None);
        walker.restart().unwrap();
        let again: Vec<String> = walker.collect();
        assert_eq!(again, first);
    }

    #[test]
    fn test_walker_is_lazy() {
        let seq = dna(&"ACGT".repeat(1000), Shape::Circular);
        let mut walker = seq.walk_with(1, settings(2, 4, false)).unwrap();
        assert_eq!(walker.next().as_deref(), Some("ACGT"));
        assert_eq!(walker.start(), 1);
        assert_eq!(walker.settings().slice_size, 4);
    }

    #[test]
    fn test_settings_defaults_from_json() {
        let parsed: WalkSettings = serde_json::from_str(r#"{"slice_size": 3}"#).unwrap();
        assert_eq!(parsed, settings(2, 3, false));
        assert!(parsed.validate().is_ok());
    }
}
