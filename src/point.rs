//! Points mark a single position on a [`PositionedTarget`].
//!
//! A point belongs to one target and, once added, to one topology. Moving a
//! point first normalizes the requested position against the target (wrapping
//! on circular targets, clamping on linear ones) and then asks the owning
//! topology whether the normalized position is acceptable.

use crate::{
    error::{CoordinateError, Result},
    model_object::{ObjectId, PositionedTarget},
};
use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One "on" step: from one element to the next.
pub const DEFAULT_STEP_SIZE: i64 = 2;

/// Identifies a point within the topology that holds it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PointId(u64);

impl PointId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline(always)]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Decides whether a point may move to an already normalized position.
pub trait MoveArbiter {
    fn allow_move(&self, point: &Point, candidate: i64) -> bool;
}

/// Maps `raw` into the coordinate space of a target with `size` positions.
///
/// Returns the normalized position and whether wrapping was needed.
pub fn normalize_position(raw: i64, size: i64, wraps: bool) -> Result<(i64, bool)> {
    if size <= 0 {
        return Err(CoordinateError::OutOfRange(format!(
            "cannot normalize position {raw} on a target of size {size}"
        )));
    }
    if wraps {
        if raw < 0 || raw >= size {
            Ok((raw.rem_euclid(size), true))
        } else {
            Ok((raw, false))
        }
    } else {
        Ok((raw.clamp(0, size - 1), false))
    }
}

/// Raw target of moving `steps` steps of `step_size` from `position`.
///
/// The result normalizes to the same position and wrap flag as the exact
/// sum would, without overflowing for any `steps`.
pub(crate) fn offset_position(
    position: i64,
    step_size: i64,
    steps: i64,
    target: &dyn PositionedTarget,
) -> i64 {
    let raw = i128::from(position) + i128::from(step_size) * i128::from(steps);
    let size = i128::from(target.size());
    let wraps = target.allows_wrap();
    match i64::try_from(raw) {
        Ok(exact) if !wraps || (0..size).contains(&raw) => return exact,
        _ => {}
    }
    if wraps && size > 0 {
        // Lands in [size, 2 * size): same position, still flagged as wrapped.
        i64::try_from(raw.rem_euclid(size) + size).unwrap_or(i64::MAX)
    } else if raw < 0 {
        i64::MIN
    } else {
        i64::MAX
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    id: Option<PointId>,
    target: ObjectId,
    topology: Option<ObjectId>,
    position: i64,
    step_size: i64,
    did_wrap: bool,
}

impl Point {
    pub fn new(target: &dyn PositionedTarget, position: i64) -> Result<Self> {
        Self::with_step_size(target, position, DEFAULT_STEP_SIZE)
    }

    /// `step_size` 1 steps "on", "between", "on", ...; 2 steps from element to element.
    pub fn with_step_size(
        target: &dyn PositionedTarget,
        position: i64,
        step_size: i64,
    ) -> Result<Self> {
        if step_size < 1 {
            return Err(CoordinateError::InvalidConfiguration(format!(
                "step size must be positive, got {step_size}"
            )));
        }
        if step_size >= target.size() {
            return Err(CoordinateError::InvalidConfiguration(format!(
                "step size {step_size} must be smaller than target size {}",
                target.size()
            )));
        }
        let (position, did_wrap) =
            normalize_position(position, target.size(), target.allows_wrap())?;
        Ok(Self {
            id: None,
            target: target.id(),
            topology: None,
            position,
            step_size,
            did_wrap,
        })
    }

    /// Set once the point has been accepted by a topology.
    pub fn id(&self) -> Option<PointId> {
        self.id
    }

    pub fn target(&self) -> ObjectId {
        self.target
    }

    /// The registered topology holding this point; `None` while unattached
    /// or when held by an orphan topology.
    pub fn topology(&self) -> Option<ObjectId> {
        self.topology
    }

    #[inline(always)]
    pub fn position(&self) -> i64 {
        self.position
    }

    #[inline(always)]
    pub fn step_size(&self) -> i64 {
        self.step_size
    }

    /// Whether the most recent normalization wrapped around the origin.
    #[inline(always)]
    pub fn did_wrap(&self) -> bool {
        self.did_wrap
    }

    #[inline(always)]
    pub fn is_between(&self) -> bool {
        self.position % 2 == 0
    }

    pub fn annotates(&self, target: &dyn PositionedTarget) -> bool {
        self.target == target.id()
    }

    pub fn normalize(&mut self, raw: i64, target: &dyn PositionedTarget) -> Result<i64> {
        let (value, did_wrap) = self.candidate(raw, target)?;
        self.did_wrap = did_wrap;
        Ok(value)
    }

    /// Normalizes `raw` against `target` without touching the point.
    pub fn candidate(&self, raw: i64, target: &dyn PositionedTarget) -> Result<(i64, bool)> {
        self.check_target(target)?;
        normalize_position(raw, target.size(), target.allows_wrap())
    }

    /// Moves to `raw` if the arbiter accepts the normalized position.
    /// A refused move leaves the point untouched, including its wrap flag.
    pub fn set_position(
        &mut self,
        raw: i64,
        target: &dyn PositionedTarget,
        arbiter: &dyn MoveArbiter,
    ) -> Result<bool> {
        let (candidate, did_wrap) = self.candidate(raw, target)?;
        if arbiter.allow_move(self, candidate) {
            self.commit(candidate, did_wrap);
            Ok(true)
        } else {
            trace!(
                "Move of point on {} from {} to {candidate} refused",
                self.target, self.position
            );
            Ok(false)
        }
    }

    /// Moves by `steps` step units; negative values move backwards.
    pub fn move_by(
        &mut self,
        steps: i64,
        target: &dyn PositionedTarget,
        arbiter: &dyn MoveArbiter,
    ) -> Result<bool> {
        let raw = offset_position(self.position, self.step_size, steps, target);
        self.set_position(raw, target, arbiter)
    }

    pub(crate) fn attach(&mut self, id: PointId, topology: Option<ObjectId>) {
        self.id = Some(id);
        self.topology = topology;
    }

    pub(crate) fn detach(&mut self) {
        self.id = None;
        self.topology = None;
    }

    pub(crate) fn commit(&mut self, position: i64, did_wrap: bool) {
        self.position = position;
        self.did_wrap = did_wrap;
    }

    fn check_target(&self, target: &dyn PositionedTarget) -> Result<()> {
        if self.annotates(target) {
            Ok(())
        } else {
            Err(CoordinateError::InvalidArgument(format!(
                "point annotates object {}, not {}",
                self.target,
                target.id()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_object::Shape;

    struct Strip {
        id: ObjectId,
        shape: Shape,
        size: i64,
    }

    impl Strip {
        fn linear(size: i64) -> Self {
            Self {
                id: ObjectId::new(1),
                shape: Shape::Linear,
                size,
            }
        }

        fn circular(size: i64) -> Self {
            Self {
                id: ObjectId::new(1),
                shape: Shape::Circular,
                size,
            }
        }
    }

    impl PositionedTarget for Strip {
        fn id(&self) -> ObjectId {
            self.id
        }

        fn shape(&self) -> Shape {
            self.shape
        }

        fn size(&self) -> i64 {
            self.size
        }

        fn children(&self) -> Vec<ObjectId> {
            vec![]
        }
    }

    struct AllowAll;

    impl MoveArbiter for AllowAll {
        fn allow_move(&self, _point: &Point, _candidate: i64) -> bool {
            true
        }
    }

    struct Forbid(i64);

    impl MoveArbiter for Forbid {
        fn allow_move(&self, _point: &Point, candidate: i64) -> bool {
            candidate != self.0
        }
    }

    #[test]
    fn test_circular_normalization_stays_in_range_and_is_periodic() {
        let size = 8;
        for p in -40..40 {
            let (value, _) = normalize_position(p, size, true).unwrap();
            assert!((0..size).contains(&value));
            for k in -3..=3 {
                let (shifted, _) = normalize_position(p + k * size, size, true).unwrap();
                assert_eq!(shifted, value);
            }
        }
    }

    #[test]
    fn test_circular_normalization_flags_wrap() {
        assert_eq!(normalize_position(3, 8, true).unwrap(), (3, false));
        assert_eq!(normalize_position(8, 8, true).unwrap(), (0, true));
        assert_eq!(normalize_position(-1, 8, true).unwrap(), (7, true));
        assert_eq!(normalize_position(-17, 8, true).unwrap(), (7, true));
    }

    #[test]
    fn test_linear_normalization_clamps() {
        let size = 7;
        for p in -20..0 {
            assert_eq!(normalize_position(p, size, false).unwrap(), (0, false));
        }
        for p in size..size + 20 {
            assert_eq!(normalize_position(p, size, false).unwrap(), (size - 1, false));
        }
        assert_eq!(normalize_position(4, size, false).unwrap(), (4, false));
    }

    #[test]
    fn test_zero_size_wrap_fails() {
        let err = normalize_position(5, 0, true).unwrap_err();
        assert!(matches!(err, CoordinateError::OutOfRange(_)));
    }

    #[test]
    fn test_step_size_validation() {
        let target = Strip::linear(7);
        assert!(matches!(
            Point::with_step_size(&target, 1, 0),
            Err(CoordinateError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Point::with_step_size(&target, 1, 7),
            Err(CoordinateError::InvalidConfiguration(_))
        ));
        assert_eq!(Point::with_step_size(&target, 1, 6).unwrap().step_size(), 6);
        assert_eq!(Point::new(&target, 1).unwrap().step_size(), DEFAULT_STEP_SIZE);
    }

    #[test]
    fn test_construction_normalizes() {
        let target = Strip::linear(7);
        assert_eq!(Point::new(&target, 10).unwrap().position(), 6);
        let target = Strip::circular(8);
        let point = Point::new(&target, 9).unwrap();
        assert_eq!(point.position(), 1);
        assert!(point.did_wrap());
        assert_eq!(point.id(), None);
        assert_eq!(point.topology(), None);
    }

    #[test]
    fn test_set_position_commits_when_allowed() {
        let target = Strip::circular(8);
        let mut point = Point::new(&target, 1).unwrap();
        assert!(point.set_position(-3, &target, &AllowAll).unwrap());
        assert_eq!(point.position(), 5);
        assert!(point.did_wrap());
        assert!(point.set_position(3, &target, &AllowAll).unwrap());
        assert!(!point.did_wrap());
    }

    #[test]
    fn test_set_position_refused_leaves_position() {
        let target = Strip::circular(8);
        let mut point = Point::new(&target, 1).unwrap();
        assert!(!point.set_position(13, &target, &Forbid(5)).unwrap());
        assert_eq!(point.position(), 1);
        assert!(!point.did_wrap());
        assert!(point.set_position(14, &target, &Forbid(5)).unwrap());
        assert_eq!(point.position(), 6);
    }

    #[test]
    fn test_move_by_counts_step_units() {
        let target = Strip::linear(21);
        let mut point = Point::with_step_size(&target, 1, 2).unwrap();
        assert!(point.move_by(3, &target, &AllowAll).unwrap());
        assert_eq!(point.position(), 7);
        assert!(point.move_by(-2, &target, &AllowAll).unwrap());
        assert_eq!(point.position(), 3);
        assert!(point.move_by(-5, &target, &AllowAll).unwrap());
        assert_eq!(point.position(), 0);
        assert!(point.is_between());
    }

    #[test]
    fn test_move_by_extreme_step_counts() {
        let ring = Strip::circular(8);
        let line = Strip::linear(9);
        for steps in [i64::MAX, i64::MIN, i64::MAX - 1, i64::MIN + 1] {
            let mut point = Point::with_step_size(&ring, 3, 2).unwrap();
            assert!(point.move_by(steps, &ring, &AllowAll).unwrap());
            let expected = (3 + 2 * i128::from(steps)).rem_euclid(8);
            assert_eq!(i128::from(point.position()), expected);
            assert!(point.did_wrap());

            let mut point = Point::with_step_size(&line, 3, 2).unwrap();
            assert!(point.move_by(steps, &line, &AllowAll).unwrap());
            assert_eq!(point.position(), if steps > 0 { 8 } else { 0 });
        }
    }

    #[test]
    fn test_move_by_keeps_wrap_flag_exact() {
        let ring = Strip::circular(8);
        let mut point = Point::new(&ring, 5).unwrap();
        assert!(point.move_by(-1, &ring, &AllowAll).unwrap());
        assert_eq!(point.position(), 3);
        assert!(!point.did_wrap());
        assert!(point.move_by(-2, &ring, &AllowAll).unwrap());
        assert_eq!(point.position(), 7);
        assert!(point.did_wrap());
        assert!(point.move_by(4, &ring, &AllowAll).unwrap());
        assert_eq!(point.position(), 7);
        assert!(point.did_wrap());
    }

    #[test]
    fn test_foreign_target_is_rejected() {
        let target = Strip::linear(7);
        let other = Strip {
            id: ObjectId::new(2),
            shape: Shape::Linear,
            size: 7,
        };
        let mut point = Point::new(&target, 1).unwrap();
        assert!(point.annotates(&target));
        assert!(!point.annotates(&other));
        assert!(matches!(
            point.set_position(3, &other, &AllowAll),
            Err(CoordinateError::InvalidArgument(_))
        ));
        assert_eq!(point.position(), 1);
    }
}
