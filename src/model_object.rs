use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a model object, issued by an [`IdentityRegistry`](crate::identity::IdentityRegistry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn new(value: usize) -> Self {
        Self(value)
    }

    #[inline(always)]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    Linear,
    Circular,
}

/// Anything points can be placed on.
///
/// Positions live in a dual space: odd positions are "on" an element,
/// even positions are "between" two elements (or before/after the ends).
pub trait PositionedTarget {
    fn id(&self) -> ObjectId;

    fn shape(&self) -> Shape;

    /// Number of positions in the dual coordinate space.
    fn size(&self) -> i64;

    /// Objects attached to this one, e.g. annotations of a sequence.
    fn children(&self) -> Vec<ObjectId>;

    fn allows_wrap(&self) -> bool {
        self.shape() == Shape::Circular
    }
}
