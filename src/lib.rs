pub mod about;
pub mod annotation;
pub mod error;
pub mod identity;
pub mod model;
pub mod model_object;
pub mod parameters;
pub mod point;
pub mod sequence;
pub mod sequence_walker;
pub mod topology;

pub use error::{CoordinateError, ErrorCode, Result};
pub use identity::IdentityRegistry;
pub use model::Model;
pub use model_object::{ObjectId, PositionedTarget, Shape};
pub use point::{MoveArbiter, Point, PointId};
pub use sequence::{ReadingFrame, Sequence, SequenceType};
pub use sequence_walker::{SequenceWalker, WalkSettings};
pub use topology::{Topology, TopologyKind, TopologyRegistry};
