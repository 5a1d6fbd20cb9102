//! The arena holding sequences and registered topologies.
//!
//! Points refer to their sequence and topology by id only; moving a point
//! through the model looks both up and lets the topology arbitrate.

use crate::{
    error::{CoordinateError, Result},
    identity::IdentityRegistry,
    model_object::{ObjectId, PositionedTarget, Shape},
    parameters::ModelParameters,
    point::{Point, PointId},
    sequence::{Sequence, SequenceType},
    sequence_walker::SequenceWalker,
    topology::{Topology, TopologyRegistry},
};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct Model {
    identity: IdentityRegistry,
    parameters: ModelParameters,
    sequences: HashMap<ObjectId, Sequence>,
    topologies: HashMap<ObjectId, Topology>,
    registration_order: Vec<ObjectId>,
    updating: BTreeSet<ObjectId>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model sharing identifiers with other holders of `identity`.
    pub fn with_identity(identity: IdentityRegistry) -> Self {
        Self {
            identity,
            ..Self::default()
        }
    }

    pub fn with_parameters(parameters: ModelParameters) -> Result<Self> {
        parameters.validate()?;
        Ok(Self {
            parameters,
            ..Self::default()
        })
    }

    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    pub fn add_sequence(&mut self, text: &str, sequence_type: SequenceType, shape: Shape) -> ObjectId {
        let sequence = Sequence::new(&self.identity, text, sequence_type, shape);
        let id = sequence.id();
        self.sequences.insert(id, sequence);
        id
    }

    /// Adds a sequence built elsewhere, e.g. reloaded with
    /// [`Sequence::with_identifier`] against this model's registry.
    pub fn insert_sequence(&mut self, sequence: Sequence) -> Result<ObjectId> {
        let id = sequence.id();
        if self.sequences.contains_key(&id) || self.topologies.contains_key(&id) {
            return Err(CoordinateError::InvalidArgument(format!(
                "object {id} is already part of the model"
            )));
        }
        self.sequences.insert(id, sequence);
        Ok(id)
    }

    pub fn sequence(&self, id: ObjectId) -> Option<&Sequence> {
        self.sequences.get(&id)
    }

    pub fn sequence_mut(&mut self, id: ObjectId) -> Option<&mut Sequence> {
        self.sequences.get_mut(&id)
    }

    pub fn topology(&self, id: ObjectId) -> Option<&Topology> {
        self.topologies.get(&id)
    }

    pub fn topology_mut(&mut self, id: ObjectId) -> Option<&mut Topology> {
        self.topologies.get_mut(&id)
    }

    /// Registered topologies in registration order.
    pub fn topologies(&self) -> impl Iterator<Item = &Topology> {
        self.registration_order
            .iter()
            .filter_map(|id| self.topologies.get(id))
    }

    pub fn parent_of(&self, child: ObjectId) -> Option<ObjectId> {
        self.topologies()
            .find(|t| t.child_topologies().contains(&child))
            .and_then(|t| t.id())
    }

    /// Registered topologies without a parent.
    pub fn roots(&self) -> Vec<ObjectId> {
        self.registration_order
            .iter()
            .copied()
            .filter(|id| self.parent_of(*id).is_none())
            .collect()
    }

    fn is_descendant(&self, node: ObjectId, ancestor: ObjectId) -> bool {
        let mut current = node;
        while let Some(parent) = self.parent_of(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Places `child` under `parent`, detaching it from its previous parent.
    /// Returns `false` if this would create a cycle.
    pub fn adopt(&mut self, parent: ObjectId, child: ObjectId) -> Result<bool> {
        for id in [parent, child] {
            if !self.topologies.contains_key(&id) {
                return Err(CoordinateError::InvalidArgument(format!(
                    "topology {id} is not registered"
                )));
            }
        }
        if parent == child || self.is_descendant(parent, child) {
            debug!("Refusing to place topology {child} under its own descendant {parent}");
            return Ok(false);
        }
        if let Some(previous) = self.parent_of(child) {
            if let Some(previous) = self.topologies.get_mut(&previous) {
                previous.remove_child(child);
            }
        }
        Ok(self
            .topologies
            .get_mut(&parent)
            .is_some_and(|p| p.add_child(child)))
    }

    fn topology_entry(&mut self, id: ObjectId) -> Result<&mut Topology> {
        self.topologies.get_mut(&id).ok_or_else(|| {
            CoordinateError::InvalidArgument(format!("topology {id} is not registered"))
        })
    }

    fn sequence_entry(sequences: &HashMap<ObjectId, Sequence>, id: ObjectId) -> Result<&Sequence> {
        sequences
            .get(&id)
            .ok_or_else(|| CoordinateError::InvalidArgument(format!("sequence {id} is unknown")))
    }

    /// Creates a point on `sequence` and hands it to `topology`.
    /// `Ok(None)` means the topology refused it.
    pub fn create_point(
        &mut self,
        topology: ObjectId,
        sequence: ObjectId,
        position: i64,
        step_size: Option<i64>,
    ) -> Result<Option<PointId>> {
        let step_size = step_size.unwrap_or(self.parameters.default_step_size);
        let point = {
            let sequence = Self::sequence_entry(&self.sequences, sequence)?;
            Point::with_step_size(sequence, position, step_size)?
        };
        Ok(self.topology_entry(topology)?.add_point(point))
    }

    pub fn point(&self, topology: ObjectId, point: PointId) -> Option<&Point> {
        self.topologies.get(&topology)?.point(point)
    }

    fn point_target(&self, topology: ObjectId, point: PointId) -> Result<ObjectId> {
        self.point(topology, point)
            .map(|p| p.target())
            .ok_or_else(|| {
                CoordinateError::InvalidArgument(format!(
                    "point {point} is not held by topology {topology}"
                ))
            })
    }

    pub fn set_point_position(
        &mut self,
        topology: ObjectId,
        point: PointId,
        raw: i64,
    ) -> Result<bool> {
        let target = self.point_target(topology, point)?;
        let sequence = Self::sequence_entry(&self.sequences, target)?;
        let holder = self.topologies.get_mut(&topology).ok_or_else(|| {
            CoordinateError::InvalidArgument(format!("topology {topology} is not registered"))
        })?;
        holder.set_point_position(point, raw, sequence)
    }

    pub fn move_point_by(&mut self, topology: ObjectId, point: PointId, steps: i64) -> Result<bool> {
        let target = self.point_target(topology, point)?;
        let sequence = Self::sequence_entry(&self.sequences, target)?;
        let holder = self.topologies.get_mut(&topology).ok_or_else(|| {
            CoordinateError::InvalidArgument(format!("topology {topology} is not registered"))
        })?;
        holder.move_point_by(point, steps, sequence)
    }

    pub fn char_at(&self, topology: ObjectId, point: PointId) -> Result<char> {
        let target = self.point_target(topology, point)?;
        let sequence = Self::sequence_entry(&self.sequences, target)?;
        let point = self.point(topology, point).ok_or_else(|| {
            CoordinateError::InvalidArgument(format!("point {point} vanished"))
        })?;
        sequence.char_at(point)
    }

    /// Changes the shape of `sequence` and pulls points that no longer fit
    /// back into its coordinate space. Returns the number of points moved.
    ///
    /// Refused without any change if a point's step size would not be
    /// smaller than the new size.
    pub fn set_sequence_shape(&mut self, sequence: ObjectId, shape: Shape) -> Result<usize> {
        let current = self
            .sequences
            .get_mut(&sequence)
            .ok_or_else(|| CoordinateError::InvalidArgument(format!("sequence {sequence} is unknown")))?;
        if current.shape() == shape {
            return Ok(0);
        }
        let mut reshaped = current.clone();
        reshaped.set_shape(shape);
        let new_size = reshaped.size();
        let reshaped = &reshaped;
        let too_coarse = self
            .topologies
            .values()
            .flat_map(move |t| t.points_of(reshaped))
            .find(|p| p.step_size() >= new_size);
        if let Some(point) = too_coarse {
            return Err(CoordinateError::InvalidConfiguration(format!(
                "step size {} of a point on sequence {sequence} does not fit size {new_size}",
                point.step_size()
            )));
        }
        current.set_shape(shape);
        let current = Self::sequence_entry(&self.sequences, sequence)?;
        let mut moved = 0;
        for topology in self.topologies.values_mut() {
            moved += topology.renormalize_points(current)?;
        }
        debug!("Sequence {sequence} is now {shape:?}, {moved} point(s) renormalized");
        Ok(moved)
    }

    /// Marks `object` as being updated. Returns `false` if it already was.
    pub fn begin_update(&mut self, object: ObjectId) -> bool {
        let started = self.updating.insert(object);
        match started {
            true => debug!("Update of object {object} started"),
            false => warn!("Object {object} is already being updated"),
        }
        started
    }

    /// Returns `false` if `object` was not being updated.
    pub fn finish_update(&mut self, object: ObjectId) -> bool {
        let finished = self.updating.remove(&object);
        match finished {
            true => debug!(
                "Update of object {object} finished, {} still running",
                self.updating.len()
            ),
            false => warn!("Object {object} was not being updated"),
        }
        finished
    }

    /// Whether any object is in the middle of an update.
    pub fn is_updating(&self) -> bool {
        !self.updating.is_empty()
    }

    pub fn is_object_updating(&self, object: ObjectId) -> bool {
        self.updating.contains(&object)
    }

    pub fn updating_objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.updating.iter().copied()
    }

    /// Walks `sequence` from `start` using the model's walk settings.
    pub fn walk(&self, sequence: ObjectId, start: i64) -> Result<SequenceWalker<'_>> {
        Self::sequence_entry(&self.sequences, sequence)?.walk_with(start, self.parameters.walk)
    }
}

impl TopologyRegistry for Model {
    fn identity(&self) -> &IdentityRegistry {
        &self.identity
    }

    fn register(&mut self, id: ObjectId, topology: Topology) {
        self.registration_order.push(id);
        self.topologies.insert(id, topology);
    }
}
