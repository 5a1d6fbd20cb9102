//! Topologies group points and arbitrate their moves.
//!
//! Registered topologies form a tree: each one lists its child topologies by
//! id, the owning model holds the nodes. An orphan topology never registers;
//! it hosts scratch points that must stay invisible to the rest of the model.

use crate::{
    error::{CoordinateError, Result},
    identity::IdentityRegistry,
    model_object::{ObjectId, PositionedTarget},
    point::{MoveArbiter, Point, PointId, offset_position},
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Maximum number of points a singularity holds.
pub const SINGULARITY_MAX_POINTS: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopologyKind {
    /// No restrictions.
    Plain,
    /// Outside the tree and the model; holds transient points.
    Orphan,
    /// Single-position features such as a translation start.
    Singularity { max: usize },
}

/// The model side of topology construction.
pub trait TopologyRegistry {
    fn identity(&self) -> &IdentityRegistry;

    /// Takes ownership of a newly constructed topology.
    fn register(&mut self, id: ObjectId, topology: Topology);
}

#[derive(Clone, Debug)]
pub struct Topology {
    id: Option<ObjectId>,
    kind: TopologyKind,
    caption: String,
    points: Vec<Point>,
    children: Vec<ObjectId>,
    next_point: u64,
}

impl Topology {
    fn with_kind(kind: TopologyKind) -> Self {
        Self {
            id: None,
            kind,
            caption: String::new(),
            points: vec![],
            children: vec![],
            next_point: 0,
        }
    }

    fn attached(registry: &mut dyn TopologyRegistry, kind: TopologyKind, caption: &str) -> ObjectId {
        let id = registry.identity().allocate();
        let mut topology = Self::with_kind(kind);
        topology.id = Some(id);
        topology.caption = caption.to_string();
        debug!("Registering {kind:?} topology {id} '{caption}'");
        registry.register(id, topology);
        id
    }

    /// Creates an unrestricted topology and registers it with `registry`.
    pub fn plain(registry: &mut dyn TopologyRegistry, caption: &str) -> ObjectId {
        Self::attached(registry, TopologyKind::Plain, caption)
    }

    /// Creates a topology that accepts a single point and registers it with `registry`.
    pub fn singularity(registry: &mut dyn TopologyRegistry, caption: &str) -> ObjectId {
        Self::attached(
            registry,
            TopologyKind::Singularity {
                max: SINGULARITY_MAX_POINTS,
            },
            caption,
        )
    }

    pub fn orphan() -> Self {
        Self::with_kind(TopologyKind::Orphan)
    }

    /// `None` for orphans.
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    pub fn is_orphan(&self) -> bool {
        self.kind == TopologyKind::Orphan
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    pub fn child_topologies(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn add_child(&mut self, child: ObjectId) -> bool {
        self.children.push(child);
        true
    }

    pub fn remove_child(&mut self, child: ObjectId) -> bool {
        match self.children.iter().position(|c| *c == child) {
            Some(index) => {
                self.children.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.iter().find(|p| p.id() == Some(id))
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Points placed on `target`.
    pub fn points_of(&self, target: &dyn PositionedTarget) -> impl Iterator<Item = &Point> {
        let target = target.id();
        self.points.iter().filter(move |p| p.target() == target)
    }

    /// Points placed on `target` at exactly `position`.
    pub fn point_at(
        &self,
        target: &dyn PositionedTarget,
        position: i64,
    ) -> impl Iterator<Item = &Point> {
        let target = target.id();
        self.points
            .iter()
            .filter(move |p| p.target() == target && p.position() == position)
    }

    fn accepts_point(&self) -> bool {
        match self.kind {
            TopologyKind::Plain | TopologyKind::Orphan => true,
            TopologyKind::Singularity { max } => self.points.len() < max,
        }
    }

    /// Takes ownership of `point`. Returns `None` and drops the point if this
    /// topology refuses it.
    pub fn add_point(&mut self, mut point: Point) -> Option<PointId> {
        if !self.accepts_point() {
            debug!(
                "{:?} topology '{}' refused another point",
                self.kind, self.caption
            );
            return None;
        }
        let id = PointId::new(self.next_point);
        self.next_point += 1;
        point.attach(id, self.id);
        self.points.push(point);
        Some(id)
    }

    /// Hands the point back to the caller, or `None` if it is not held here.
    pub fn remove_point(&mut self, id: PointId) -> Option<Point> {
        let index = self.points.iter().position(|p| p.id() == Some(id))?;
        let mut point = self.points.remove(index);
        point.detach();
        Some(point)
    }

    /// Moves a held point to `raw`, subject to [`MoveArbiter::allow_move`].
    pub fn set_point_position(
        &mut self,
        id: PointId,
        raw: i64,
        target: &dyn PositionedTarget,
    ) -> Result<bool> {
        let index = self.index_of(id)?;
        let (candidate, did_wrap) = self.points[index].candidate(raw, target)?;
        if !self.allow_move(&self.points[index], candidate) {
            trace!("Topology '{}' refused move of {id} to {candidate}", self.caption);
            return Ok(false);
        }
        self.points[index].commit(candidate, did_wrap);
        Ok(true)
    }

    /// Moves a held point by `steps` of its own step size.
    pub fn move_point_by(
        &mut self,
        id: PointId,
        steps: i64,
        target: &dyn PositionedTarget,
    ) -> Result<bool> {
        let index = self.index_of(id)?;
        let point = &self.points[index];
        let raw = offset_position(point.position(), point.step_size(), steps, target);
        self.set_point_position(id, raw, target)
    }

    /// Brings points on `target` that fell outside its coordinate space back
    /// in, e.g. after the target changed shape. Returns how many moved.
    pub(crate) fn renormalize_points(&mut self, target: &dyn PositionedTarget) -> Result<usize> {
        let mut moved = 0;
        for point in self.points.iter_mut().filter(|p| p.annotates(target)) {
            if (0..target.size()).contains(&point.position()) {
                continue;
            }
            let (position, did_wrap) = point.candidate(point.position(), target)?;
            trace!(
                "Point on {} moved from {} to {position} in topology '{}'",
                target.id(),
                point.position(),
                self.caption
            );
            point.commit(position, did_wrap);
            moved += 1;
        }
        Ok(moved)
    }

    fn index_of(&self, id: PointId) -> Result<usize> {
        self.points
            .iter()
            .position(|p| p.id() == Some(id))
            .ok_or_else(|| {
                CoordinateError::InvalidArgument(format!(
                    "point {id} is not held by topology '{}'",
                    self.caption
                ))
            })
    }
}

impl MoveArbiter for Topology {
    fn allow_move(&self, _point: &Point, _candidate: i64) -> bool {
        match self.kind {
            // Singularities restrict how many points they hold, not where they go.
            TopologyKind::Plain | TopologyKind::Orphan | TopologyKind::Singularity { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model_object::Shape, sequence::Sequence};
    use std::collections::HashMap;

    #[derive(Default)]
    struct Catalog {
        identity: IdentityRegistry,
        topologies: HashMap<ObjectId, Topology>,
    }

    impl TopologyRegistry for Catalog {
        fn identity(&self) -> &IdentityRegistry {
            &self.identity
        }

        fn register(&mut self, id: ObjectId, topology: Topology) {
            self.topologies.insert(id, topology);
        }
    }

    fn sequence(catalog: &Catalog, text: &str, shape: Shape) -> Sequence {
        Sequence::nucleotide(&catalog.identity, text, shape)
    }

    #[test]
    fn test_attached_topologies_register_once() {
        let mut catalog = Catalog::default();
        let a = Topology::plain(&mut catalog, "promoter");
        let b = Topology::singularity(&mut catalog, "start");
        assert_ne!(a, b);
        assert_eq!(catalog.topologies.len(), 2);
        assert_eq!(catalog.topologies[&a].caption(), "promoter");
        assert_eq!(catalog.topologies[&a].id(), Some(a));
        assert_eq!(
            catalog.topologies[&b].kind(),
            TopologyKind::Singularity { max: 1 }
        );
    }

    #[test]
    fn test_orphan_does_not_register() {
        let catalog = Catalog::default();
        let orphan = Topology::orphan();
        assert!(orphan.is_orphan());
        assert_eq!(orphan.id(), None);
        assert_eq!(catalog.identity.issued_count(), 0);
    }

    #[test]
    fn test_add_and_remove_points() {
        let catalog = Catalog::default();
        let dna = sequence(&catalog, "ACGTACGT", Shape::Linear);
        let mut topology = Topology::orphan();
        let a = topology.add_point(Point::new(&dna, 1).unwrap()).unwrap();
        let b = topology.add_point(Point::new(&dna, 5).unwrap()).unwrap();
        assert_ne!(a, b);
        assert_eq!(topology.point_count(), 2);
        assert_eq!(topology.point(a).unwrap().id(), Some(a));

        let removed = topology.remove_point(a).unwrap();
        assert_eq!(removed.position(), 1);
        assert_eq!(removed.id(), None);
        assert!(topology.remove_point(a).is_none());
        assert_eq!(topology.point_count(), 1);
    }

    #[test]
    fn test_points_record_registered_topology() {
        let mut catalog = Catalog::default();
        let dna = sequence(&catalog, "ACGT", Shape::Circular);
        let id = Topology::plain(&mut catalog, "site");
        let topology = catalog.topologies.get_mut(&id).unwrap();
        let point_id = topology.add_point(Point::new(&dna, 3).unwrap()).unwrap();
        assert_eq!(topology.point(point_id).unwrap().topology(), Some(id));
    }

    #[test]
    fn test_singularity_accepts_exactly_one_point() {
        let mut catalog = Catalog::default();
        let dna = sequence(&catalog, "ATGAAATAG", Shape::Linear);
        let id = Topology::singularity(&mut catalog, "start codon");
        let topology = catalog.topologies.get_mut(&id).unwrap();
        assert!(topology.add_point(Point::new(&dna, 1).unwrap()).is_some());
        for position in [3, 5, 7] {
            assert!(topology.add_point(Point::new(&dna, position).unwrap()).is_none());
        }
        assert_eq!(topology.point_count(), 1);
        assert_eq!(topology.points().next().unwrap().position(), 1);
    }

    #[test]
    fn test_singularity_moves_freely() {
        let mut catalog = Catalog::default();
        let dna = sequence(&catalog, "ATGAAATAG", Shape::Linear);
        let id = Topology::singularity(&mut catalog, "start codon");
        let topology = catalog.topologies.get_mut(&id).unwrap();
        let point = topology.add_point(Point::new(&dna, 1).unwrap()).unwrap();
        assert!(topology.move_point_by(point, 3, &dna).unwrap());
        assert_eq!(topology.point(point).unwrap().position(), 7);
    }

    #[test]
    fn test_filter_by_target_and_position() {
        let catalog = Catalog::default();
        let first = sequence(&catalog, "ACGT", Shape::Linear);
        let second = sequence(&catalog, "TTTT", Shape::Linear);
        let mut topology = Topology::orphan();
        topology.add_point(Point::new(&first, 1).unwrap());
        topology.add_point(Point::new(&first, 3).unwrap());
        topology.add_point(Point::new(&second, 3).unwrap());

        assert_eq!(topology.points().count(), 3);
        assert_eq!(topology.points_of(&first).count(), 2);
        assert_eq!(topology.points_of(&second).count(), 1);
        assert_eq!(topology.point_at(&first, 3).count(), 1);
        assert_eq!(topology.point_at(&second, 1).count(), 0);
        assert!(topology.point_at(&second, 3).all(|p| p.annotates(&second)));
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut topology = Topology::orphan();
        let ids = [ObjectId::new(4), ObjectId::new(2), ObjectId::new(9)];
        for id in ids {
            assert!(topology.add_child(id));
        }
        assert_eq!(topology.child_topologies(), &ids);
        assert!(topology.remove_child(ObjectId::new(2)));
        assert!(!topology.remove_child(ObjectId::new(2)));
        assert_eq!(
            topology.child_topologies(),
            &[ObjectId::new(4), ObjectId::new(9)]
        );
    }

    #[test]
    fn test_caption() {
        let mut topology = Topology::orphan();
        assert_eq!(topology.caption(), "");
        topology.set_caption("lacZ");
        assert_eq!(topology.caption(), "lacZ");
    }

    #[test]
    fn test_set_point_position_wraps_on_circular_target() {
        let catalog = Catalog::default();
        let dna = sequence(&catalog, "ACGT", Shape::Circular);
        let mut topology = Topology::orphan();
        let id = topology.add_point(Point::new(&dna, 1).unwrap()).unwrap();
        assert!(topology.set_point_position(id, 11, &dna).unwrap());
        let point = topology.point(id).unwrap();
        assert_eq!(point.position(), 3);
        assert!(point.did_wrap());
    }

    #[test]
    fn test_unknown_point_is_invalid_argument() {
        let catalog = Catalog::default();
        let dna = sequence(&catalog, "ACGT", Shape::Linear);
        let mut topology = Topology::orphan();
        assert!(matches!(
            topology.set_point_position(PointId::new(3), 1, &dna),
            Err(CoordinateError::InvalidArgument(_))
        ));
    }
}
