use crate::{
    error::{CoordinateError, Result},
    identity::IdentityRegistry,
    model_object::{ObjectId, PositionedTarget, Shape},
    point::Point,
    sequence_walker::{SequenceWalker, WalkSettings},
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NUCLEOTIDES_PER_AMINO_ACID: usize = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceType {
    #[default]
    Unknown,
    AminoAcid,
    Nucleotide,
}

/// Nucleotide to amino acid alignment.
///
/// Forward frames count from the first nucleotide, reverse frames from the
/// last one. `NoFrame` blocks any frame-based conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadingFrame {
    MinusThree,
    MinusTwo,
    MinusOne,
    NoFrame,
    #[default]
    PlusOne,
    PlusTwo,
    PlusThree,
}

impl ReadingFrame {
    pub const ALL: [ReadingFrame; 6] = [
        ReadingFrame::PlusOne,
        ReadingFrame::PlusTwo,
        ReadingFrame::PlusThree,
        ReadingFrame::MinusOne,
        ReadingFrame::MinusTwo,
        ReadingFrame::MinusThree,
    ];

    pub fn frame(&self) -> i8 {
        match self {
            ReadingFrame::MinusThree => -3,
            ReadingFrame::MinusTwo => -2,
            ReadingFrame::MinusOne => -1,
            ReadingFrame::NoFrame => 0,
            ReadingFrame::PlusOne => 1,
            ReadingFrame::PlusTwo => 2,
            ReadingFrame::PlusThree => 3,
        }
    }

    pub fn from_frame(frame: i8) -> Option<Self> {
        match frame {
            -3 => Some(ReadingFrame::MinusThree),
            -2 => Some(ReadingFrame::MinusTwo),
            -1 => Some(ReadingFrame::MinusOne),
            0 => Some(ReadingFrame::NoFrame),
            1 => Some(ReadingFrame::PlusOne),
            2 => Some(ReadingFrame::PlusTwo),
            3 => Some(ReadingFrame::PlusThree),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn is_forward(&self) -> bool {
        self.frame() > 0
    }

    #[inline(always)]
    pub fn is_reverse(&self) -> bool {
        self.frame() < 0
    }

    /// Nucleotides skipped before the first codon, counted in reading direction.
    fn offset(&self) -> Result<usize> {
        match self.frame() {
            0 => Err(CoordinateError::UnsupportedConversion(
                "no reading frame given".to_string(),
            )),
            f => Ok((f.unsigned_abs() - 1) as usize),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    id: ObjectId,
    sequence_type: SequenceType,
    shape: Shape,
    text: Vec<u8>,
    annotations: Vec<ObjectId>,
}

impl Sequence {
    pub fn new(
        identity: &IdentityRegistry,
        text: &str,
        sequence_type: SequenceType,
        shape: Shape,
    ) -> Self {
        Self::build(identity.allocate(), text, sequence_type, shape)
    }

    pub fn nucleotide(identity: &IdentityRegistry, text: &str, shape: Shape) -> Self {
        Self::new(identity, text, SequenceType::Nucleotide, shape)
    }

    pub fn amino_acid(identity: &IdentityRegistry, text: &str, shape: Shape) -> Self {
        Self::new(identity, text, SequenceType::AminoAcid, shape)
    }

    /// Recreates a sequence under a previously issued identifier.
    pub fn with_identifier(
        identity: &IdentityRegistry,
        id: ObjectId,
        text: &str,
        sequence_type: SequenceType,
        shape: Shape,
    ) -> Result<Self> {
        if !identity.claim(id) {
            return Err(CoordinateError::InvalidArgument(format!(
                "identifier {id} is already in use"
            )));
        }
        Ok(Self::build(id, text, sequence_type, shape))
    }

    fn build(id: ObjectId, text: &str, sequence_type: SequenceType, shape: Shape) -> Self {
        debug!(
            "New {sequence_type:?} sequence {id} ({} elements, {shape:?})",
            text.len()
        );
        Self {
            id,
            sequence_type,
            shape,
            text: text.as_bytes().to_vec(),
            annotations: vec![],
        }
    }

    pub fn sequence_type(&self) -> SequenceType {
        self.sequence_type
    }

    pub fn set_sequence_type(&mut self, sequence_type: SequenceType) {
        self.sequence_type = sequence_type;
    }

    /// Points already placed on a sequence held by a [`Model`](crate::model::Model)
    /// are only kept in range by `Model::set_sequence_shape`.
    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    pub fn set_circular(&mut self, is_circular: bool) {
        self.shape = match is_circular {
            true => Shape::Circular,
            false => Shape::Linear,
        };
    }

    pub fn is_circular(&self) -> bool {
        self.shape == Shape::Circular
    }

    /// Number of elements (nucleotides or residues).
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn get_forward_string(&self) -> String {
        String::from_utf8_lossy(&self.text).to_string()
    }

    pub fn annotations(&self) -> &[ObjectId] {
        &self.annotations
    }

    pub fn add_annotation(&mut self, annotation: ObjectId) {
        if !self.annotations.contains(&annotation) {
            self.annotations.push(annotation);
        }
    }

    #[inline(always)]
    fn boundary_positions(&self) -> i64 {
        match self.shape {
            Shape::Linear => 1,
            Shape::Circular => 0,
        }
    }

    /// The element a point sits on. Only "on" (odd) positions carry an element.
    pub fn char_at(&self, point: &Point) -> Result<char> {
        let position = point.position();
        if point.is_between() {
            return Err(CoordinateError::OutOfRange(format!(
                "elements are located at odd positions, {position} is between elements"
            )));
        }
        if !point.annotates(self) {
            return Err(CoordinateError::InvalidArgument(format!(
                "point annotates object {}, not sequence {}",
                point.target(),
                self.id
            )));
        }
        usize::try_from(position / 2)
            .ok()
            .and_then(|index| self.text.get(index))
            .map(|c| *c as char)
            .ok_or_else(|| {
                CoordinateError::OutOfRange(format!(
                    "position {position} is outside sequence {}",
                    self.id
                ))
            })
    }

    /// Element count of this sequence expressed in `other` units.
    /// Partial codons count as a full amino acid.
    pub fn len_as(&self, other: SequenceType) -> Result<usize> {
        match (self.sequence_type, other) {
            (SequenceType::Nucleotide, SequenceType::AminoAcid) => {
                Ok(self.len().div_ceil(NUCLEOTIDES_PER_AMINO_ACID))
            }
            (SequenceType::AminoAcid, SequenceType::Nucleotide) => {
                Ok(self.len() * NUCLEOTIDES_PER_AMINO_ACID)
            }
            (from, to) => Err(CoordinateError::UnsupportedConversion(format!(
                "cannot convert sizes from {from:?} to {to:?}"
            ))),
        }
    }

    /// Coordinate-space size of this sequence expressed in `other` units.
    pub fn size_as(&self, other: SequenceType) -> Result<i64> {
        Ok(2 * self.len_as(other)? as i64 + self.boundary_positions())
    }

    fn require_nucleotide(&self) -> Result<()> {
        match self.sequence_type {
            SequenceType::Nucleotide => Ok(()),
            other => Err(CoordinateError::UnsupportedConversion(format!(
                "reading frames apply to nucleotide sequences, sequence {} is {other:?}",
                self.id
            ))),
        }
    }

    fn element_index(&self, position: i64) -> Result<usize> {
        if position % 2 == 0 || position < 0 || position >= self.size() {
            return Err(CoordinateError::OutOfRange(format!(
                "{position} is not an element position of sequence {}",
                self.id
            )));
        }
        usize::try_from(position / 2).map_err(|e| CoordinateError::OutOfRange(e.to_string()))
    }

    /// Maps a nucleotide "on" position to the "on" position of the codon
    /// containing it, in the amino acid space of `frame`.
    pub fn protein_position(&self, position: i64, frame: ReadingFrame) -> Result<i64> {
        self.require_nucleotide()?;
        let offset = frame.offset()?;
        let index = self.element_index(position)?;
        let index = match frame.is_forward() {
            true => index,
            false => self.len() - 1 - index,
        };
        if index < offset {
            return Err(CoordinateError::OutOfRange(format!(
                "position {position} precedes the first codon of frame {}",
                frame.frame()
            )));
        }
        let codon = (index - offset) / NUCLEOTIDES_PER_AMINO_ACID;
        Ok(2 * codon as i64 + 1)
    }

    /// Maps an amino acid "on" position in `frame` to the "on" position of the
    /// first nucleotide of its codon, as read in the frame's direction.
    pub fn nucleotide_position(&self, position: i64, frame: ReadingFrame) -> Result<i64> {
        self.require_nucleotide()?;
        let offset = frame.offset()?;
        if position % 2 == 0 || position < 0 {
            return Err(CoordinateError::OutOfRange(format!(
                "{position} is not an amino acid position"
            )));
        }
        let codon = (position / 2) as usize;
        let index = codon * NUCLEOTIDES_PER_AMINO_ACID + offset;
        if index >= self.len() {
            return Err(CoordinateError::OutOfRange(format!(
                "codon {codon} of frame {} is beyond sequence {}",
                frame.frame(),
                self.id
            )));
        }
        let index = match frame.is_forward() {
            true => index,
            false => self.len() - 1 - index,
        };
        Ok(2 * index as i64 + 1)
    }

    /// Windows of one element each, stepping element by element.
    pub fn walk(&self, start: i64) -> Result<SequenceWalker<'_>> {
        self.walk_with(start, WalkSettings::default())
    }

    pub fn walk_with(&self, start: i64, settings: WalkSettings) -> Result<SequenceWalker<'_>> {
        SequenceWalker::new(self, start, settings)
    }

    /// Complete codons of `frame`. Reverse frames walk from the end towards
    /// the start and yield the bases as read, without complementing.
    pub fn codons(&self, frame: ReadingFrame) -> Result<SequenceWalker<'_>> {
        self.require_nucleotide()?;
        let start = self.nucleotide_position(1, frame)?;
        let step_size = match frame.is_forward() {
            true => 2,
            false => -2,
        };
        self.walk_with(
            start,
            WalkSettings {
                step_size,
                slice_size: NUCLEOTIDES_PER_AMINO_ACID,
                allow_incomplete: false,
            },
        )
    }
}

impl PositionedTarget for Sequence {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn size(&self) -> i64 {
        2 * self.len() as i64 + self.boundary_positions()
    }

    fn children(&self) -> Vec<ObjectId> {
        self.annotations.clone()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.text))
    }
}
