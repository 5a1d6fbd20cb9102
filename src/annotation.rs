//! The surface annotations present to the coordinate model.
//!
//! Annotation records themselves live outside this crate; the model only
//! needs to know which objects they annotate, which topologies carry their
//! points, and their documentation.

use crate::model_object::{ObjectId, PositionedTarget};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationField {
    data: Option<String>,
}

impl DocumentationField {
    pub fn set(&mut self, data: impl Into<String>) {
        self.data = Some(data.into());
    }

    pub fn get(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn unset(&mut self) {
        self.data = None;
    }

    pub fn is_set(&self) -> bool {
        self.data.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationDocumentation {
    pub publication: DocumentationField,
    pub link: DocumentationField,
    pub title: DocumentationField,
    pub caption: DocumentationField,
    pub doi: DocumentationField,
}

impl AnnotationDocumentation {
    pub fn is_empty(&self) -> bool {
        [
            &self.publication,
            &self.link,
            &self.title,
            &self.caption,
            &self.doi,
        ]
        .iter()
        .all(|field| !field.is_set())
    }
}

pub trait Annotation {
    /// Objects this annotation is placed on.
    fn annotates(&self) -> Vec<ObjectId>;

    fn is_allowed_annotation(&self, target: &dyn PositionedTarget) -> bool;

    fn documentation(&self) -> &AnnotationDocumentation;

    /// Topologies holding this annotation's points on `target`.
    fn topologies(&self, target: ObjectId) -> Vec<ObjectId>;

    fn all_topologies(&self) -> Vec<ObjectId>;
}
