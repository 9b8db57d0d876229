//! Persisted entity records, the snapshot sum type, and field-level changes.

use serde::{Deserialize, Serialize};

use crate::types::{
    ClassifierType, DiagramType, EntityKind, FeatureType, RelationshipType, RowId, ROW_ID_VOID,
};

/// A diagram; `parent_id == ROW_ID_VOID` marks a root diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramRecord {
    /// Row id.
    pub id: RowId,
    /// Parent diagram, or [`ROW_ID_VOID`] for the root.
    pub parent_id: RowId,
    /// Diagram flavor.
    pub diagram_type: DiagramType,
    /// Stereotype text.
    pub stereotype: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Position among siblings.
    pub list_order: i32,
    /// Display flag bits.
    pub display_flags: i64,
    /// Stable external identifier.
    pub uuid: String,
}

impl DiagramRecord {
    /// A not-yet-persisted diagram with empty texts.
    pub fn new(parent_id: RowId, diagram_type: DiagramType, name: impl Into<String>) -> Self {
        Self {
            id: ROW_ID_VOID,
            parent_id,
            diagram_type,
            stereotype: String::new(),
            name: name.into(),
            description: String::new(),
            list_order: 0,
            display_flags: 0,
            uuid: String::new(),
        }
    }

    /// True when this diagram has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id == ROW_ID_VOID
    }
}

/// Placement of a classifier on a diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramElementRecord {
    /// Row id.
    pub id: RowId,
    /// Owning diagram.
    pub diagram_id: RowId,
    /// Shown classifier.
    pub classifier_id: RowId,
    /// Display flag bits.
    pub display_flags: i64,
    /// Highlighted feature (e.g. a lifeline), or [`ROW_ID_VOID`].
    pub focused_feature_id: RowId,
    /// Stable external identifier.
    pub uuid: String,
}

impl DiagramElementRecord {
    /// A not-yet-persisted element linking `diagram_id` and `classifier_id`.
    pub fn new(diagram_id: RowId, classifier_id: RowId) -> Self {
        Self {
            id: ROW_ID_VOID,
            diagram_id,
            classifier_id,
            display_flags: 0,
            focused_feature_id: ROW_ID_VOID,
            uuid: String::new(),
        }
    }
}

/// A model classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRecord {
    /// Row id.
    pub id: RowId,
    /// Classifier flavor.
    pub main_type: ClassifierType,
    /// Stereotype text.
    pub stereotype: String,
    /// Display name, unique per store.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Horizontal placement order.
    pub x_order: i32,
    /// Vertical placement order.
    pub y_order: i32,
    /// List position.
    pub list_order: i32,
    /// Stable external identifier.
    pub uuid: String,
}

impl ClassifierRecord {
    /// A not-yet-persisted classifier with empty texts.
    pub fn new(main_type: ClassifierType, name: impl Into<String>) -> Self {
        Self {
            id: ROW_ID_VOID,
            main_type,
            stereotype: String::new(),
            name: name.into(),
            description: String::new(),
            x_order: 0,
            y_order: 0,
            list_order: 0,
            uuid: String::new(),
        }
    }
}

/// A feature (property, operation, port, ...) owned by a classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Row id.
    pub id: RowId,
    /// Feature flavor.
    pub main_type: FeatureType,
    /// Owning classifier.
    pub classifier_id: RowId,
    /// Feature name.
    pub key: String,
    /// Type or value text.
    pub value: String,
    /// Free-text description.
    pub description: String,
    /// List position.
    pub list_order: i32,
    /// Stable external identifier.
    pub uuid: String,
}

impl FeatureRecord {
    /// A not-yet-persisted feature of `classifier_id`.
    pub fn new(classifier_id: RowId, main_type: FeatureType, key: impl Into<String>) -> Self {
        Self {
            id: ROW_ID_VOID,
            main_type,
            classifier_id,
            key: key.into(),
            value: String::new(),
            description: String::new(),
            list_order: 0,
            uuid: String::new(),
        }
    }
}

/// A directed relationship between two classifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Row id.
    pub id: RowId,
    /// Relationship flavor.
    pub main_type: RelationshipType,
    /// Source classifier.
    pub from_classifier_id: RowId,
    /// Destination classifier.
    pub to_classifier_id: RowId,
    /// Source feature, or [`ROW_ID_VOID`].
    pub from_feature_id: RowId,
    /// Destination feature, or [`ROW_ID_VOID`].
    pub to_feature_id: RowId,
    /// Stereotype text.
    pub stereotype: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// List position.
    pub list_order: i32,
    /// Stable external identifier.
    pub uuid: String,
}

impl RelationshipRecord {
    /// A not-yet-persisted relationship between two classifiers.
    pub fn new(main_type: RelationshipType, from_classifier_id: RowId, to_classifier_id: RowId) -> Self {
        Self {
            id: ROW_ID_VOID,
            main_type,
            from_classifier_id,
            to_classifier_id,
            from_feature_id: ROW_ID_VOID,
            to_feature_id: ROW_ID_VOID,
            stereotype: String::new(),
            name: String::new(),
            description: String::new(),
            list_order: 0,
            uuid: String::new(),
        }
    }
}

/// Full copy of one entity's persisted fields at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntitySnapshot {
    /// Diagram row.
    Diagram(DiagramRecord),
    /// Diagram element row.
    DiagramElement(DiagramElementRecord),
    /// Classifier row.
    Classifier(ClassifierRecord),
    /// Feature row.
    Feature(FeatureRecord),
    /// Relationship row.
    Relationship(RelationshipRecord),
}

impl EntitySnapshot {
    /// Entity kind of the wrapped record.
    pub fn kind(&self) -> EntityKind {
        match self {
            EntitySnapshot::Diagram(_) => EntityKind::Diagram,
            EntitySnapshot::DiagramElement(_) => EntityKind::DiagramElement,
            EntitySnapshot::Classifier(_) => EntityKind::Classifier,
            EntitySnapshot::Feature(_) => EntityKind::Feature,
            EntitySnapshot::Relationship(_) => EntityKind::Relationship,
        }
    }

    /// Row id of the wrapped record.
    pub fn id(&self) -> RowId {
        match self {
            EntitySnapshot::Diagram(r) => r.id,
            EntitySnapshot::DiagramElement(r) => r.id,
            EntitySnapshot::Classifier(r) => r.id,
            EntitySnapshot::Feature(r) => r.id,
            EntitySnapshot::Relationship(r) => r.id,
        }
    }

    /// Overwrites the row id of the wrapped record.
    pub fn set_id(&mut self, id: RowId) {
        match self {
            EntitySnapshot::Diagram(r) => r.id = id,
            EntitySnapshot::DiagramElement(r) => r.id = id,
            EntitySnapshot::Classifier(r) => r.id = id,
            EntitySnapshot::Feature(r) => r.id = id,
            EntitySnapshot::Relationship(r) => r.id = id,
        }
    }

    /// Stable external identifier of the wrapped record.
    pub fn uuid(&self) -> &str {
        match self {
            EntitySnapshot::Diagram(r) => &r.uuid,
            EntitySnapshot::DiagramElement(r) => &r.uuid,
            EntitySnapshot::Classifier(r) => &r.uuid,
            EntitySnapshot::Feature(r) => &r.uuid,
            EntitySnapshot::Relationship(r) => &r.uuid,
        }
    }

    pub(crate) fn uuid_mut(&mut self) -> &mut String {
        match self {
            EntitySnapshot::Diagram(r) => &mut r.uuid,
            EntitySnapshot::DiagramElement(r) => &mut r.uuid,
            EntitySnapshot::Classifier(r) => &mut r.uuid,
            EntitySnapshot::Feature(r) => &mut r.uuid,
            EntitySnapshot::Relationship(r) => &mut r.uuid,
        }
    }

    /// Returns the diagram record, if this is one.
    pub fn as_diagram(&self) -> Option<&DiagramRecord> {
        match self {
            EntitySnapshot::Diagram(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the diagram element record, if this is one.
    pub fn as_diagram_element(&self) -> Option<&DiagramElementRecord> {
        match self {
            EntitySnapshot::DiagramElement(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the classifier record, if this is one.
    pub fn as_classifier(&self) -> Option<&ClassifierRecord> {
        match self {
            EntitySnapshot::Classifier(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the feature record, if this is one.
    pub fn as_feature(&self) -> Option<&FeatureRecord> {
        match self {
            EntitySnapshot::Feature(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the relationship record, if this is one.
    pub fn as_relationship(&self) -> Option<&RelationshipRecord> {
        match self {
            EntitySnapshot::Relationship(r) => Some(r),
            _ => None,
        }
    }
}

impl From<DiagramRecord> for EntitySnapshot {
    fn from(value: DiagramRecord) -> Self {
        Self::Diagram(value)
    }
}

impl From<DiagramElementRecord> for EntitySnapshot {
    fn from(value: DiagramElementRecord) -> Self {
        Self::DiagramElement(value)
    }
}

impl From<ClassifierRecord> for EntitySnapshot {
    fn from(value: ClassifierRecord) -> Self {
        Self::Classifier(value)
    }
}

impl From<FeatureRecord> for EntitySnapshot {
    fn from(value: FeatureRecord) -> Self {
        Self::Feature(value)
    }
}

impl From<RelationshipRecord> for EntitySnapshot {
    fn from(value: RelationshipRecord) -> Self {
        Self::Relationship(value)
    }
}

/// Updatable diagram fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagramField {
    /// Move under another parent.
    ParentId(RowId),
    /// Change flavor.
    DiagramType(DiagramType),
    /// Replace stereotype.
    Stereotype(String),
    /// Rename.
    Name(String),
    /// Replace description.
    Description(String),
    /// Reorder.
    ListOrder(i32),
    /// Replace display flags.
    DisplayFlags(i64),
}

/// Updatable diagram element fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagramElementField {
    /// Replace display flags.
    DisplayFlags(i64),
    /// Change the focused feature.
    FocusedFeatureId(RowId),
}

/// Updatable classifier fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifierField {
    /// Change flavor.
    MainType(ClassifierType),
    /// Replace stereotype.
    Stereotype(String),
    /// Rename.
    Name(String),
    /// Replace description.
    Description(String),
    /// Horizontal placement.
    XOrder(i32),
    /// Vertical placement.
    YOrder(i32),
    /// List position.
    ListOrder(i32),
}

/// Updatable feature fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureField {
    /// Change flavor.
    MainType(FeatureType),
    /// Rename.
    Key(String),
    /// Replace type/value text.
    Value(String),
    /// Replace description.
    Description(String),
    /// List position.
    ListOrder(i32),
}

/// Updatable relationship fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipField {
    /// Change flavor.
    MainType(RelationshipType),
    /// Replace stereotype.
    Stereotype(String),
    /// Rename.
    Name(String),
    /// Replace description.
    Description(String),
    /// List position.
    ListOrder(i32),
}

/// One field-level update of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldChange {
    /// Diagram field.
    Diagram(DiagramField),
    /// Diagram element field.
    DiagramElement(DiagramElementField),
    /// Classifier field.
    Classifier(ClassifierField),
    /// Feature field.
    Feature(FeatureField),
    /// Relationship field.
    Relationship(RelationshipField),
}

impl FieldChange {
    /// Entity kind this change targets.
    pub fn kind(&self) -> EntityKind {
        match self {
            FieldChange::Diagram(_) => EntityKind::Diagram,
            FieldChange::DiagramElement(_) => EntityKind::DiagramElement,
            FieldChange::Classifier(_) => EntityKind::Classifier,
            FieldChange::Feature(_) => EntityKind::Feature,
            FieldChange::Relationship(_) => EntityKind::Relationship,
        }
    }

    /// Applies this change in place to `snap`.
    ///
    /// Returns `false` and leaves `snap` untouched when the kinds differ.
    pub fn apply_to(&self, snap: &mut EntitySnapshot) -> bool {
        match (self, snap) {
            (FieldChange::Diagram(f), EntitySnapshot::Diagram(r)) => {
                match f {
                    DiagramField::ParentId(v) => r.parent_id = *v,
                    DiagramField::DiagramType(v) => r.diagram_type = *v,
                    DiagramField::Stereotype(v) => r.stereotype = v.clone(),
                    DiagramField::Name(v) => r.name = v.clone(),
                    DiagramField::Description(v) => r.description = v.clone(),
                    DiagramField::ListOrder(v) => r.list_order = *v,
                    DiagramField::DisplayFlags(v) => r.display_flags = *v,
                }
                true
            }
            (FieldChange::DiagramElement(f), EntitySnapshot::DiagramElement(r)) => {
                match f {
                    DiagramElementField::DisplayFlags(v) => r.display_flags = *v,
                    DiagramElementField::FocusedFeatureId(v) => r.focused_feature_id = *v,
                }
                true
            }
            (FieldChange::Classifier(f), EntitySnapshot::Classifier(r)) => {
                match f {
                    ClassifierField::MainType(v) => r.main_type = *v,
                    ClassifierField::Stereotype(v) => r.stereotype = v.clone(),
                    ClassifierField::Name(v) => r.name = v.clone(),
                    ClassifierField::Description(v) => r.description = v.clone(),
                    ClassifierField::XOrder(v) => r.x_order = *v,
                    ClassifierField::YOrder(v) => r.y_order = *v,
                    ClassifierField::ListOrder(v) => r.list_order = *v,
                }
                true
            }
            (FieldChange::Feature(f), EntitySnapshot::Feature(r)) => {
                match f {
                    FeatureField::MainType(v) => r.main_type = *v,
                    FeatureField::Key(v) => r.key = v.clone(),
                    FeatureField::Value(v) => r.value = v.clone(),
                    FeatureField::Description(v) => r.description = v.clone(),
                    FeatureField::ListOrder(v) => r.list_order = *v,
                }
                true
            }
            (FieldChange::Relationship(f), EntitySnapshot::Relationship(r)) => {
                match f {
                    RelationshipField::MainType(v) => r.main_type = *v,
                    RelationshipField::Stereotype(v) => r.stereotype = v.clone(),
                    RelationshipField::Name(v) => r.name = v.clone(),
                    RelationshipField::Description(v) => r.description = v.clone(),
                    RelationshipField::ListOrder(v) => r.list_order = *v,
                }
                true
            }
            _ => false,
        }
    }
}
