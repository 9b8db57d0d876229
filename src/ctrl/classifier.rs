//! Classifier-family controller.

use crate::{
    core::journal::Journal,
    entity::{
        ClassifierField, ClassifierRecord, FeatureField, FeatureRecord, FieldChange,
        RelationshipField, RelationshipRecord,
    },
    error::CtrlResult,
    persist::Store,
    types::{BoundaryPolicy, ClassifierType, EntityKind, FeatureType, RelationshipType, RowId},
};

use super::{create_entity, delete_entity, update_entity};

/// Journaled create/update/delete of classifiers, features and relationships.
///
/// Obtained from [`super::facade::ControllerFacade::classifiers`]; field
/// updates always join the currently open undo group.
pub struct ClassifierController<'a, S: Store + ?Sized> {
    store: &'a S,
    journal: &'a mut Journal,
}

impl<'a, S: Store + ?Sized> ClassifierController<'a, S> {
    pub(crate) fn new(store: &'a S, journal: &'a mut Journal) -> Self {
        Self { store, journal }
    }

    /// Inserts a classifier; `record.id` must be void.
    pub fn create_classifier(&mut self, record: ClassifierRecord, policy: BoundaryPolicy) -> CtrlResult<RowId> {
        create_entity(self.store, self.journal, record.into(), policy)
    }

    /// Removes a classifier.
    pub fn delete_classifier(&mut self, id: RowId, policy: BoundaryPolicy) -> CtrlResult<()> {
        delete_entity(self.store, self.journal, EntityKind::Classifier, id, policy)
    }

    /// Changes the classifier flavor.
    pub fn update_classifier_main_type(&mut self, id: RowId, main_type: ClassifierType) -> CtrlResult<()> {
        self.update_classifier(id, ClassifierField::MainType(main_type))
    }

    /// Replaces the stereotype.
    pub fn update_classifier_stereotype(&mut self, id: RowId, stereotype: impl Into<String>) -> CtrlResult<()> {
        self.update_classifier(id, ClassifierField::Stereotype(stereotype.into()))
    }

    /// Renames the classifier.
    pub fn update_classifier_name(&mut self, id: RowId, name: impl Into<String>) -> CtrlResult<()> {
        self.update_classifier(id, ClassifierField::Name(name.into()))
    }

    /// Replaces the description.
    pub fn update_classifier_description(&mut self, id: RowId, description: impl Into<String>) -> CtrlResult<()> {
        self.update_classifier(id, ClassifierField::Description(description.into()))
    }

    /// Sets the horizontal placement order.
    pub fn update_classifier_x_order(&mut self, id: RowId, x_order: i32) -> CtrlResult<()> {
        self.update_classifier(id, ClassifierField::XOrder(x_order))
    }

    /// Sets the vertical placement order.
    pub fn update_classifier_y_order(&mut self, id: RowId, y_order: i32) -> CtrlResult<()> {
        self.update_classifier(id, ClassifierField::YOrder(y_order))
    }

    /// Sets the list position.
    pub fn update_classifier_list_order(&mut self, id: RowId, list_order: i32) -> CtrlResult<()> {
        self.update_classifier(id, ClassifierField::ListOrder(list_order))
    }

    /// Inserts a feature; `record.id` must be void.
    pub fn create_feature(&mut self, record: FeatureRecord, policy: BoundaryPolicy) -> CtrlResult<RowId> {
        create_entity(self.store, self.journal, record.into(), policy)
    }

    /// Removes a feature.
    pub fn delete_feature(&mut self, id: RowId, policy: BoundaryPolicy) -> CtrlResult<()> {
        delete_entity(self.store, self.journal, EntityKind::Feature, id, policy)
    }

    /// Changes the feature flavor.
    pub fn update_feature_main_type(&mut self, id: RowId, main_type: FeatureType) -> CtrlResult<()> {
        self.update_feature(id, FeatureField::MainType(main_type))
    }

    /// Renames the feature.
    pub fn update_feature_key(&mut self, id: RowId, key: impl Into<String>) -> CtrlResult<()> {
        self.update_feature(id, FeatureField::Key(key.into()))
    }

    /// Replaces the type/value text.
    pub fn update_feature_value(&mut self, id: RowId, value: impl Into<String>) -> CtrlResult<()> {
        self.update_feature(id, FeatureField::Value(value.into()))
    }

    /// Replaces the description.
    pub fn update_feature_description(&mut self, id: RowId, description: impl Into<String>) -> CtrlResult<()> {
        self.update_feature(id, FeatureField::Description(description.into()))
    }

    /// Sets the list position.
    pub fn update_feature_list_order(&mut self, id: RowId, list_order: i32) -> CtrlResult<()> {
        self.update_feature(id, FeatureField::ListOrder(list_order))
    }

    /// Inserts a relationship; `record.id` must be void.
    pub fn create_relationship(&mut self, record: RelationshipRecord, policy: BoundaryPolicy) -> CtrlResult<RowId> {
        create_entity(self.store, self.journal, record.into(), policy)
    }

    /// Removes a relationship.
    pub fn delete_relationship(&mut self, id: RowId, policy: BoundaryPolicy) -> CtrlResult<()> {
        delete_entity(self.store, self.journal, EntityKind::Relationship, id, policy)
    }

    /// Changes the relationship flavor.
    pub fn update_relationship_main_type(&mut self, id: RowId, main_type: RelationshipType) -> CtrlResult<()> {
        self.update_relationship(id, RelationshipField::MainType(main_type))
    }

    /// Replaces the stereotype.
    pub fn update_relationship_stereotype(&mut self, id: RowId, stereotype: impl Into<String>) -> CtrlResult<()> {
        self.update_relationship(id, RelationshipField::Stereotype(stereotype.into()))
    }

    /// Renames the relationship.
    pub fn update_relationship_name(&mut self, id: RowId, name: impl Into<String>) -> CtrlResult<()> {
        self.update_relationship(id, RelationshipField::Name(name.into()))
    }

    /// Replaces the description.
    pub fn update_relationship_description(&mut self, id: RowId, description: impl Into<String>) -> CtrlResult<()> {
        self.update_relationship(id, RelationshipField::Description(description.into()))
    }

    /// Sets the list position.
    pub fn update_relationship_list_order(&mut self, id: RowId, list_order: i32) -> CtrlResult<()> {
        self.update_relationship(id, RelationshipField::ListOrder(list_order))
    }

    fn update_classifier(&mut self, id: RowId, field: ClassifierField) -> CtrlResult<()> {
        update_entity(self.store, self.journal, id, FieldChange::Classifier(field))
    }

    fn update_feature(&mut self, id: RowId, field: FeatureField) -> CtrlResult<()> {
        update_entity(self.store, self.journal, id, FieldChange::Feature(field))
    }

    fn update_relationship(&mut self, id: RowId, field: RelationshipField) -> CtrlResult<()> {
        update_entity(self.store, self.journal, id, FieldChange::Relationship(field))
    }
}
