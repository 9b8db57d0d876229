//! Diagram-family controller.

use log::debug;

use crate::{
    core::journal::Journal,
    entity::{DiagramElementField, DiagramElementRecord, DiagramField, DiagramRecord, FieldChange},
    error::CtrlResult,
    persist::Store,
    types::{BoundaryPolicy, DiagramType, EntityKind, ROW_ID_VOID, RowId},
};

use super::{create_entity, delete_entity, update_entity};

/// Journaled create/update/delete of diagrams and diagram elements.
pub struct DiagramController<'a, S: Store + ?Sized> {
    store: &'a S,
    journal: &'a mut Journal,
}

impl<'a, S: Store + ?Sized> DiagramController<'a, S> {
    pub(crate) fn new(store: &'a S, journal: &'a mut Journal) -> Self {
        Self { store, journal }
    }

    /// Inserts a diagram; `record.id` must be void.
    pub fn create_diagram(&mut self, record: DiagramRecord, policy: BoundaryPolicy) -> CtrlResult<RowId> {
        create_entity(self.store, self.journal, record.into(), policy)
    }

    /// Returns the root diagram, creating one as a new undo step if none exists.
    ///
    /// Check-then-act: only sound because a single writer owns the store.
    pub fn create_root_diagram_if_not_exists(
        &mut self,
        diagram_type: DiagramType,
        name: impl Into<String>,
    ) -> CtrlResult<RowId> {
        if let Some(root) = self.store.find_root_diagram()? {
            return Ok(root.id);
        }
        let id = self.create_diagram(
            DiagramRecord::new(ROW_ID_VOID, diagram_type, name),
            BoundaryPolicy::StartNew,
        )?;
        debug!("created root diagram {id}");
        Ok(id)
    }

    /// Removes a diagram.
    pub fn delete_diagram(&mut self, id: RowId, policy: BoundaryPolicy) -> CtrlResult<()> {
        delete_entity(self.store, self.journal, EntityKind::Diagram, id, policy)
    }

    /// Moves the diagram under another parent ([`ROW_ID_VOID`] makes it a root).
    pub fn update_diagram_parent_id(&mut self, id: RowId, parent_id: RowId) -> CtrlResult<()> {
        self.update_diagram(id, DiagramField::ParentId(parent_id))
    }

    /// Changes the diagram flavor.
    pub fn update_diagram_type(&mut self, id: RowId, diagram_type: DiagramType) -> CtrlResult<()> {
        self.update_diagram(id, DiagramField::DiagramType(diagram_type))
    }

    /// Replaces the stereotype.
    pub fn update_diagram_stereotype(&mut self, id: RowId, stereotype: impl Into<String>) -> CtrlResult<()> {
        self.update_diagram(id, DiagramField::Stereotype(stereotype.into()))
    }

    /// Renames the diagram.
    pub fn update_diagram_name(&mut self, id: RowId, name: impl Into<String>) -> CtrlResult<()> {
        self.update_diagram(id, DiagramField::Name(name.into()))
    }

    /// Replaces the description.
    pub fn update_diagram_description(&mut self, id: RowId, description: impl Into<String>) -> CtrlResult<()> {
        self.update_diagram(id, DiagramField::Description(description.into()))
    }

    /// Sets the position among siblings.
    pub fn update_diagram_list_order(&mut self, id: RowId, list_order: i32) -> CtrlResult<()> {
        self.update_diagram(id, DiagramField::ListOrder(list_order))
    }

    /// Replaces the display flags.
    pub fn update_diagram_display_flags(&mut self, id: RowId, display_flags: i64) -> CtrlResult<()> {
        self.update_diagram(id, DiagramField::DisplayFlags(display_flags))
    }

    /// Places a classifier on a diagram; `record.id` must be void.
    pub fn create_diagramelement(&mut self, record: DiagramElementRecord, policy: BoundaryPolicy) -> CtrlResult<RowId> {
        create_entity(self.store, self.journal, record.into(), policy)
    }

    /// Removes a diagram element.
    pub fn delete_diagramelement(&mut self, id: RowId, policy: BoundaryPolicy) -> CtrlResult<()> {
        delete_entity(self.store, self.journal, EntityKind::DiagramElement, id, policy)
    }

    /// Replaces the element's display flags.
    pub fn update_diagramelement_display_flags(&mut self, id: RowId, display_flags: i64) -> CtrlResult<()> {
        self.update_diagramelement(id, DiagramElementField::DisplayFlags(display_flags))
    }

    /// Changes the focused feature ([`ROW_ID_VOID`] clears it).
    pub fn update_diagramelement_focused_feature_id(&mut self, id: RowId, feature_id: RowId) -> CtrlResult<()> {
        self.update_diagramelement(id, DiagramElementField::FocusedFeatureId(feature_id))
    }

    fn update_diagram(&mut self, id: RowId, field: DiagramField) -> CtrlResult<()> {
        update_entity(self.store, self.journal, id, FieldChange::Diagram(field))
    }

    fn update_diagramelement(&mut self, id: RowId, field: DiagramElementField) -> CtrlResult<()> {
        update_entity(self.store, self.journal, id, FieldChange::DiagramElement(field))
    }
}
