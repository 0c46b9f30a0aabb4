//! The board store: the single mutation surface for a board document.
//!
//! A [`Board`] owns entities, connectors, selection, viewport, the active
//! tool and the connection workflow. Every operation that changes entities
//! or connectors records an undo snapshot first; selection, viewport and tool
//! changes are not versioned.
//!
//! Operations on ids that no longer exist are no-ops returning `false` or
//! `None`. Only imports report errors.

use crate::config::{BoardConfig, ConfigError};
use crate::connection::{
    ClickTarget, ConnectionMode, ConnectionOutcome, EndpointDrag, resolve_click, snap_radius,
};
use crate::connector::{Connector, ConnectorId, ConnectorPatch, ConnectorSpec, End, Endpoint};
use crate::entities::{Entity, EntityBody, EntityId, EntityKind, EntityPatch, Placement, clamp_size};
use crate::geometry::{reanchor, recalc_connector_points};
use crate::handles::{HandleKind, apply_resize};
use crate::history::{DocumentSnapshot, History};
use crate::proximity::{
    ProximityLevel, ProximityThresholds, distance_to_rect, hover_target, proximity_level,
    zoom_aware_thresholds,
};
use crate::selection::Selection;
use crate::sizing::{DefaultSizer, SizeProvider};
use crate::snap::{SnapResult, align_rect, collect_guides};
use crate::snapshot::{BoardData, SnapshotError};
use crate::tools::ToolKind;
use crate::viewport::{Viewport, ViewportPatch};
use kurbo::{Point, Rect, Size, Vec2};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Notifications drained by the host with [`Board::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    EntityAdded(EntityId),
    EntitiesChanged(Vec<EntityId>),
    EntitiesRemoved(Vec<EntityId>),
    ConnectorAdded(ConnectorId),
    ConnectorChanged(ConnectorId),
    ConnectorsRemoved(Vec<ConnectorId>),
    /// The whole document was swapped (undo, redo or import).
    DocumentReplaced,
    SelectionChanged,
    ViewportChanged,
    ToolChanged(ToolKind),
    ConnectionModeChanged(ConnectionMode),
}

/// A board document and its interaction state.
#[derive(Clone)]
pub struct Board {
    entities: Vec<Entity>,
    connectors: Vec<Connector>,
    selection: Selection,
    viewport: Viewport,
    tool: ToolKind,
    connection: ConnectionMode,
    endpoint_drag: Option<EndpointDrag>,
    history: History,
    /// Next stacking order to hand out. Never decreases.
    next_z: i64,
    /// Bumped on every document mutation.
    revision: u64,
    events: Vec<BoardEvent>,
    config: BoardConfig,
    sizer: Arc<dyn SizeProvider>,
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("entities", &self.entities.len())
            .field("connectors", &self.connectors.len())
            .field("selection", &self.selection)
            .field("viewport", &self.viewport)
            .field("tool", &self.tool)
            .field("connection", &self.connection)
            .field("next_z", &self.next_z)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with the default configuration.
    pub fn new() -> Self {
        Self::build(BoardConfig::default())
    }

    /// Create an empty board with a validated configuration.
    pub fn with_config(config: BoardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: BoardConfig) -> Self {
        Self {
            entities: Vec::new(),
            connectors: Vec::new(),
            selection: Selection::new(),
            viewport: Viewport::with_limits(config.min_zoom, config.max_zoom),
            tool: ToolKind::default(),
            connection: ConnectionMode::default(),
            endpoint_drag: None,
            history: History::with_limit(config.history_limit),
            next_z: 0,
            revision: 0,
            events: Vec::new(),
            config,
            sizer: Arc::new(DefaultSizer),
        }
    }

    /// Use a custom sizing collaborator for new sticky notes and text blocks.
    pub fn with_size_provider(mut self, sizer: Arc<dyn SizeProvider>) -> Self {
        self.sizer = sizer;
        self
    }

    // --- Read access ---

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Entities in document (insertion) order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Entities in paint order (back to front). Equal z-indices keep
    /// document order.
    pub fn entities_ordered(&self) -> Vec<&Entity> {
        let mut ordered: Vec<&Entity> = self.entities.iter().collect();
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.id() == id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn connection_mode(&self) -> ConnectionMode {
        self.connection
    }

    pub fn endpoint_drag(&self) -> Option<&EndpointDrag> {
        self.endpoint_drag.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn next_z(&self) -> i64 {
        self.next_z
    }

    /// Document revision; changes whenever entities or connectors change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drain pending notifications.
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Union of all entity bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.entities
            .iter()
            .map(Entity::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Entities containing `point`, topmost first.
    pub fn entities_at_point(&self, point: Point) -> Vec<EntityId> {
        self.entities_ordered()
            .into_iter()
            .rev()
            .filter(|e| e.bounds().contains(point))
            .map(Entity::id)
            .collect()
    }

    // --- Internal helpers ---

    fn entity_index(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id() == id)
    }

    fn connector_index(&self, id: ConnectorId) -> Option<usize> {
        self.connectors.iter().position(|c| c.id() == id)
    }

    fn document_snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            entities: self.entities.clone(),
            connectors: self.connectors.clone(),
        }
    }

    /// Record the current document for undo. Call before mutating.
    fn checkpoint(&mut self) {
        let snapshot = self.document_snapshot();
        self.history.snapshot(snapshot);
    }

    fn commit(&mut self, event: BoardEvent) {
        self.revision += 1;
        self.events.push(event);
    }

    fn take_z(&mut self) -> i64 {
        let z = self.next_z;
        self.next_z += 1;
        z
    }

    /// Resolve anchors and cached points of one connector.
    fn resolve_connector(&self, connector: &mut Connector) {
        if !connector.has_attachment() {
            return;
        }
        reanchor(connector, &self.entities);
        connector.points = recalc_connector_points(connector, &self.entities, self.config.connector_margin);
    }

    /// Check that every attached end names an existing entity and that the
    /// two ends are not attached to the same entity.
    fn check_endpoints(&self, from: &Endpoint, to: &Endpoint) -> Result<(), String> {
        for end in [from, to] {
            if let Some(id) = end.entity_id() {
                if self.entity(id).is_none() {
                    return Err(format!("entity {id} does not exist"));
                }
            }
        }
        match (from.entity_id(), to.entity_id()) {
            (Some(a), Some(b)) if a == b => Err(format!("both ends attached to entity {a}")),
            _ => Ok(()),
        }
    }

    /// Drop selection entries and transient gesture state that point at
    /// removed items.
    fn prune_interaction_state(&mut self) {
        let entities = &self.entities;
        let connectors = &self.connectors;
        let pruned = self.selection.retain(
            |id| entities.iter().any(|e| e.id() == id),
            |id| connectors.iter().any(|c| c.id() == id),
        );
        if pruned {
            self.events.push(BoardEvent::SelectionChanged);
        }

        if let Some((from_id, _)) = self.connection.source() {
            if self.entity(from_id).is_none() {
                self.connection.cancel();
                self.events.push(BoardEvent::ConnectionModeChanged(self.connection));
            }
        }
        let stale_drag = self
            .endpoint_drag
            .as_ref()
            .is_some_and(|drag| self.connector(drag.connector_id).is_none());
        if stale_drag {
            self.endpoint_drag = None;
        }
    }

    fn initial_size(&self, body: &EntityBody) -> Size {
        let kind = body.kind();
        let suggested = match body {
            EntityBody::Sticky(_) | EntityBody::Text(_) => {
                self.sizer.suggest_size(kind, body.text().unwrap_or_default())
            }
            EntityBody::Image(image) => image.fit_within(kind.default_size()),
            EntityBody::Rect(_) => None,
        };
        suggested.unwrap_or_else(|| kind.default_size())
    }

    // --- Entities ---

    /// Add an entity and return its id.
    ///
    /// Without an explicit size, sticky notes and text blocks ask the sizing
    /// collaborator and images fit their source into the default frame. The
    /// result is clamped to the minimum size.
    pub fn add_entity(&mut self, body: impl Into<EntityBody>, placement: Placement) -> EntityId {
        let body = body.into();
        let size = placement.size.unwrap_or_else(|| self.initial_size(&body));

        self.checkpoint();
        let z = self.take_z();
        let entity = Entity::new(body, placement.position, size, z);
        let id = entity.id();
        log::debug!("Adding {:?} entity {id} at z {z}", entity.kind());
        self.entities.push(entity);
        self.commit(BoardEvent::EntityAdded(id));
        id
    }

    /// Merge `patch` into an entity.
    ///
    /// Returns false if the entity is absent, the patch changes nothing, or
    /// the entity is locked and the patch does more than toggle the lock.
    /// Geometric edits re-derive connector points.
    pub fn update_entity(&mut self, id: EntityId, patch: EntityPatch) -> bool {
        let Some(index) = self.entity_index(id) else {
            log::debug!("update_entity: no entity {id}");
            return false;
        };
        if self.entities[index].locked && !patch.is_lock_only() {
            log::debug!("update_entity: entity {id} is locked");
            return false;
        }

        let mut updated = self.entities[index].clone();
        let effect = updated.apply(&patch);
        if !effect.changed() {
            return false;
        }

        self.checkpoint();
        self.entities[index] = updated;
        if effect.geometry {
            self.recalculate_connectors();
        }
        self.commit(BoardEvent::EntitiesChanged(vec![id]));
        true
    }

    /// Move an entity's top-left corner to `position`.
    pub fn move_entity(&mut self, id: EntityId, position: Point) -> bool {
        self.update_entity(id, EntityPatch::position(position))
    }

    /// Translate several entities by `delta` as one undo step. Locked and
    /// unknown ids are skipped.
    pub fn move_entities(&mut self, ids: &[EntityId], delta: Vec2) -> bool {
        if !(delta.x.is_finite() && delta.y.is_finite()) || delta == Vec2::ZERO {
            return false;
        }
        let mut targets: Vec<usize> = Vec::new();
        for &id in ids {
            if let Some(index) = self.entity_index(id) {
                if !self.entities[index].locked && !targets.contains(&index) {
                    targets.push(index);
                }
            }
        }
        if targets.is_empty() {
            return false;
        }

        self.checkpoint();
        let mut moved = Vec::with_capacity(targets.len());
        for index in targets {
            let entity = &mut self.entities[index];
            let position = entity.position + delta;
            entity.apply(&EntityPatch::position(position));
            moved.push(entity.id());
        }
        self.recalculate_connectors();
        self.commit(BoardEvent::EntitiesChanged(moved));
        true
    }

    /// Resize an entity by dragging one of its handles by `delta`.
    pub fn resize_entity(&mut self, id: EntityId, handle: HandleKind, delta: Vec2, keep_aspect_ratio: bool) -> bool {
        let Some(entity) = self.entity(id) else {
            return false;
        };
        let frame = apply_resize(entity.bounds(), handle, delta, keep_aspect_ratio);
        self.update_entity(id, EntityPatch::frame(frame))
    }

    /// Delete one entity and every connector attached to it.
    pub fn delete_entity(&mut self, id: EntityId) -> bool {
        self.delete_entities(&[id])
    }

    /// Delete entities and every connector attached to any of them, as a
    /// single undo step.
    pub fn delete_entities(&mut self, ids: &[EntityId]) -> bool {
        self.remove_items(ids, &[])
    }

    /// Delete everything selected.
    pub fn delete_selected(&mut self) -> bool {
        let entities = self.selection.entities().to_vec();
        let connectors = self.selection.connectors().to_vec();
        self.remove_items(&entities, &connectors)
    }

    fn remove_items(&mut self, entity_ids: &[EntityId], connector_ids: &[ConnectorId]) -> bool {
        let doomed_entities: HashSet<EntityId> = entity_ids
            .iter()
            .copied()
            .filter(|&id| self.entity(id).is_some())
            .collect();
        let doomed_connectors: HashSet<ConnectorId> = self
            .connectors
            .iter()
            .filter(|c| {
                connector_ids.contains(&c.id()) || doomed_entities.iter().any(|&id| c.references(id))
            })
            .map(Connector::id)
            .collect();
        if doomed_entities.is_empty() && doomed_connectors.is_empty() {
            log::debug!("Nothing to delete");
            return false;
        }

        self.checkpoint();
        let removed_entities: Vec<EntityId> = self
            .entities
            .iter()
            .map(Entity::id)
            .filter(|id| doomed_entities.contains(id))
            .collect();
        let removed_connectors: Vec<ConnectorId> = self
            .connectors
            .iter()
            .map(Connector::id)
            .filter(|id| doomed_connectors.contains(id))
            .collect();
        self.entities.retain(|e| !doomed_entities.contains(&e.id()));
        self.connectors.retain(|c| !doomed_connectors.contains(&c.id()));
        log::debug!(
            "Deleted {} entities and {} connectors",
            removed_entities.len(),
            removed_connectors.len()
        );

        self.revision += 1;
        if !removed_entities.is_empty() {
            self.events.push(BoardEvent::EntitiesRemoved(removed_entities));
        }
        if !removed_connectors.is_empty() {
            self.events.push(BoardEvent::ConnectorsRemoved(removed_connectors));
        }
        self.prune_interaction_state();
        true
    }

    /// Raise an entity above every other entity.
    pub fn bring_to_front(&mut self, id: EntityId) -> bool {
        let Some(max) = self.entities.iter().map(|e| e.z_index).max() else {
            return false;
        };
        self.set_z_index(id, max + 1)
    }

    /// Lower an entity below every other entity.
    pub fn send_to_back(&mut self, id: EntityId) -> bool {
        let Some(min) = self.entities.iter().map(|e| e.z_index).min() else {
            return false;
        };
        self.set_z_index(id, min - 1)
    }

    fn set_z_index(&mut self, id: EntityId, z: i64) -> bool {
        let Some(index) = self.entity_index(id) else {
            log::debug!("z-order change: no entity {id}");
            return false;
        };
        self.checkpoint();
        let entity = &mut self.entities[index];
        entity.z_index = z;
        entity.updated_at = crate::entities::now_millis();
        self.next_z = self.next_z.max(z + 1);
        self.commit(BoardEvent::EntitiesChanged(vec![id]));
        true
    }

    // --- Connectors ---

    /// Add a connector. Returns None if an attached end names a missing
    /// entity or both ends are attached to the same entity.
    pub fn add_connector(&mut self, spec: ConnectorSpec) -> Option<ConnectorId> {
        if let Err(reason) = self.check_endpoints(&spec.from, &spec.to) {
            log::debug!("Rejecting connector: {reason}");
            return None;
        }

        self.checkpoint();
        let z = self.take_z();
        let mut connector = Connector::new(spec, z);
        self.resolve_connector(&mut connector);
        let id = connector.id();
        self.connectors.push(connector);
        self.commit(BoardEvent::ConnectorAdded(id));
        Some(id)
    }

    /// Reattach, detach or restyle a connector.
    pub fn update_connector(&mut self, id: ConnectorId, patch: ConnectorPatch) -> bool {
        let Some(index) = self.connector_index(id) else {
            log::debug!("update_connector: no connector {id}");
            return false;
        };
        let mut updated = self.connectors[index].clone();
        if !updated.apply(&patch) {
            return false;
        }
        if let Err(reason) = self.check_endpoints(&updated.from, &updated.to) {
            log::debug!("Rejecting connector update: {reason}");
            return false;
        }

        self.checkpoint();
        self.resolve_connector(&mut updated);
        self.connectors[index] = updated;
        self.commit(BoardEvent::ConnectorChanged(id));
        true
    }

    pub fn delete_connector(&mut self, id: ConnectorId) -> bool {
        if self.connector_index(id).is_none() {
            log::debug!("delete_connector: no connector {id}");
            return false;
        }
        self.remove_items(&[], &[id])
    }

    /// Re-derive anchors and cached points of every connector with at least
    /// one attached end. Idempotent. Returns how many connectors changed.
    pub fn recalculate_connectors(&mut self) -> usize {
        let margin = self.config.connector_margin;
        let mut changed = 0;
        for connector in &mut self.connectors {
            if !connector.has_attachment() {
                continue;
            }
            let reanchored = reanchor(connector, &self.entities);
            let points = recalc_connector_points(connector, &self.entities, margin);
            if reanchored || points != connector.points {
                connector.points = points;
                changed += 1;
            }
        }
        changed
    }

    // --- Selection ---

    /// Replace the entity selection. Unknown ids are ignored.
    pub fn select(&mut self, ids: &[EntityId]) {
        self.selection.clear();
        for &id in ids {
            if self.entity(id).is_some() {
                self.selection.add_entity(id);
            }
        }
        self.events.push(BoardEvent::SelectionChanged);
    }

    /// Add one entity to the selection.
    pub fn add_to_selection(&mut self, id: EntityId) -> bool {
        if self.entity(id).is_none() {
            return false;
        }
        self.selection.add_entity(id);
        self.events.push(BoardEvent::SelectionChanged);
        true
    }

    pub fn select_connector(&mut self, id: ConnectorId) -> bool {
        if self.connector(id).is_none() {
            return false;
        }
        self.selection.add_connector(id);
        self.events.push(BoardEvent::SelectionChanged);
        true
    }

    /// Flip an entity's selection. Returns false for unknown ids.
    pub fn toggle_selection(&mut self, id: EntityId) -> bool {
        if self.entity(id).is_none() {
            return false;
        }
        self.selection.toggle_entity(id);
        self.events.push(BoardEvent::SelectionChanged);
        true
    }

    pub fn select_all(&mut self) {
        self.selection.clear();
        for entity in &self.entities {
            self.selection.add_entity(entity.id());
        }
        self.events.push(BoardEvent::SelectionChanged);
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.events.push(BoardEvent::SelectionChanged);
        }
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        let current = self.document_snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        let current = self.document_snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: DocumentSnapshot) {
        self.entities = snapshot.entities;
        self.connectors = snapshot.connectors;
        self.commit(BoardEvent::DocumentReplaced);
        self.prune_interaction_state();
    }

    // --- Viewport ---

    pub fn set_viewport(&mut self, patch: ViewportPatch) -> bool {
        let changed = self.viewport.apply(patch);
        if changed {
            self.events.push(BoardEvent::ViewportChanged);
        }
        changed
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        if delta != Vec2::ZERO {
            self.viewport.pan(delta);
            self.events.push(BoardEvent::ViewportChanged);
        }
    }

    /// Zoom by `factor` around a screen point.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let before = self.viewport;
        self.viewport.zoom_at(screen_point, factor);
        if self.viewport != before {
            self.events.push(BoardEvent::ViewportChanged);
        }
    }

    /// Fit all entities into a screen of the given size.
    pub fn fit_to_content(&mut self, screen: Size) -> bool {
        let Some(bounds) = self.bounds() else {
            return false;
        };
        self.viewport.fit_to_bounds(bounds, screen, self.config.fit_padding);
        self.events.push(BoardEvent::ViewportChanged);
        true
    }

    // --- Tools and connection workflow ---

    /// Switch tools. Leaving the line tool abandons a pending connection.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool == self.tool {
            return;
        }
        if self.tool.is_connect() && self.connection.cancel() {
            log::debug!("Tool change cancelled pending connection");
            self.events.push(BoardEvent::ConnectionModeChanged(self.connection));
        }
        self.tool = tool;
        self.events.push(BoardEvent::ToolChanged(tool));
    }

    /// Canvas-space snap radius for connection gestures at the current zoom.
    pub fn connection_snap_radius(&self) -> f64 {
        snap_radius(self.config.connection_snap_threshold, self.viewport.zoom)
    }

    /// Feed a canvas-space click to the connection workflow.
    pub fn connect_at(&mut self, point: Point) -> ConnectionOutcome {
        let target = resolve_click(&self.entities, point, self.connection_snap_radius());
        self.connect_click(target)
    }

    /// Feed a resolved click target to the connection workflow.
    ///
    /// Only active with the line tool. Completing a fully attached connector
    /// switches back to the select tool.
    pub fn connect_click(&mut self, target: ClickTarget) -> ConnectionOutcome {
        if !self.tool.is_connect() {
            return ConnectionOutcome::Ignored;
        }
        if let ClickTarget::Anchor { entity_id, .. } = target {
            if self.entity(entity_id).is_none() {
                log::debug!("connect_click: no entity {entity_id}");
                return ConnectionOutcome::Ignored;
            }
        }

        let before = self.connection;
        let outcome = self.connection.click(target);
        if self.connection != before {
            self.events.push(BoardEvent::ConnectionModeChanged(self.connection));
        }
        if let Some(spec) = outcome.spec() {
            self.add_connector(spec);
        }
        if outcome.reverts_tool() {
            self.set_tool(ToolKind::Select);
        }
        outcome
    }

    /// Abandon a pending connection (Escape).
    pub fn cancel_connection(&mut self) -> bool {
        let cancelled = self.connection.cancel();
        if cancelled {
            self.events.push(BoardEvent::ConnectionModeChanged(self.connection));
        }
        cancelled
    }

    /// Start dragging one end of a connector.
    pub fn begin_endpoint_drag(&mut self, id: ConnectorId, end: End, pointer: Point) -> bool {
        let Some(connector) = self.connector(id) else {
            return false;
        };
        self.endpoint_drag = Some(EndpointDrag::new(connector, end, pointer));
        true
    }

    pub fn update_endpoint_drag(&mut self, pointer: Point) -> bool {
        match &mut self.endpoint_drag {
            Some(drag) => {
                drag.update(pointer);
                true
            }
            None => false,
        }
    }

    /// Finish an endpoint drag at `release`: attach to a nearby anchor or
    /// float at the release point. Returns true if the connector changed.
    pub fn end_endpoint_drag(&mut self, release: Point) -> bool {
        let Some(drag) = self.endpoint_drag.take() else {
            return false;
        };
        let endpoint = drag.resolve(&self.entities, release, self.connection_snap_radius());
        self.update_connector(drag.connector_id, ConnectorPatch::endpoint(drag.end, endpoint))
    }

    pub fn cancel_endpoint_drag(&mut self) -> bool {
        self.endpoint_drag.take().is_some()
    }

    // --- Proximity, hover and alignment ---

    /// Proximity thresholds in canvas units at the current zoom.
    pub fn proximity_thresholds(&self) -> ProximityThresholds {
        zoom_aware_thresholds(
            &self.config.proximity,
            self.viewport.zoom,
            self.config.min_zoom,
            self.config.max_zoom,
        )
    }

    /// How close `cursor` is to an entity's bounds.
    pub fn proximity_to(&self, id: EntityId, cursor: Point) -> Option<ProximityLevel> {
        let entity = self.entity(id)?;
        let distance = distance_to_rect(cursor, entity.bounds());
        Some(proximity_level(distance, &self.proximity_thresholds()))
    }

    /// The entity that should receive hover affordances at `cursor`.
    pub fn hover_target(&self, cursor: Point) -> Option<EntityId> {
        hover_target(
            cursor,
            &self.entities,
            self.viewport.zoom,
            self.config.min_zoom,
            self.config.max_zoom,
            &self.config.hover,
        )
    }

    /// Snap a proposed drag position of an entity to alignment guides from
    /// its siblings and, optionally, the canvas bounds. Does not move it.
    pub fn align_drag(&self, id: EntityId, proposed: Point, canvas: Option<Rect>) -> Option<SnapResult> {
        let entity = self.entity(id)?;
        let siblings: Vec<Rect> = self
            .entities
            .iter()
            .filter(|e| e.id() != id)
            .map(Entity::bounds)
            .collect();
        let guides = collect_guides(&siblings, canvas);
        let dragged = Rect::from_origin_size(proposed, Size::new(entity.width, entity.height));
        Some(align_rect(dragged, &guides, self.config.alignment_tolerance))
    }

    // --- Import / export ---

    /// Serialize the document.
    pub fn export_snapshot(&self) -> BoardData {
        BoardData::new(self.entities.clone(), self.connectors.clone())
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        self.export_snapshot().to_json()
    }

    /// Replace the document with `data`.
    ///
    /// Invalid payloads are rejected and the board is left untouched. On
    /// success history and selection are cleared, sizes clamped and
    /// connectors re-derived.
    pub fn import_snapshot(&mut self, data: BoardData) -> Result<(), SnapshotError> {
        data.validate()?;

        let mut entities = data.elements;
        for entity in &mut entities {
            (entity.width, entity.height) = clamp_size(entity.width, entity.height);
        }
        let max_z = entities
            .iter()
            .map(|e| e.z_index)
            .chain(data.connectors.iter().map(|c| c.z_index))
            .max();

        self.entities = entities;
        self.connectors = data.connectors;
        self.history.clear();
        self.selection.clear();
        self.connection.cancel();
        self.endpoint_drag = None;
        if let Some(max_z) = max_z {
            self.next_z = self.next_z.max(max_z + 1);
        }
        self.recalculate_connectors();

        log::info!(
            "Imported board with {} elements and {} connectors",
            self.entities.len(),
            self.connectors.len()
        );
        self.commit(BoardEvent::DocumentReplaced);
        self.events.push(BoardEvent::SelectionChanged);
        Ok(())
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        let data = BoardData::from_json(json)?;
        self.import_snapshot(data)
    }

    /// The entity kind the current tool places, if any.
    pub fn placement_kind(&self) -> Option<EntityKind> {
        self.tool.entity_kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::Anchor;
    use crate::entities::{ImageRef, MIN_HEIGHT, MIN_WIDTH, StickyNote, TextBlock};
    use crate::geometry::{CONNECTOR_MARGIN, anchor_for_connection};
    use crate::handles::Corner;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Two default stickies at (100,100) and (300,100).
    fn two_stickies(board: &mut Board) -> (EntityId, EntityId) {
        let a = board.add_entity(EntityKind::Sticky, Placement::at(100.0, 100.0));
        let b = board.add_entity(EntityKind::Sticky, Placement::at(300.0, 100.0));
        (a, b)
    }

    fn document(board: &Board) -> (Vec<Entity>, Vec<Connector>) {
        (board.entities().to_vec(), board.connectors().to_vec())
    }

    #[test]
    fn test_add_entity_defaults() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);

        let first = board.entity(a).unwrap();
        assert_eq!(first.kind(), EntityKind::Sticky);
        assert_eq!(first.bounds(), Rect::new(100.0, 100.0, 250.0, 250.0));
        assert_eq!(first.z_index, 0);
        assert_eq!(board.entity(b).unwrap().z_index, 1);
        assert_eq!(board.next_z(), 2);
        assert_eq!(board.history().past_len(), 2);
    }

    #[test]
    fn test_add_entity_uses_size_provider() {
        let sizer = |kind: EntityKind, text: &str| {
            (kind == EntityKind::Text).then(|| Size::new(10.0 * text.len() as f64, 4.0))
        };
        let mut board = Board::new().with_size_provider(Arc::new(sizer));

        let text = board.add_entity(TextBlock::new("hello world!"), Placement::at(0.0, 0.0));
        let entity = board.entity(text).unwrap();
        assert!((entity.width - 120.0).abs() < f64::EPSILON);
        // Suggested height is below the minimum and gets clamped.
        assert!((entity.height - MIN_HEIGHT).abs() < f64::EPSILON);

        // Sticky falls back to the default when the provider declines.
        let sticky = board.add_entity(StickyNote::new("x"), Placement::at(0.0, 0.0));
        assert_eq!(board.entity(sticky).unwrap().bounds().size(), StickyNote::DEFAULT_SIZE);
    }

    #[test]
    fn test_add_image_fits_source() {
        let mut board = Board::new();
        let id = board.add_entity(ImageRef::new("photo.png", 1200, 600), Placement::at(0.0, 0.0));
        let image = board.entity(id).unwrap();
        assert!((image.width - 240.0).abs() < 1e-9);
        assert!((image.height - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_size_is_clamped() {
        let mut board = Board::new();
        let id = board.add_entity(EntityKind::Rect, Placement::at(0.0, 0.0).with_size(1.0, 1.0));
        let entity = board.entity(id).unwrap();
        assert_eq!((entity.width, entity.height), (MIN_WIDTH, MIN_HEIGHT));
    }

    #[test]
    fn test_resize_never_below_minimum() {
        let mut board = Board::new();
        let id = board.add_entity(EntityKind::Rect, Placement::at(0.0, 0.0));
        for (w, h) in [(0.0, 0.0), (-50.0, 5.0), (19.9, 9.9), (f64::NAN, 300.0), (500.0, 1.0)] {
            board.update_entity(id, EntityPatch::size(w, h));
            let entity = board.entity(id).unwrap();
            assert!(entity.width >= MIN_WIDTH && entity.height >= MIN_HEIGHT);
        }
        board.resize_entity(
            id,
            HandleKind::Corner(Corner::BottomRight),
            Vec2::new(-10_000.0, -10_000.0),
            false,
        );
        let entity = board.entity(id).unwrap();
        assert!(entity.width >= MIN_WIDTH && entity.height >= MIN_HEIGHT);
    }

    #[test]
    fn test_missing_ids_are_noops() {
        init_logger();
        let mut board = Board::new();
        let ghost = uuid::Uuid::new_v4();

        assert!(!board.update_entity(ghost, EntityPatch::text("x")));
        assert!(!board.move_entity(ghost, Point::new(1.0, 1.0)));
        assert!(!board.delete_entity(ghost));
        assert!(!board.bring_to_front(ghost));
        assert!(!board.delete_connector(ghost));
        assert!(!board.update_connector(ghost, ConnectorPatch::default()));
        assert!(!board.toggle_selection(ghost));
        assert!(!board.can_undo());
        assert_eq!(board.revision(), 0);
    }

    #[test]
    fn test_unchanged_update_records_nothing() {
        let mut board = Board::new();
        let id = board.add_entity(EntityKind::Rect, Placement::at(5.0, 5.0));
        let past = board.history().past_len();
        assert!(!board.move_entity(id, Point::new(5.0, 5.0)));
        assert_eq!(board.history().past_len(), past);
    }

    #[test]
    fn test_locked_entity_only_accepts_unlock() {
        let mut board = Board::new();
        let id = board.add_entity(EntityKind::Sticky, Placement::at(0.0, 0.0));
        assert!(board.update_entity(
            id,
            EntityPatch {
                locked: Some(true),
                ..EntityPatch::default()
            }
        ));

        assert!(!board.move_entity(id, Point::new(50.0, 50.0)));
        assert!(!board.update_entity(id, EntityPatch::text("edited")));
        assert!(!board.move_entities(&[id], Vec2::new(10.0, 0.0)));
        assert_eq!(board.entity(id).unwrap().position, Point::ZERO);

        assert!(board.update_entity(
            id,
            EntityPatch {
                locked: Some(false),
                ..EntityPatch::default()
            }
        ));
        assert!(board.move_entity(id, Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_sticky_connector_scenario() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);

        let c = board
            .add_connector(ConnectorSpec::between(a, Anchor::Right, b, Anchor::Left))
            .unwrap();
        let connector = board.connector(c).unwrap();
        assert_eq!(connector.points, [250.0, 175.0, 300.0 + CONNECTOR_MARGIN, 175.0]);
        assert_eq!(connector.z_index, 2);

        assert!(board.delete_entity(a));
        assert!(board.connector(c).is_none());
        assert!(board.connectors().is_empty());
        assert_eq!(board.entities().len(), 1);
    }

    #[test]
    fn test_connectors_follow_entity_geometry() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);
        let c = board
            .add_connector(ConnectorSpec::between(a, Anchor::Right, b, Anchor::Left))
            .unwrap();

        let expect = |board: &Board| {
            let (start, end) = anchor_for_connection(
                board.entity(a).unwrap().bounds(),
                board.entity(b).unwrap().bounds(),
            );
            [start.x, start.y, end.x, end.y]
        };

        board.move_entity(b, Point::new(120.0, 600.0));
        board.recalculate_connectors();
        assert_eq!(board.connector(c).unwrap().points, expect(&board));
        // The stored anchors follow the new vertical layout.
        assert_eq!(board.connector(c).unwrap().from_anchor(), Some(Anchor::Bottom));
        assert_eq!(board.connector(c).unwrap().to_anchor(), Some(Anchor::Top));

        board.update_entity(a, EntityPatch::size(400.0, 90.0));
        board.recalculate_connectors();
        assert_eq!(board.connector(c).unwrap().points, expect(&board));

        board.move_entities(&[a, b], Vec2::new(-37.0, 12.5));
        assert_eq!(board.connector(c).unwrap().points, expect(&board));
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);
        board.add_connector(ConnectorSpec::between(a, Anchor::Right, b, Anchor::Left));
        board.add_connector(ConnectorSpec::dangling(a, Anchor::Top, Point::new(0.0, -300.0)));

        assert_eq!(board.recalculate_connectors(), 0);
        let before = document(&board);
        board.recalculate_connectors();
        assert_eq!(document(&board), before);
    }

    #[test]
    fn test_floating_end_keeps_its_point() {
        let mut board = Board::new();
        let a = board.add_entity(EntityKind::Sticky, Placement::at(100.0, 100.0));
        let c = board
            .add_connector(ConnectorSpec::dangling(a, Anchor::Bottom, Point::new(175.0, 600.0)))
            .unwrap();
        assert_eq!(board.connector(c).unwrap().points, [175.0, 250.0, 175.0, 600.0]);

        board.move_entity(a, Point::new(0.0, 0.0));
        assert_eq!(board.connector(c).unwrap().points, [75.0, 150.0, 175.0, 600.0]);
    }

    #[test]
    fn test_cascading_delete_is_one_undo_step() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);
        let c = board.add_entity(EntityKind::Rect, Placement::at(100.0, 500.0));
        board.add_connector(ConnectorSpec::between(a, Anchor::Right, b, Anchor::Left));
        board.add_connector(ConnectorSpec::between(c, Anchor::Top, a, Anchor::Bottom));
        let survivor = board
            .add_connector(ConnectorSpec::between(b, Anchor::Bottom, c, Anchor::Right))
            .unwrap();
        board.select(&[a, b]);

        let past = board.history().past_len();
        assert!(board.delete_entity(a));
        assert_eq!(board.history().past_len(), past + 1);
        assert!(board.connectors().iter().all(|conn| !conn.references(a)));
        assert_eq!(board.connectors().len(), 1);
        assert!(board.connector(survivor).is_some());
        assert_eq!(board.selection().entities(), &[b]);

        assert!(board.undo());
        assert_eq!(board.connectors().len(), 3);
        assert!(board.entity(a).is_some());
    }

    #[test]
    fn test_delete_selected_includes_connectors() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);
        let conn = board
            .add_connector(ConnectorSpec::between(a, Anchor::Right, b, Anchor::Left))
            .unwrap();
        board.select_connector(conn);
        assert!(board.delete_selected());
        assert!(board.connectors().is_empty());
        assert_eq!(board.entities().len(), 2);
        assert!(board.selection().is_empty());
    }

    #[test]
    fn test_z_order() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);
        let c = board.add_entity(EntityKind::Rect, Placement::at(0.0, 0.0));

        assert!(board.bring_to_front(a));
        assert_eq!(board.entity(a).unwrap().z_index, 3);
        assert!(board.send_to_back(c));
        assert_eq!(board.entity(c).unwrap().z_index, 0);
        assert!(board.send_to_back(b));
        assert_eq!(board.entity(b).unwrap().z_index, -1);

        let ordered: Vec<EntityId> = board.entities_ordered().iter().map(|e| e.id()).collect();
        assert_eq!(ordered, vec![b, c, a]);
        assert_eq!(board.next_z(), 4);

        // The counter never goes back, even after undo.
        board.undo();
        board.undo();
        board.undo();
        assert_eq!(board.next_z(), 4);
        let next = board.add_entity(EntityKind::Rect, Placement::at(0.0, 0.0));
        assert_eq!(board.entity(next).unwrap().z_index, 4);
    }

    #[test]
    fn test_add_connector_rejects_invalid_references() {
        init_logger();
        let mut board = Board::new();
        let (a, _) = two_stickies(&mut board);
        let past = board.history().past_len();

        assert!(board.add_connector(ConnectorSpec::between(a, Anchor::Left, a, Anchor::Right)).is_none());
        let ghost = uuid::Uuid::new_v4();
        assert!(board.add_connector(ConnectorSpec::between(a, Anchor::Left, ghost, Anchor::Right)).is_none());
        assert!(board.connectors().is_empty());
        assert_eq!(board.history().past_len(), past);
    }

    #[test]
    fn test_update_connector_reattach_and_reject_self() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);
        let c = board
            .add_connector(ConnectorSpec::dangling(a, Anchor::Right, Point::new(600.0, 175.0)))
            .unwrap();

        assert!(board.update_connector(c, ConnectorPatch::endpoint(End::To, Endpoint::attached(b, Anchor::Left))));
        assert_eq!(board.connector(c).unwrap().to_id(), Some(b));
        assert_eq!(board.connector(c).unwrap().points, [250.0, 175.0, 312.0, 175.0]);

        assert!(!board.update_connector(c, ConnectorPatch::endpoint(End::To, Endpoint::attached(a, Anchor::Top))));
        assert_eq!(board.connector(c).unwrap().to_id(), Some(b));

        assert!(board.update_connector(c, ConnectorPatch::endpoint(End::To, Endpoint::floating(10.0, 20.0))));
        assert_eq!(board.connector(c).unwrap().to_id(), None);
        assert_eq!(board.connector(c).unwrap().point(End::To), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut board = Board::new();
        let initial = document(&board);

        let (a, b) = two_stickies(&mut board);
        let c = board
            .add_connector(ConnectorSpec::between(a, Anchor::Right, b, Anchor::Left))
            .unwrap();
        board.move_entity(a, Point::new(-200.0, 40.0));
        board.update_entity(b, EntityPatch::text("renamed"));
        board.bring_to_front(a);
        board.update_connector(c, ConnectorPatch::endpoint(End::To, Endpoint::floating(9.0, 9.0)));
        board.add_entity(EntityKind::Rect, Placement::at(800.0, 800.0));
        board.delete_entity(b);
        let steps = 9;
        assert_eq!(board.history().past_len(), steps);

        let final_state = document(&board);
        for _ in 0..steps {
            assert!(board.undo());
        }
        assert!(!board.undo());
        assert_eq!(document(&board), initial);

        for _ in 0..steps {
            assert!(board.redo());
        }
        assert!(!board.redo());
        assert_eq!(document(&board), final_state);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut board = Board::new();
        for i in 0..25 {
            board.add_entity(EntityKind::Rect, Placement::at(i as f64 * 10.0, 0.0));
        }
        assert_eq!(board.history().past_len(), 20);
        // The oldest retained state is the one before the 6th addition.
        assert_eq!(board.history().oldest().unwrap().entities.len(), 5);

        for _ in 0..20 {
            assert!(board.undo());
        }
        assert!(!board.can_undo());
        assert_eq!(board.entities().len(), 5);
    }

    #[test]
    fn test_history_limit_from_config() {
        let config = BoardConfig {
            history_limit: 3,
            ..BoardConfig::default()
        };
        let mut board = Board::with_config(config).unwrap();
        for _ in 0..5 {
            board.add_entity(EntityKind::Text, Placement::at(0.0, 0.0));
        }
        assert_eq!(board.history().past_len(), 3);
    }

    #[test]
    fn test_new_mutation_clears_redo() {
        let mut board = Board::new();
        let a = board.add_entity(EntityKind::Sticky, Placement::at(0.0, 0.0));
        board.move_entity(a, Point::new(10.0, 10.0));
        board.undo();
        assert!(board.can_redo());
        board.move_entity(a, Point::new(99.0, 99.0));
        assert!(!board.can_redo());
    }

    #[test]
    fn test_selection_is_not_versioned() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);
        let past = board.history().past_len();

        board.select(&[a]);
        assert!(board.toggle_selection(b));
        board.select_all();
        board.clear_selection();
        board.set_viewport(ViewportPatch::zoom(2.0));
        assert_eq!(board.history().past_len(), past);

        // Undoing the creation of b prunes it from the selection.
        board.select(&[a, b]);
        board.undo();
        assert_eq!(board.selection().entities(), &[a]);
        // Viewport survives undo.
        assert!((board.viewport().zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_connection_workflow() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);

        // Ignored outside the line tool.
        assert_eq!(board.connect_at(Point::new(251.0, 175.0)), ConnectionOutcome::Ignored);

        board.set_tool(ToolKind::Line);
        let first = board.connect_at(Point::new(251.0, 175.0));
        assert_eq!(
            first,
            ConnectionOutcome::SourceSelected {
                from_id: a,
                from_anchor: Anchor::Right
            }
        );
        assert!(board.connection_mode().is_active());

        let second = board.connect_at(Point::new(299.0, 176.0));
        assert!(matches!(second, ConnectionOutcome::Connect(_)));
        assert_eq!(board.connection_mode(), ConnectionMode::Idle);
        assert_eq!(board.tool(), ToolKind::Select);

        let connector = &board.connectors()[0];
        assert_eq!(connector.from_id(), Some(a));
        assert_eq!(connector.to_id(), Some(b));
        assert_eq!(connector.points, [250.0, 175.0, 312.0, 175.0]);
    }

    #[test]
    fn test_self_connection_is_never_created() {
        let mut board = Board::new();
        let (a, _) = two_stickies(&mut board);
        board.set_tool(ToolKind::Line);
        let past = board.history().past_len();

        for anchor in Anchor::ALL {
            let start = ClickTarget::Anchor { entity_id: a, anchor: Anchor::Top };
            board.connect_click(start);
            let outcome = board.connect_click(ClickTarget::Anchor { entity_id: a, anchor });
            assert_eq!(outcome, ConnectionOutcome::Cancelled);
        }
        assert!(board.connectors().is_empty());
        assert_eq!(board.history().past_len(), past);
        assert_eq!(board.tool(), ToolKind::Line);
    }

    #[test]
    fn test_canvas_click_creates_partial_connector() {
        let mut board = Board::new();
        let (a, _) = two_stickies(&mut board);
        board.set_tool(ToolKind::Line);

        board.connect_at(Point::new(175.0, 249.0));
        let outcome = board.connect_at(Point::new(175.0, 700.0));
        assert!(matches!(outcome, ConnectionOutcome::ConnectFloating(_)));
        // Partial connectors keep the line tool active.
        assert_eq!(board.tool(), ToolKind::Line);

        let connector = &board.connectors()[0];
        assert_eq!(connector.from, Endpoint::attached(a, Anchor::Bottom));
        assert_eq!(connector.points, [175.0, 250.0, 175.0, 700.0]);
    }

    #[test]
    fn test_cancel_and_tool_switch_abandon_connection() {
        let mut board = Board::new();
        let (a, _) = two_stickies(&mut board);
        board.set_tool(ToolKind::Line);

        board.connect_click(ClickTarget::Anchor { entity_id: a, anchor: Anchor::Left });
        assert!(board.cancel_connection());
        assert!(!board.cancel_connection());

        board.connect_click(ClickTarget::Anchor { entity_id: a, anchor: Anchor::Left });
        board.set_tool(ToolKind::Pan);
        assert_eq!(board.connection_mode(), ConnectionMode::Idle);
        assert!(board.connectors().is_empty());
    }

    #[test]
    fn test_snap_radius_shrinks_with_zoom() {
        let mut board = Board::new();
        two_stickies(&mut board);
        board.set_tool(ToolKind::Line);
        board.set_viewport(ViewportPatch::zoom(4.0));
        assert!((board.connection_snap_radius() - 10.0).abs() < 1e-9);

        // 30 units right of a's right anchor: outside the 10-unit radius and
        // outside every entity.
        assert_eq!(board.connect_at(Point::new(280.0, 175.0)), ConnectionOutcome::Ignored);
    }

    #[test]
    fn test_endpoint_drag() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);
        let c = board.add_entity(EntityKind::Rect, Placement::at(100.0, 400.0));
        let conn = board
            .add_connector(ConnectorSpec::between(a, Anchor::Right, b, Anchor::Left))
            .unwrap();

        // Move the destination onto c's top anchor (180, 400).
        assert!(board.begin_endpoint_drag(conn, End::To, Point::new(312.0, 175.0)));
        assert!(board.update_endpoint_drag(Point::new(200.0, 300.0)));
        assert!(board.end_endpoint_drag(Point::new(185.0, 395.0)));
        let connector = board.connector(conn).unwrap();
        assert_eq!(connector.to_id(), Some(c));
        assert_eq!(connector.from_anchor(), Some(Anchor::Bottom));
        assert_eq!(connector.to_anchor(), Some(Anchor::Top));
        assert_eq!(connector.points, [175.0, 250.0, 180.0, 400.0 + CONNECTOR_MARGIN]);

        // Drop it on empty canvas: detaches.
        board.begin_endpoint_drag(conn, End::To, Point::new(180.0, 412.0));
        assert!(board.end_endpoint_drag(Point::new(800.0, 800.0)));
        let connector = board.connector(conn).unwrap();
        assert_eq!(connector.to_id(), None);
        assert_eq!(connector.points, [175.0, 250.0, 800.0, 800.0]);

        // Dropping on the source entity's anchor floats instead of
        // creating a self-connection.
        board.begin_endpoint_drag(conn, End::To, Point::new(800.0, 800.0));
        assert!(board.end_endpoint_drag(Point::new(101.0, 175.0)));
        assert_eq!(board.connector(conn).unwrap().to_id(), None);

        assert!(!board.end_endpoint_drag(Point::ZERO));
        assert!(!board.begin_endpoint_drag(uuid::Uuid::new_v4(), End::From, Point::ZERO));
    }

    #[test]
    fn test_endpoint_drag_attaches_past_source_anchor() {
        let mut board = Board::new();
        let square = |x, y| Placement::at(x, y).with_size(100.0, 100.0);
        let a = board.add_entity(EntityKind::Rect, square(0.0, 0.0));
        let b = board.add_entity(EntityKind::Rect, square(300.0, 0.0));
        let c = board.add_entity(EntityKind::Rect, square(0.0, 130.0));
        let conn = board
            .add_connector(ConnectorSpec::between(a, Anchor::Right, b, Anchor::Left))
            .unwrap();

        // a's bottom anchor is closer, but a already owns the other end.
        board.begin_endpoint_drag(conn, End::To, Point::new(312.0, 50.0));
        assert!(board.end_endpoint_drag(Point::new(50.0, 112.0)));
        let connector = board.connector(conn).unwrap();
        assert_eq!(connector.to_id(), Some(c));
        assert_eq!(connector.points, [50.0, 100.0, 50.0, 130.0 + CONNECTOR_MARGIN]);
    }

    #[test]
    fn test_non_finite_move_is_noop() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);
        board.add_connector(ConnectorSpec::between(a, Anchor::Right, b, Anchor::Left));
        let before = document(&board);
        let past = board.history().past_len();

        for _ in 0..3 {
            assert!(!board.move_entity(a, Point::new(f64::NAN, 0.0)));
        }
        assert!(!board.move_entity(a, Point::new(0.0, f64::INFINITY)));
        assert!(!board.move_entities(&[a, b], Vec2::new(f64::NAN, 1.0)));
        assert_eq!(board.history().past_len(), past);
        assert_eq!(document(&board), before);
        assert!(board.connectors()[0].points.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut board = Board::new();
        let (a, b) = two_stickies(&mut board);
        board.add_connector(ConnectorSpec::between(a, Anchor::Right, b, Anchor::Left));
        let json = board.export_json().unwrap();

        let mut restored = Board::new();
        restored.add_entity(EntityKind::Rect, Placement::at(0.0, 0.0));
        restored.select_all();
        restored.import_json(&json).unwrap();

        assert_eq!(restored.entities(), board.entities());
        assert_eq!(restored.connectors(), board.connectors());
        assert!(!restored.can_undo());
        assert!(restored.selection().is_empty());
        assert_eq!(restored.next_z(), 3);
    }

    #[test]
    fn test_import_rejects_and_preserves_state() {
        let mut board = Board::new();
        let (a, _) = two_stickies(&mut board);
        let before = document(&board);
        let revision = board.revision();

        for bad in [
            r#"{ "elements": [] , "version": 1 }"#,
            r#"{ "connectors": [], "version": 1 }"#,
            r#"{ "elements": [], "connectors": [] }"#,
            r#"{ "elements": [], "connectors": [], "version": 7 }"#,
            "not json",
        ] {
            assert!(board.import_json(bad).is_err());
        }
        assert_eq!(document(&board), before);
        assert_eq!(board.revision(), revision);
        assert!(board.can_undo());
        assert!(board.entity(a).is_some());
    }

    #[test]
    fn test_import_rejects_self_connection() {
        let mut board = Board::new();
        let (a, _) = two_stickies(&mut board);
        let before = document(&board);

        let mut data = board.export_snapshot();
        let looped = Connector::new(ConnectorSpec::between(a, Anchor::Top, a, Anchor::Bottom), 5);
        let looped_id = looped.id();
        data.connectors.push(looped);

        let result = board.import_snapshot(data);
        assert!(matches!(result, Err(SnapshotError::SelfConnection(id)) if id == looped_id));
        assert_eq!(document(&board), before);
        assert!(board.connectors().iter().all(|c| !c.is_self_connection()));
    }

    #[test]
    fn test_import_clamps_sizes() {
        let mut board = Board::new();
        let mut data = BoardData::default();
        let mut tiny = Entity::new(EntityKind::Rect.into(), Point::ZERO, Size::new(50.0, 50.0), 9);
        tiny.width = 1.0;
        tiny.height = 1.0;
        data.elements.push(tiny);

        board.import_snapshot(data).unwrap();
        let entity = &board.entities()[0];
        assert_eq!((entity.width, entity.height), (MIN_WIDTH, MIN_HEIGHT));
        assert_eq!(board.next_z(), 10);
    }

    #[test]
    fn test_zoom_aware_thresholds_follow_viewport() {
        let mut board = Board::new();
        board.set_viewport(ViewportPatch::zoom(2.0));
        let thresholds = board.proximity_thresholds();
        assert!((thresholds.primary - 15.0).abs() < 1e-9);
        assert!((thresholds.secondary - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_proximity_to_entity() {
        let mut board = Board::new();
        let a = board.add_entity(EntityKind::Rect, Placement::at(0.0, 0.0).with_size(100.0, 100.0));
        board.set_viewport(ViewportPatch::zoom(2.0));

        assert_eq!(board.proximity_to(a, Point::new(110.0, 50.0)), Some(ProximityLevel::Primary));
        assert_eq!(board.proximity_to(a, Point::new(120.0, 50.0)), Some(ProximityLevel::Secondary));
        assert_eq!(board.proximity_to(a, Point::new(200.0, 50.0)), Some(ProximityLevel::Hidden));
        assert_eq!(board.proximity_to(uuid::Uuid::new_v4(), Point::ZERO), None);
    }

    #[test]
    fn test_hover_prefers_topmost() {
        let mut board = Board::new();
        let low = board.add_entity(EntityKind::Rect, Placement::at(0.0, 0.0).with_size(100.0, 100.0));
        let high = board.add_entity(EntityKind::Rect, Placement::at(50.0, 50.0).with_size(100.0, 100.0));

        assert_eq!(board.hover_target(Point::new(75.0, 75.0)), Some(high));
        // Within the 20-unit buffer of low only.
        assert_eq!(board.hover_target(Point::new(-10.0, 20.0)), Some(low));
        assert_eq!(board.hover_target(Point::new(500.0, 500.0)), None);

        board.send_to_back(high);
        board.bring_to_front(low);
        assert_eq!(board.hover_target(Point::new(75.0, 75.0)), Some(low));
        assert_eq!(board.entities_at_point(Point::new(75.0, 75.0)), vec![low, high]);
    }

    #[test]
    fn test_hover_buffer_follows_board_zoom_limits() {
        let config = BoardConfig {
            min_zoom: 0.5,
            max_zoom: 8.0,
            ..BoardConfig::default()
        };
        let mut board = Board::with_config(config).unwrap();
        let a = board.add_entity(EntityKind::Rect, Placement::at(0.0, 0.0).with_size(100.0, 100.0));
        board.set_viewport(ViewportPatch::zoom(8.0));

        // 20 screen units at 8x is 2.5 canvas units.
        assert_eq!(board.hover_target(Point::new(102.0, 50.0)), Some(a));
        assert_eq!(board.hover_target(Point::new(103.0, 50.0)), None);
    }

    #[test]
    fn test_align_drag() {
        let mut board = Board::new();
        board.add_entity(EntityKind::Rect, Placement::at(0.0, 0.0).with_size(100.0, 100.0));
        let b = board.add_entity(EntityKind::Rect, Placement::at(300.0, 300.0).with_size(100.0, 100.0));

        let result = board.align_drag(b, Point::new(103.0, 300.0), None).unwrap();
        assert!(result.snapped_x);
        assert!(!result.snapped_y);
        assert_eq!(result.point, Point::new(100.0, 300.0));
        // Read-only.
        assert_eq!(board.entity(b).unwrap().position, Point::new(300.0, 300.0));
    }

    #[test]
    fn test_fit_to_content() {
        let mut board = Board::new();
        assert!(!board.fit_to_content(Size::new(800.0, 600.0)));
        board.add_entity(EntityKind::Rect, Placement::at(0.0, 0.0).with_size(350.0, 250.0));
        assert!(board.fit_to_content(Size::new(800.0, 600.0)));
        assert!((board.viewport().zoom - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_events_and_revision() {
        let mut board = Board::new();
        let a = board.add_entity(EntityKind::Sticky, Placement::at(0.0, 0.0));
        board.select(&[a]);
        board.pan_by(Vec2::new(5.0, 0.0));
        board.set_tool(ToolKind::Line);

        assert_eq!(
            board.take_events(),
            vec![
                BoardEvent::EntityAdded(a),
                BoardEvent::SelectionChanged,
                BoardEvent::ViewportChanged,
                BoardEvent::ToolChanged(ToolKind::Line),
            ]
        );
        assert!(board.take_events().is_empty());
        assert_eq!(board.revision(), 1);

        board.delete_entity(a);
        assert_eq!(board.revision(), 2);
        assert_eq!(
            board.take_events(),
            vec![BoardEvent::EntitiesRemoved(vec![a]), BoardEvent::SelectionChanged]
        );
    }

    #[test]
    fn test_with_config_validates() {
        let config = BoardConfig {
            min_zoom: 2.0,
            max_zoom: 1.0,
            ..BoardConfig::default()
        };
        assert!(Board::with_config(config).is_err());

        let config = BoardConfig {
            min_zoom: 0.5,
            max_zoom: 2.0,
            ..BoardConfig::default()
        };
        let mut board = Board::with_config(config).unwrap();
        board.set_viewport(ViewportPatch::zoom(10.0));
        assert!((board.viewport().zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_placement_kind_follows_tool() {
        let mut board = Board::new();
        assert_eq!(board.placement_kind(), None);
        board.set_tool(ToolKind::Image);
        assert_eq!(board.placement_kind(), Some(EntityKind::Image));
    }
}
