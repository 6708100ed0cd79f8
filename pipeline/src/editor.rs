use glam::Vec2;

use crate::graph::{ComponentId, ConnectionId, Pipeline, PortRef};
use crate::interaction::{EditAction, EditorInteraction, Notice};
use crate::library::ComponentTemplate;
use crate::store::PipelineStore;
use crate::viewport::Viewport;

/// Exactly one of nothing, a component, or a connection is selected at a time.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Selection {
    #[default]
    None,
    Component(ComponentId),
    Connection(ConnectionId),
}

/// The two-phase connection gesture. Phase 1 (clicking an output port) enters
/// `DrawingFrom`; phase 2 (clicking an input port) validates and completes.
/// Clicking empty canvas cancels back to `Idle`.
#[derive(Clone, Debug, Default)]
pub enum ConnectGesture {
    #[default]
    Idle,
    DrawingFrom {
        source: PortRef,
        /// Screen position of the source port, the anchor of the rubber-band
        /// line while drawing.
        start: Vec2,
    },
}

impl ConnectGesture {
    pub fn is_drawing(&self) -> bool {
        matches!(self, ConnectGesture::DrawingFrom { .. })
    }
}

#[derive(Debug)]
struct ComponentDrag {
    component_id: ComponentId,
    start_pos: Vec2,
}

/// Headless canvas controller: translates pointer and toolbar events into
/// pipeline mutations, selection changes, and viewport updates. Rendering is
/// left to the caller.
#[derive(Debug)]
pub struct PipelineEditor {
    pipeline: Pipeline,
    viewport: Viewport,
    selection: Selection,
    gesture: ConnectGesture,
    drag: Option<ComponentDrag>,
    panning: bool,
    dirty: bool,

    pub interaction: EditorInteraction,
}

impl PipelineEditor {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            viewport: Viewport::default(),
            selection: Selection::None,
            gesture: ConnectGesture::Idle,
            drag: None,
            panning: false,
            dirty: false,
            interaction: EditorInteraction::default(),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
    pub fn selection(&self) -> Selection {
        self.selection
    }
    pub fn gesture(&self) -> &ConnectGesture {
        &self.gesture
    }
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // === Canvas events ===

    /// Pointer-down on empty canvas: deselect, cancel any pending connection,
    /// begin panning.
    pub fn canvas_pointer_down(&mut self) {
        self.set_selection(Selection::None);
        self.cancel_gesture();
        self.panning = true;
    }

    /// Pointer-down on a component: select it and begin dragging.
    pub fn component_pointer_down(&mut self, component_id: ComponentId) {
        let Some(component) = self.pipeline.component_by_id(component_id) else {
            tracing::warn!("Pointer down on unknown component {}", component_id);
            return;
        };
        let start_pos = component.position;

        self.set_selection(Selection::Component(component_id));
        self.drag = Some(ComponentDrag {
            component_id,
            start_pos,
        });
    }

    /// Applies a pointer movement delta in screen pixels. Routes to the
    /// in-flight component drag (scaled by the inverse zoom) or to canvas
    /// panning.
    pub fn pointer_moved(&mut self, delta: Vec2) {
        if let Some(drag) = &self.drag {
            let graph_delta = self.viewport.screen_delta_to_graph(delta);
            let component_id = drag.component_id;
            let start_pos = drag.start_pos;
            if let Some(component) = self.pipeline.component_by_id_mut(component_id) {
                component.position += graph_delta;
                let after = component.position;
                self.record(EditAction::ComponentMoved {
                    component_id,
                    before: start_pos,
                    after,
                });
            }
        } else if self.panning {
            let before = self.viewport;
            self.viewport.pan_by(delta);
            self.record_view_change(before);
        }
    }

    /// Pointer-up ends the current pan or drag and lands the coalesced action.
    /// A release that reaches the canvas without completing a pending
    /// connection abandons it; releases over an input port are routed to
    /// [`Self::input_port_clicked`] instead.
    pub fn pointer_up(&mut self) {
        self.panning = false;
        self.drag = None;
        self.cancel_gesture();
        self.interaction.flush();
    }

    pub fn zoom_in(&mut self) {
        let before = self.viewport;
        self.viewport.zoom_in();
        self.record_view_change(before);
    }

    pub fn zoom_out(&mut self) {
        let before = self.viewport;
        self.viewport.zoom_out();
        self.record_view_change(before);
    }

    fn record_view_change(&mut self, before: Viewport) {
        if before == self.viewport {
            return;
        }
        self.record(EditAction::ViewChanged {
            before_pan: before.pan,
            before_zoom: before.zoom,
            after_pan: self.viewport.pan,
            after_zoom: self.viewport.zoom,
        });
    }

    /// Records an action and marks the editor dirty when the action changes
    /// what a saved pipeline would contain.
    fn record(&mut self, action: EditAction) {
        if action.affects_pipeline() {
            self.dirty = true;
        }
        self.interaction.add_action(action);
    }

    // === Graph edits ===

    pub fn add_from_template(&mut self, template: &ComponentTemplate) -> ComponentId {
        let component = template.instantiate();
        let component_id = component.id;
        self.pipeline.add_component(component);
        self.set_selection(Selection::Component(component_id));
        self.record(EditAction::ComponentAdded { component_id });
        component_id
    }

    pub fn remove_component(&mut self, component_id: ComponentId) {
        let Some(component) = self.pipeline.component_by_id(component_id).cloned() else {
            return;
        };
        let connections = self.pipeline.remove_component(component_id);

        let selection_removed = match self.selection {
            Selection::Component(id) => id == component_id,
            Selection::Connection(id) => connections.iter().any(|c| c.id == id),
            Selection::None => false,
        };
        if selection_removed {
            self.set_selection(Selection::None);
        }
        if let ConnectGesture::DrawingFrom { source, .. } = &self.gesture {
            if source.component_id == component_id {
                self.gesture = ConnectGesture::Idle;
            }
        }

        self.record(EditAction::ComponentRemoved {
            component,
            connections,
        });
    }

    pub fn remove_connection(&mut self, connection_id: ConnectionId) {
        let Some(connection) = self.pipeline.remove_connection(connection_id) else {
            return;
        };
        if self.selection == Selection::Connection(connection_id) {
            self.set_selection(Selection::None);
        }
        self.record(EditAction::ConnectionRemoved { connection });
    }

    pub fn select_component(&mut self, component_id: ComponentId) {
        if self.pipeline.component_by_id(component_id).is_some() {
            self.set_selection(Selection::Component(component_id));
        }
    }

    pub fn select_connection(&mut self, connection_id: ConnectionId) {
        if self.pipeline.connection_by_id(connection_id).is_some() {
            self.set_selection(Selection::Connection(connection_id));
        }
    }

    // === Two-phase connection gesture ===

    /// Phase 1: clicking an output port records the pending source.
    pub fn output_port_clicked(&mut self, component_id: ComponentId, port_id: &str, screen_pos: Vec2) {
        self.gesture = ConnectGesture::DrawingFrom {
            source: PortRef::new(component_id, port_id),
            start: screen_pos,
        };
    }

    /// Phase 2: clicking an input port completes the pending connection.
    /// Rejections leave the connection list untouched and surface a notice.
    pub fn input_port_clicked(&mut self, component_id: ComponentId, port_id: &str) {
        let gesture = std::mem::take(&mut self.gesture);
        let ConnectGesture::DrawingFrom { source, .. } = gesture else {
            return;
        };

        let target = PortRef::new(component_id, port_id);
        match self.pipeline.connect(source, target) {
            Ok(connection_id) => {
                self.record(EditAction::ConnectionAdded { connection_id });
            }
            Err(err) => {
                tracing::debug!("Connection rejected: {}", err);
                self.interaction
                    .add_notice(Notice::ConnectionRejected(err));
            }
        }
    }

    pub fn cancel_gesture(&mut self) {
        self.gesture = ConnectGesture::Idle;
    }

    // === Property panel edits ===

    pub fn rename_component(&mut self, component_id: ComponentId, name: &str) {
        let Some(component) = self.pipeline.component_by_id_mut(component_id) else {
            return;
        };
        let before = std::mem::replace(&mut component.name, name.to_string());
        self.record(EditAction::ComponentRenamed {
            component_id,
            before,
            after: name.to_string(),
        });
    }

    pub fn set_config_value(
        &mut self,
        component_id: ComponentId,
        key: &str,
        value: serde_json::Value,
    ) {
        let Some(component) = self.pipeline.component_by_id_mut(component_id) else {
            return;
        };
        component.config.insert(key.to_string(), value);
        self.record(EditAction::ConfigChanged {
            component_id,
            key: key.to_string(),
        });
    }

    pub fn set_component_position(&mut self, component_id: ComponentId, position: Vec2) {
        let Some(component) = self.pipeline.component_by_id_mut(component_id) else {
            return;
        };
        let before = std::mem::replace(&mut component.position, position);
        self.record(EditAction::ComponentMoved {
            component_id,
            before,
            after: position,
        });
    }

    fn set_selection(&mut self, after: Selection) {
        if self.selection == after {
            return;
        }
        let before = std::mem::replace(&mut self.selection, after);
        self.record(EditAction::SelectionChanged { before, after });
    }

    // === Persistence ===

    /// Hands the current pipeline to the injected store. Success and failure
    /// both surface as transient notices; nothing is retried.
    pub async fn save(&mut self, store: &dyn PipelineStore) {
        match store.save(&self.pipeline).await {
            Ok(()) => {
                tracing::info!("Pipeline {} saved", self.pipeline.id);
                self.dirty = false;
                self.interaction.add_notice(Notice::Saved);
            }
            Err(err) => {
                tracing::warn!("Failed to save pipeline {}: {}", self.pipeline.id, err);
                self.interaction
                    .add_notice(Notice::SaveFailed(err.to_string()));
            }
        }
    }
}
