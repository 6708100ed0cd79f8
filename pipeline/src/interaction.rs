use glam::Vec2;

use crate::editor::Selection;
use crate::graph::{Component, ComponentId, ConnectError, Connection, ConnectionId};

/// Collects the edits and transient notices produced while handling canvas
/// events. Continuous gestures (moves, pan/zoom) coalesce into a single
/// pending action until an immediate action or an explicit flush lands them.
#[derive(Debug, Default)]
pub struct EditorInteraction {
    pub actions: Vec<EditAction>,
    pub notices: Vec<Notice>,

    pending: Option<EditAction>,
}

#[derive(Debug, Clone)]
pub enum EditAction {
    ComponentAdded {
        component_id: ComponentId,
    },
    ComponentRemoved {
        component: Component,
        connections: Vec<Connection>,
    },
    ComponentRenamed {
        component_id: ComponentId,
        before: String,
        after: String,
    },
    ConfigChanged {
        component_id: ComponentId,
        key: String,
    },
    ComponentMoved {
        component_id: ComponentId,
        before: Vec2,
        after: Vec2,
    },
    ConnectionAdded {
        connection_id: ConnectionId,
    },
    ConnectionRemoved {
        connection: Connection,
    },
    SelectionChanged {
        before: Selection,
        after: Selection,
    },
    ViewChanged {
        before_pan: Vec2,
        before_zoom: f32,
        after_pan: Vec2,
        after_zoom: f32,
    },
}

/// Transient user-facing feedback, rendered as a toast and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    ConnectionRejected(ConnectError),
    Saved,
    SaveFailed(String),
}

impl EditorInteraction {
    pub fn clear(&mut self) {
        self.actions.clear();
        self.notices.clear();
        self.pending = None;
    }

    pub fn add_action(&mut self, action: EditAction) {
        if action.immediate() {
            self.flush();
            self.actions.push(action);
        } else {
            self.add_pending_action(action);
        }
    }

    pub fn add_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Lands the in-flight coalesced action, if any.
    pub fn flush(&mut self) {
        if let Some(action) = self.pending.take() {
            self.actions.push(action);
        }
    }

    fn add_pending_action(&mut self, action: EditAction) {
        let merged = match (self.pending.as_mut(), &action) {
            (
                Some(EditAction::ComponentMoved {
                    component_id, after, ..
                }),
                EditAction::ComponentMoved {
                    component_id: new_id,
                    after: new_after,
                    ..
                },
            ) if component_id == new_id => {
                *after = *new_after;
                true
            }
            (
                Some(EditAction::ViewChanged {
                    after_pan,
                    after_zoom,
                    ..
                }),
                EditAction::ViewChanged {
                    after_pan: new_pan,
                    after_zoom: new_zoom,
                    ..
                },
            ) => {
                *after_pan = *new_pan;
                *after_zoom = *new_zoom;
                true
            }
            _ => false,
        };

        if !merged {
            self.flush();
            self.pending = Some(action);
        }
    }
}

impl EditAction {
    /// Whether this edit changes what a saved pipeline would contain, as
    /// opposed to view-only state.
    pub fn affects_pipeline(&self) -> bool {
        match self {
            EditAction::ComponentAdded { .. }
            | EditAction::ComponentRemoved { .. }
            | EditAction::ComponentRenamed { .. }
            | EditAction::ConfigChanged { .. }
            | EditAction::ComponentMoved { .. }
            | EditAction::ConnectionAdded { .. }
            | EditAction::ConnectionRemoved { .. } => true,

            EditAction::SelectionChanged { .. } | EditAction::ViewChanged { .. } => false,
        }
    }

    pub fn immediate(&self) -> bool {
        match self {
            EditAction::ComponentAdded { .. }
            | EditAction::ComponentRemoved { .. }
            | EditAction::ComponentRenamed { .. }
            | EditAction::ConfigChanged { .. }
            | EditAction::ConnectionAdded { .. }
            | EditAction::ConnectionRemoved { .. }
            | EditAction::SelectionChanged { .. } => true,

            EditAction::ComponentMoved { .. } | EditAction::ViewChanged { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn moves_coalesce_until_flushed() {
        let mut interaction = EditorInteraction::default();
        let id = ComponentId::unique();

        for i in 1..=5 {
            interaction.add_action(EditAction::ComponentMoved {
                component_id: id,
                before: Vec2::ZERO,
                after: vec2(i as f32, 0.0),
            });
        }
        assert!(interaction.actions.is_empty());

        interaction.flush();
        assert_eq!(interaction.actions.len(), 1);
        match &interaction.actions[0] {
            EditAction::ComponentMoved { before, after, .. } => {
                assert_eq!(*before, Vec2::ZERO);
                assert_eq!(*after, vec2(5.0, 0.0));
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn immediate_action_flushes_pending() {
        let mut interaction = EditorInteraction::default();
        let id = ComponentId::unique();

        interaction.add_action(EditAction::ComponentMoved {
            component_id: id,
            before: Vec2::ZERO,
            after: vec2(1.0, 1.0),
        });
        interaction.add_action(EditAction::ConnectionAdded {
            connection_id: ConnectionId::unique(),
        });

        assert_eq!(interaction.actions.len(), 2);
        assert!(matches!(
            interaction.actions[0],
            EditAction::ComponentMoved { .. }
        ));
        assert!(matches!(
            interaction.actions[1],
            EditAction::ConnectionAdded { .. }
        ));
    }

    #[test]
    fn move_of_other_component_lands_previous_move() {
        let mut interaction = EditorInteraction::default();
        let first = ComponentId::unique();
        let second = ComponentId::unique();

        interaction.add_action(EditAction::ComponentMoved {
            component_id: first,
            before: Vec2::ZERO,
            after: vec2(1.0, 0.0),
        });
        interaction.add_action(EditAction::ComponentMoved {
            component_id: second,
            before: Vec2::ZERO,
            after: vec2(2.0, 0.0),
        });

        assert_eq!(interaction.actions.len(), 1);
    }
}
