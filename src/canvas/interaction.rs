//! Pointer gesture handling for the galaxy canvas.
//!
//! Raw pointer, wheel and double-click events are folded into a single
//! [`Mode`]; each event results in at most one mutation of the store or the
//! viewport, reported back as an [`Effect`].

use crate::graph_utils::galaxy::{GalaxyStore, LinkId, NodeId};
use super::geometry::Point;
use super::viewport::Viewport;

/// Screen distance under which a press-release counts as a click.
pub const CLICK_SLOP: f32 = 3.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Input to the state machine. Positions are canvas-local screen pixels,
/// `hit` is the node under the pointer as resolved by the caller.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CanvasEvent {
    PointerDown { pos: Point, button: PointerButton, shift: bool, hit: Option<NodeId> },
    PointerMove { pos: Point },
    PointerUp { pos: Point, hit: Option<NodeId> },
    PointerLeave,
    DoubleClick { pos: Point, hit: Option<NodeId> },
    Wheel { delta_y: f32 },
    Cancel,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Mode {
    Idle,
    Panning { press: Point, last: Point, moved: bool },
    DraggingNode { id: NodeId, press: Point, moved: bool },
    LinkingFrom { source: NodeId, cursor: Point },
}

/// What an event did, so the caller can mark state dirty or log.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Effect {
    None,
    Panned,
    Zoomed,
    PanStarted,
    DragStarted(NodeId),
    NodeMoved(NodeId),
    DragFinished(NodeId),
    LinkStarted(NodeId),
    LinkCreated(LinkId),
    LinkDiscarded,
    NodeCreated(NodeId),
    Selected(NodeId),
    SelectionCleared,
}

impl Effect {
    /// Whether the effect changed persisted state (store or viewport).
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Effect::Panned
                | Effect::Zoomed
                | Effect::NodeMoved(_)
                | Effect::DragFinished(_)
                | Effect::LinkCreated(_)
                | Effect::NodeCreated(_)
        )
    }
}

#[derive(Clone, Debug)]
pub struct Interaction {
    mode: Mode,
    selected: Option<NodeId>,
    linking_toggle: bool,
    snap_grid: Option<f32>,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self { mode: Mode::Idle, selected: None, linking_toggle: false, snap_grid: None }
    }

    /// Round dragged nodes to a grid on release. `None` or a non-positive size disables it.
    pub fn with_snap_grid(mut self, grid: Option<f32>) -> Self {
        self.set_snap_grid(grid);
        self
    }

    pub fn set_snap_grid(&mut self, grid: Option<f32>) {
        self.snap_grid = grid.filter(|g| g.is_finite() && *g > 0.0);
    }

    pub fn mode(&self) -> Mode { self.mode }
    pub fn selected(&self) -> Option<NodeId> { self.selected }
    pub fn linking_toggle(&self) -> bool { self.linking_toggle }

    pub fn is_panning(&self) -> bool { matches!(self.mode, Mode::Panning { .. }) }

    pub fn dragging(&self) -> Option<NodeId> {
        match self.mode {
            Mode::DraggingNode { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn linking_from(&self) -> Option<NodeId> {
        match self.mode {
            Mode::LinkingFrom { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn set_linking_toggle(&mut self, on: bool) {
        self.linking_toggle = on;
    }

    pub fn toggle_linking(&mut self) {
        self.linking_toggle = !self.linking_toggle;
    }

    pub fn select(&mut self, id: NodeId) {
        self.selected = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Drop the selection if it points at a node that no longer exists.
    pub fn forget_missing(&mut self, store: &GalaxyStore) {
        if self.selected.is_some_and(|id| store.find_node(id).is_none()) {
            self.selected = None;
        }
    }

    /// Delete the selected node (and its links). Returns the deleted id.
    pub fn delete_selected(&mut self, store: &mut GalaxyStore) -> Option<NodeId> {
        let id = self.selected.take()?;
        store.delete_node(id).then_some(id)
    }

    /// World-space segment from the link source to the cursor while linking.
    pub fn link_preview(&self, store: &GalaxyStore) -> Option<(Point, Point)> {
        match self.mode {
            Mode::LinkingFrom { source, cursor } => {
                store.find_node(source).map(|n| (n.position(), cursor))
            }
            _ => None,
        }
    }

    pub fn handle(&mut self, event: CanvasEvent, store: &mut GalaxyStore, viewport: &mut Viewport) -> Effect {
        match event {
            CanvasEvent::Wheel { delta_y } => {
                viewport.wheel(delta_y);
                Effect::Zoomed
            }
            CanvasEvent::PointerDown { pos, button, shift, hit } => self.on_down(pos, button, shift, hit, viewport),
            CanvasEvent::PointerMove { pos } => self.on_move(pos, store, viewport),
            CanvasEvent::PointerUp { pos, hit } => self.on_up(pos, hit, store, viewport),
            CanvasEvent::PointerLeave | CanvasEvent::Cancel => self.on_leave(),
            CanvasEvent::DoubleClick { pos, hit } => self.on_double_click(pos, hit, store, viewport),
        }
    }

    fn on_down(&mut self, pos: Point, button: PointerButton, shift: bool, hit: Option<NodeId>, viewport: &Viewport) -> Effect {
        if button != PointerButton::Primary || self.mode != Mode::Idle {
            return Effect::None;
        }
        match hit {
            Some(id) if shift || self.linking_toggle => {
                self.mode = Mode::LinkingFrom { source: id, cursor: viewport.screen_to_world(pos) };
                log::debug!("linking from {}", id);
                Effect::LinkStarted(id)
            }
            Some(id) => {
                self.mode = Mode::DraggingNode { id, press: pos, moved: false };
                Effect::DragStarted(id)
            }
            None if !shift => {
                self.mode = Mode::Panning { press: pos, last: pos, moved: false };
                Effect::PanStarted
            }
            None => Effect::None,
        }
    }

    fn on_move(&mut self, pos: Point, store: &mut GalaxyStore, viewport: &mut Viewport) -> Effect {
        match &mut self.mode {
            Mode::Idle => Effect::None,
            Mode::Panning { press, last, moved } => {
                viewport.pan(pos.x - last.x, pos.y - last.y);
                *last = pos;
                if press.distance(pos) > CLICK_SLOP {
                    *moved = true;
                }
                Effect::Panned
            }
            Mode::DraggingNode { id, press, moved } => {
                let w = viewport.screen_to_world(pos);
                store.move_node(*id, w.x, w.y);
                if press.distance(pos) > CLICK_SLOP {
                    *moved = true;
                }
                Effect::NodeMoved(*id)
            }
            Mode::LinkingFrom { cursor, .. } => {
                *cursor = viewport.screen_to_world(pos);
                Effect::None
            }
        }
    }

    fn on_up(&mut self, pos: Point, hit: Option<NodeId>, store: &mut GalaxyStore, viewport: &Viewport) -> Effect {
        let mode = std::mem::replace(&mut self.mode, Mode::Idle);
        match mode {
            Mode::Idle => Effect::None,
            Mode::Panning { moved, .. } => {
                if moved {
                    Effect::Panned
                } else {
                    self.selected = None;
                    Effect::SelectionCleared
                }
            }
            Mode::DraggingNode { id, moved, .. } => {
                if !moved {
                    if store.find_node(id).is_some() {
                        self.selected = Some(id);
                        return Effect::Selected(id);
                    }
                    return Effect::None;
                }
                let w = viewport.screen_to_world(pos);
                let w = match self.snap_grid {
                    Some(g) => Point::new((w.x / g).round() * g, (w.y / g).round() * g),
                    None => w,
                };
                store.move_node(id, w.x, w.y);
                Effect::DragFinished(id)
            }
            Mode::LinkingFrom { source, .. } => match hit {
                Some(target) if target != source => match store.create_link(source, target) {
                    Some(link) => Effect::LinkCreated(link),
                    None => Effect::LinkDiscarded,
                },
                _ => Effect::LinkDiscarded,
            },
        }
    }

    fn on_leave(&mut self) -> Effect {
        match std::mem::replace(&mut self.mode, Mode::Idle) {
            Mode::Idle | Mode::Panning { moved: false, .. } => Effect::None,
            Mode::Panning { moved: true, .. } => Effect::Panned,
            Mode::DraggingNode { id, .. } => Effect::DragFinished(id),
            Mode::LinkingFrom { .. } => Effect::LinkDiscarded,
        }
    }

    fn on_double_click(&mut self, pos: Point, hit: Option<NodeId>, store: &mut GalaxyStore, viewport: &Viewport) -> Effect {
        if hit.is_some() || self.is_panning() {
            return Effect::None;
        }
        let w = viewport.screen_to_world(pos);
        match store.create_node(w.x, w.y) {
            Some(id) => {
                self.selected = Some(id);
                Effect::NodeCreated(id)
            }
            None => Effect::None,
        }
    }
}
