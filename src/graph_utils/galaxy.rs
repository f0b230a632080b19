use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::canvas::geometry::{golden_spiral_position, Point, Rect};
use super::style::{palette_color_for, LinkStyle, NodeKind, NoteCategory};

// Basic type aliases for clarity
pub type NodeId = Uuid;
pub type LinkId = Uuid;

pub const DEFAULT_NODE_LABEL: &str = "New Idea";
pub const DEFAULT_NODE_DESCRIPTION: &str = "Double-clicked to create.";

const NOTE_LABEL_MAX_CHARS: usize = 20;
const NOTE_DESCRIPTION_MAX_CHARS: usize = 100;
const NOTE_SPIRAL_SPACING: f32 = 90.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub label: String,
    #[serde(default)]
    pub kind: NodeKind,
    pub icon: String,
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub linked_note_id: Option<String>,
}

impl Node {
    pub fn position(&self) -> Point { Point::new(self.x, self.y) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub style: LinkStyle,
}

impl Link {
    /// True if this link joins `a` and `b` in either direction.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }
}

/// Partial edit from the side panel; `None` fields are left alone.
#[derive(Clone, Debug, Default)]
pub struct NodePatch {
    pub label: Option<String>,
    pub description: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub kind: Option<NodeKind>,
}

/// A note to be represented in the galaxy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NoteSeed {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: Option<NoteCategory>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// In-memory nodes and links of one galaxy.
///
/// Ids are UUID v7, so map order is creation order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GalaxyStore {
    pub nodes: BTreeMap<NodeId, Node>,
    pub links: BTreeMap<LinkId, Link>,
}

impl GalaxyStore {
    // Instantiate a new, empty galaxy
    pub fn new() -> Self {
        GalaxyStore {
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    /// Small demo galaxy shown on first launch.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        let hub = store.insert_node(Point::new(0.0, 0.0), "Vicoo", NoteCategory::Idea);
        store.update_node(hub, NodePatch {
            icon: Some("hub".to_string()),
            description: Some("Your knowledge galaxy starts here.".to_string()),
            ..Default::default()
        });
        let spokes = [
            (Point::new(-220.0, -140.0), "Ideas", NoteCategory::Idea),
            (Point::new(220.0, -140.0), "Code", NoteCategory::Code),
            (Point::new(-220.0, 160.0), "Design", NoteCategory::Design),
            (Point::new(220.0, 160.0), "Meetings", NoteCategory::Meeting),
        ];
        for (pos, label, category) in spokes {
            let id = store.insert_node(pos, label, category);
            store.create_link(hub, id);
        }
        store
    }

    fn insert_node(&mut self, pos: Point, label: &str, category: NoteCategory) -> NodeId {
        let style = category.style();
        let id = Uuid::now_v7();
        let node = Node {
            id,
            x: pos.x,
            y: pos.y,
            label: label.to_string(),
            kind: NodeKind::Planet,
            icon: style.icon.to_string(),
            color: style.color.to_string(),
            description: String::new(),
            tags: BTreeSet::new(),
            linked_note_id: None,
        };
        self.nodes.insert(id, node);
        id
    }

    /// Add a default "idea" node at a world position and return its id.
    /// Returns `None` when the position is not finite.
    pub fn create_node(&mut self, x: f32, y: f32) -> Option<NodeId> {
        let pos = Point::new(x, y);
        if !pos.is_finite() {
            return None;
        }
        let id = self.insert_node(pos, DEFAULT_NODE_LABEL, NoteCategory::Idea);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.description = DEFAULT_NODE_DESCRIPTION.to_string();
        }
        log::debug!("created node {} at ({}, {})", id, x, y);
        Some(id)
    }

    /// Overwrite a node position. Unknown ids are ignored: a drag may outlive its node by a frame.
    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.x = x;
            node.y = y;
        }
    }

    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else { return false };
        if let Some(label) = patch.label { node.label = label; }
        if let Some(description) = patch.description { node.description = description; }
        if let Some(tags) = patch.tags { node.tags = tags; }
        if let Some(icon) = patch.icon { node.icon = icon; }
        if let Some(color) = patch.color { node.color = color; }
        if let Some(kind) = patch.kind { node.kind = kind; }
        true
    }

    pub fn create_link(&mut self, source: NodeId, target: NodeId) -> Option<LinkId> {
        self.create_link_styled(source, target, LinkStyle::Solid)
    }

    /// Add a link unless it is a self link, an endpoint is missing, or the
    /// unordered pair is already linked.
    pub fn create_link_styled(&mut self, source: NodeId, target: NodeId, style: LinkStyle) -> Option<LinkId> {
        if source == target {
            return None;
        }
        if !(self.nodes.contains_key(&source) && self.nodes.contains_key(&target)) {
            return None;
        }
        if self.find_link_between(source, target).is_some() {
            log::debug!("link {} <-> {} already exists", source, target);
            return None;
        }
        let id = Uuid::now_v7();
        self.links.insert(id, Link { id, source, target, style });
        log::debug!("linked {} -> {}", source, target);
        Some(id)
    }

    pub fn find_link_between(&self, a: NodeId, b: NodeId) -> Option<&Link> {
        self.links.values().find(|l| l.connects(a, b))
    }

    // Delete operations
    pub fn delete_link(&mut self, id: LinkId) -> bool {
        self.links.remove(&id).is_some()
    }

    pub fn delete_node(&mut self, id: NodeId) -> bool {
        if self.nodes.remove(&id).is_some() {
            // Cascade delete links touching this node
            self.links.retain(|_, link| !link.touches(id));
            log::debug!("deleted node {}", id);
            true
        } else {
            false
        }
    }

    pub fn connect_note(&mut self, id: NodeId, note_id: String) -> bool {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.linked_note_id = Some(note_id);
            true
        } else {
            false
        }
    }

    pub fn find_node(&self, id: NodeId) -> Option<&Node> { self.nodes.get(&id) }
    pub fn find_link(&self, id: LinkId) -> Option<&Link> { self.links.get(&id) }
    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn link_count(&self) -> usize { self.links.len() }

    /// Case-insensitive substring match on labels. An empty query matches everything.
    pub fn filter_by_label(&self, query: &str) -> Vec<&Node> {
        let needle = query.to_lowercase();
        self
            .nodes
            .values()
            .filter(|n| needle.is_empty() || n.label.to_lowercase().contains(&needle))
            .collect()
    }

    /// Topmost node whose disc (radius scaled by `radius_scale`) contains `world`.
    pub fn node_at(&self, world: Point, radius_scale: f32) -> Option<NodeId> {
        self
            .nodes
            .values()
            .rev()
            .find(|n| {
                let r = n.kind.radius() * radius_scale;
                n.position().distance_sq(world) <= r * r
            })
            .map(|n| n.id)
    }

    /// Nodes not standing for any note.
    pub fn orphans(&self) -> Vec<&Node> {
        self
            .nodes
            .values()
            .filter(|n| n.linked_note_id.as_deref().is_none_or(str::is_empty))
            .collect()
    }

    pub fn links_of(&self, id: NodeId) -> Vec<&Link> {
        self.links.values().filter(|l| l.touches(id)).collect()
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.links.values().filter(|l| l.touches(id)).count()
    }

    /// Add one planet per note that no node links to yet. Returns the new ids.
    /// Drop every node and link.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
    }

    /// Clear the galaxy, then lay out `notes` from scratch.
    pub fn replace_with_notes(&mut self, notes: &[NoteSeed]) -> Vec<NodeId> {
        log::info!("replacing {} node(s) and {} link(s)", self.nodes.len(), self.links.len());
        self.clear();
        self.add_note_nodes(notes)
    }

    /// World rectangle covering every node disc, or `None` for an empty galaxy.
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes
            .values()
            .map(|n| {
                let d = n.kind.radius() * 2.0;
                Rect::from_center_size(n.position(), d, d)
            })
            .reduce(|acc, r| acc.union(&r))
    }

    pub fn add_note_nodes(&mut self, notes: &[NoteSeed]) -> Vec<NodeId> {
        let mut linked: BTreeSet<String> = self
            .nodes
            .values()
            .filter_map(|n| n.linked_note_id.clone())
            .collect();
        let mut created = Vec::new();
        let mut k = self.nodes.len() as u32;
        for note in notes {
            if !linked.insert(note.id.clone()) {
                continue;
            }
            let pos = golden_spiral_position(Point::ZERO, k, NOTE_SPIRAL_SPACING);
            k += 1;
            let (icon, color) = match note.category {
                Some(category) => {
                    let s = category.style();
                    (s.icon, s.color)
                }
                None => ("circle", palette_color_for(&note.id)),
            };
            let id = Uuid::now_v7();
            self.nodes.insert(id, Node {
                id,
                x: pos.x,
                y: pos.y,
                label: note_label(&note.title),
                kind: NodeKind::Planet,
                icon: icon.to_string(),
                color: color.to_string(),
                description: note_description(&note.content),
                tags: note.tags.iter().cloned().collect(),
                linked_note_id: Some(note.id.clone()),
            });
            created.push(id);
        }
        log::info!("added {} node(s) from {} note(s)", created.len(), notes.len());
        created
    }
}

fn note_label(title: &str) -> String {
    if title.chars().count() > NOTE_LABEL_MAX_CHARS {
        let head: String = title.chars().take(NOTE_LABEL_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

fn note_description(content: &str) -> String {
    content
        .chars()
        .take(NOTE_DESCRIPTION_MAX_CHARS)
        .filter(|c| !matches!(c, '#' | '*' | '`'))
        .collect()
}
