use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, Pos2, Sense, Stroke, Vec2};

use crate::canvas::geometry::{self, link_curve, reveal, Point};
use crate::canvas::interaction::{CanvasEvent, Effect, Interaction, Mode, PointerButton};
use crate::canvas::viewport::{Viewport, MAX_SCALE, MIN_SCALE};
use crate::graph_utils::galaxy::{GalaxyStore, LinkId, NodeId, NodePatch};
use crate::graph_utils::style::{icon_glyph, LinkStyle, NodeKind};
use crate::persistence::export;
use crate::persistence::persist::{self, GalaxyStateFile};
use crate::persistence::settings::{AppSettings, Environment, Language, Theme, UiText};

const PANEL_WIDTH: f32 = 320.0;
const PANEL_MARGIN: f32 = 16.0;
const GRID_GAP: f32 = 40.0;
const SEARCH_RESULTS: usize = 5;
const ZOOM_BUTTON_STEP: f32 = 0.2;
const MINIMAP_SIZE: Vec2 = Vec2::new(200.0, 140.0);
// Bottom strip kept clear for the help text
const HELP_STRIP: f32 = 32.0;
const INK: Color32 = Color32::from_rgb(26, 26, 26);
const SELECT_RING: Color32 = Color32::from_rgb(239, 71, 111);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ZoomControl {
    In,
    Out,
    Fit,
}

// Style for toast notifications
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NoticeStyle {
    Subtle,
    Prominent,
}

fn to_pos2(p: Point) -> Pos2 { Pos2::new(p.x, p.y) }

fn to_egui_rect(r: geometry::Rect) -> egui::Rect {
    egui::Rect::from_min_max(to_pos2(r.min), to_pos2(r.max))
}

fn pointer_left_canvas(canvas: egui::Rect, pos: Pos2, mode: Mode) -> bool {
    mode != Mode::Idle && !canvas.contains(pos)
}

/// Uniform mapping of a world rectangle into the minimap frame.
struct MiniMapProjection {
    world_center: Point,
    frame_center: Pos2,
    scale: f32,
}

impl MiniMapProjection {
    fn new(world: &geometry::Rect, frame: egui::Rect) -> Self {
        let sx = frame.width() / world.width().max(1.0);
        let sy = frame.height() / world.height().max(1.0);
        Self { world_center: world.center(), frame_center: frame.center(), scale: sx.min(sy) }
    }

    fn to_map(&self, w: Point) -> Pos2 {
        Pos2::new(
            self.frame_center.x + (w.x - self.world_center.x) * self.scale,
            self.frame_center.y + (w.y - self.world_center.y) * self.scale,
        )
    }

    fn to_world(&self, p: Pos2) -> Point {
        Point::new(
            self.world_center.x + (p.x - self.frame_center.x) / self.scale,
            self.world_center.y + (p.y - self.frame_center.y) / self.scale,
        )
    }
}

fn parse_color(hex: &str) -> Color32 {
    Color32::from_hex(hex).unwrap_or(Color32::from_rgb(255, 209, 102))
}

pub struct GalaxyApp {
    env: Environment,
    store: GalaxyStore,
    viewport: Viewport,
    interaction: Interaction,
    autosave_dir: PathBuf,
    // persistence
    dirty: bool,
    last_change: Instant,
    save_error: Option<String>,
    last_save_info: Option<String>,
    last_info_time: Option<Instant>,
    last_info_style: NoticeStyle,
    show_load_versions: bool,
    // Canvas rect of the previous frame, for resize tracking and local coordinates
    last_canvas_rect: Option<egui::Rect>,
    last_pointer: Option<Pos2>,
    // Fit the whole galaxy into view once the canvas size is known
    fit_pending: bool,
    // Screen rectangle the detail panel grows out of
    panel_origin: Option<geometry::Rect>,
    panel_node: Option<NodeId>,
    search_query: String,
    tag_input: String,
    // Export / import windows
    show_export_window: bool,
    export_is_json: bool,
    export_path: String,
    export_status: Option<String>,
    show_import_window: bool,
    import_path: String,
    import_replace: bool,
    import_status: Option<String>,
    // Settings editor
    show_prefs_window: bool,
    prefs_edit: AppSettings,
    prefs_status: Option<String>,
}

impl GalaxyApp {
    pub fn new(env: Environment, store: GalaxyStore) -> Self {
        let viewport = Viewport::default().with_sensitivity(env.settings().zoom_sensitivity);
        let mut app = Self::with_viewport(env, store, viewport);
        app.fit_pending = true;
        app
    }

    pub fn from_state(env: Environment, state: GalaxyStateFile) -> Self {
        let (store, viewport) = state.into_runtime();
        let viewport = viewport.with_sensitivity(env.settings().zoom_sensitivity);
        Self::with_viewport(env, store, viewport)
    }

    fn with_viewport(env: Environment, store: GalaxyStore, viewport: Viewport) -> Self {
        let interaction = Interaction::new().with_snap_grid(env.settings().snap_grid());
        let autosave_dir = env.settings().autosave_dir();
        let prefs_edit = env.settings().clone();
        Self {
            env,
            store,
            viewport,
            interaction,
            autosave_dir,
            dirty: false,
            last_change: Instant::now(),
            save_error: None,
            last_save_info: None,
            last_info_time: None,
            last_info_style: NoticeStyle::Subtle,
            show_load_versions: false,
            last_canvas_rect: None,
            last_pointer: None,
            fit_pending: false,
            panel_origin: None,
            panel_node: None,
            search_query: String::new(),
            tag_input: String::new(),
            show_export_window: false,
            export_is_json: true,
            export_path: String::new(),
            export_status: None,
            show_import_window: false,
            import_path: String::new(),
            import_replace: true,
            import_status: None,
            show_prefs_window: false,
            prefs_edit,
            prefs_status: None,
        }
    }

    pub fn apply_theme(&self, ctx: &egui::Context) {
        match self.env.theme() {
            Theme::Light => ctx.set_visuals(egui::Visuals::light()),
            Theme::Dark => ctx.set_visuals(egui::Visuals::dark()),
        }
    }

    fn text(&self, key: UiText) -> &'static str {
        self.env.text(key)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.last_change = Instant::now();
    }

    fn notify(&mut self, msg: String, style: NoticeStyle) {
        self.last_save_info = Some(msg);
        self.last_info_time = Some(Instant::now());
        self.last_info_style = style;
    }

    fn save_now_with(&mut self, style: NoticeStyle) {
        let state = GalaxyStateFile::from_runtime(&self.store, &self.viewport);
        match persist::save_active(&self.autosave_dir, &state) {
            Ok(path) => {
                self.dirty = false;
                self.save_error = None;
                self.notify(format!("Saved to {}", path.display()), style);
            }
            Err(e) => {
                log::warn!("save failed: {:#}", e);
                self.save_error = Some(format!("Save failed: {}", e));
            }
        }
    }

    fn save_versioned_now(&mut self) {
        let state = GalaxyStateFile::from_runtime(&self.store, &self.viewport);
        match persist::save_versioned(&self.autosave_dir, &state) {
            Ok(path) => {
                self.save_error = None;
                self.notify(format!("Saved version {}", path.display()), NoticeStyle::Prominent);
            }
            Err(e) => {
                log::warn!("save version failed: {:#}", e);
                self.save_error = Some(format!("Save version failed: {}", e));
            }
        }
    }

    fn replace_state(&mut self, state: GalaxyStateFile) {
        let (store, viewport) = state.into_runtime();
        self.store = store;
        self.viewport = viewport.with_sensitivity(self.env.settings().zoom_sensitivity);
        self.interaction = Interaction::new().with_snap_grid(self.env.settings().snap_grid());
        self.panel_node = None;
        self.dirty = false;
    }

    fn load_latest(&mut self) {
        match persist::load_active(&self.autosave_dir) {
            Ok(Some(state)) => {
                self.replace_state(state);
                self.notify("Loaded latest save".to_string(), NoticeStyle::Prominent);
            }
            Ok(None) => self.notify("No saved galaxy yet".to_string(), NoticeStyle::Subtle),
            Err(e) => {
                log::warn!("load failed: {:#}", e);
                self.save_error = Some(format!("Load failed: {}", e));
            }
        }
    }

    fn new_galaxy(&mut self) {
        self.store = GalaxyStore::new();
        self.interaction = Interaction::new().with_snap_grid(self.env.settings().snap_grid());
        self.viewport.reset();
        self.panel_node = None;
        self.mark_dirty();
    }

    fn center_view(&mut self) {
        self.viewport.reset();
        self.mark_dirty();
    }

    /// Fit every node into the canvas. Returns false when there is nothing
    /// to fit or no canvas yet.
    fn fit_view(&mut self) -> bool {
        let (Some(bounds), Some(rect)) = (self.store.bounds(), self.last_canvas_rect) else { return false };
        let canvas = geometry::Rect::from_min_size(Point::ZERO, rect.width(), rect.height());
        self.viewport.fit(&bounds, &canvas);
        true
    }

    fn focus_node(&mut self, id: NodeId) {
        let (Some(node), Some(rect)) = (self.store.find_node(id), self.last_canvas_rect) else { return };
        let center = Point::new(rect.width() * 0.5, rect.height() * 0.5);
        self.viewport.focus_on(node.position(), center);
        self.interaction.select(id);
        self.search_query.clear();
        self.mark_dirty();
    }

    fn delete_selected(&mut self) {
        if let Some(id) = self.interaction.delete_selected(&mut self.store) {
            log::info!("deleted node {}", id);
            self.panel_node = None;
            self.mark_dirty();
        }
    }

    fn apply(&mut self, event: CanvasEvent) {
        let effect = self.interaction.handle(event, &mut self.store, &mut self.viewport);
        match effect {
            Effect::LinkCreated(id) => log::info!("created link {}", id),
            Effect::NodeCreated(id) => log::info!("created node {}", id),
            Effect::None => {}
            other => log::trace!("canvas effect {:?}", other),
        }
        if effect.mutates() {
            self.mark_dirty();
        }
    }

    fn default_export_path(&self) -> String {
        let now = time::OffsetDateTime::now_utc();
        let fmt = time::macros::format_description!("[year][month][day]_[hour][minute][second]");
        let stamp = now.format(&fmt).unwrap_or_else(|_| "now".into());
        let ext = if self.export_is_json { "json" } else { "csv" };
        let mut base = self.env.settings().export_dir();
        base.push(format!("galaxy_export_{}.{}", stamp, ext));
        base.display().to_string()
    }

    fn apply_settings(&mut self, ctx: &egui::Context, settings: AppSettings) {
        self.viewport.set_sensitivity(settings.zoom_sensitivity);
        self.interaction.set_snap_grid(settings.snap_grid());
        self.autosave_dir = settings.autosave_dir();
        self.env = Environment::new(settings);
        self.apply_theme(ctx);
    }

    /// Translate this frame's egui input into canvas events.
    fn feed_pointer(&mut self, ui: &egui::Ui, canvas: egui::Rect, bg_resp: &egui::Response) {
        let (pos, pressed, released, other_pressed, shift, scroll, double, has_pointer) = ui.input(|i| {
            (
                i.pointer.interact_pos().or(i.pointer.hover_pos()),
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.button_pressed(egui::PointerButton::Secondary)
                    || i.pointer.button_pressed(egui::PointerButton::Middle),
                i.modifiers.shift,
                i.raw_scroll_delta.y,
                i.pointer.button_double_clicked(egui::PointerButton::Primary),
                i.pointer.has_pointer(),
            )
        });
        let local = |p: Pos2| Point::new(p.x - canvas.min.x, p.y - canvas.min.y);
        let hit_at = |store: &GalaxyStore, viewport: &Viewport, p: Point| {
            store.node_at(viewport.screen_to_world(p), 1.0)
        };

        if bg_resp.hovered() && scroll != 0.0 {
            // egui reports wheel-up as positive; the canvas uses browser convention
            self.apply(CanvasEvent::Wheel { delta_y: -scroll });
        }

        let Some(pos) = pos else {
            if !has_pointer && self.interaction.mode() != Mode::Idle {
                self.apply(CanvasEvent::PointerLeave);
            }
            self.last_pointer = None;
            return;
        };
        // Leaving the canvas (onto the top bar, say) ends any gesture
        if pointer_left_canvas(canvas, pos, self.interaction.mode()) {
            self.apply(CanvasEvent::PointerLeave);
        }
        if !canvas.contains(pos) {
            self.last_pointer = None;
            return;
        }
        let p = local(pos);

        if pressed && bg_resp.hovered() {
            let hit = hit_at(&self.store, &self.viewport, p);
            self.apply(CanvasEvent::PointerDown { pos: p, button: PointerButton::Primary, shift, hit });
        } else if other_pressed && bg_resp.hovered() {
            self.apply(CanvasEvent::PointerDown { pos: p, button: PointerButton::Secondary, shift, hit: None });
        }

        if self.last_pointer != Some(pos) && self.interaction.mode() != Mode::Idle {
            self.apply(CanvasEvent::PointerMove { pos: p });
        }
        self.last_pointer = Some(pos);

        if released {
            let hit = hit_at(&self.store, &self.viewport, p);
            self.apply(CanvasEvent::PointerUp { pos: p, hit });
        }
        if double && bg_resp.hovered() {
            let hit = hit_at(&self.store, &self.viewport, p);
            self.apply(CanvasEvent::DoubleClick { pos: p, hit });
        }
    }

    fn feed_keys(&mut self, ctx: &egui::Context) {
        if ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S))) {
            self.save_now_with(NoticeStyle::Prominent);
        }
        if ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Num0))) {
            self.center_view();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.apply(CanvasEvent::Cancel);
        }
        // Bare keys only act when no text field has focus
        if ctx.memory(|m| m.focused().is_some()) {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::L)) {
            self.interaction.toggle_linking();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
            self.delete_selected();
        }
    }

    fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let available = ui.available_rect_before_wrap();
        if self.last_canvas_rect != Some(available) {
            let first = self.last_canvas_rect.is_none();
            self.viewport.set_home(Point::new(available.width() * 0.5, available.height() * 0.5));
            // A fresh session starts centred; a restored one keeps its offset
            if first && self.viewport.x == 0.0 && self.viewport.y == 0.0 {
                self.viewport.reset();
            }
        }
        self.last_canvas_rect = Some(available);
        if self.fit_pending {
            self.fit_pending = false;
            self.fit_view();
        }

        let bg_resp = ui.allocate_rect(available, Sense::click_and_drag());
        self.feed_pointer(ui, available, &bg_resp);
        self.interaction.forget_missing(&self.store);

        match self.interaction.mode() {
            Mode::Panning { .. } | Mode::DraggingNode { .. } => ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing),
            Mode::LinkingFrom { .. } => ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair),
            Mode::Idle if self.interaction.linking_toggle() && bg_resp.hovered() => {
                ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair)
            }
            Mode::Idle => {}
        }

        let painter = ui.painter_at(available);
        let dark = self.env.theme() == Theme::Dark;
        let (bg, ink) = if dark {
            (Color32::from_rgb(10, 10, 10), Color32::from_gray(220))
        } else {
            (Color32::from_rgb(240, 244, 248), INK)
        };
        painter.rect_filled(available, 0.0, bg);

        let vp = self.viewport.clone();
        let origin = available.min;
        let to_screen = move |w: Point| -> Pos2 {
            let s = vp.world_to_screen(w);
            Pos2::new(s.x + origin.x, s.y + origin.y)
        };
        let scale = self.viewport.scale;

        // Dotted background grid, skipped when dots would merge
        let gap = GRID_GAP * scale;
        if gap >= 8.0 {
            let dot = ink.gamma_multiply(0.15);
            let start_x = origin.x + self.viewport.x.rem_euclid(gap);
            let start_y = origin.y + self.viewport.y.rem_euclid(gap);
            let mut y = start_y;
            while y < available.max.y {
                let mut x = start_x;
                while x < available.max.x {
                    painter.circle_filled(Pos2::new(x, y), 1.0, dot);
                    x += gap;
                }
                y += gap;
            }
        }

        let query = self.search_query.to_lowercase();
        let matches = |label: &str| query.is_empty() || label.to_lowercase().contains(&query);

        // Links
        let link_color = ink.gamma_multiply(0.4);
        let link_stroke = Stroke::new(2.0 * scale.clamp(0.5, 1.5), link_color);
        for link in self.store.links.values() {
            let (Some(a), Some(b)) = (self.store.find_node(link.source), self.store.find_node(link.target)) else { continue };
            let [p0, p1, p2, p3] = link_curve(a.position(), b.position());
            match link.style {
                LinkStyle::Solid => {
                    let shape = egui::epaint::CubicBezierShape::from_points_stroke(
                        [to_screen(p0), to_screen(p1), to_screen(p2), to_screen(p3)],
                        false,
                        Color32::TRANSPARENT,
                        link_stroke,
                    );
                    painter.add(shape);
                }
                LinkStyle::Dashed => {
                    painter.extend(egui::Shape::dashed_line(&[to_screen(p0), to_screen(p3)], link_stroke, 8.0, 6.0));
                }
            }
        }

        // In-progress link preview
        if let Some((from, to)) = self.interaction.link_preview(&self.store) {
            let stroke = Stroke::new(2.0, SELECT_RING);
            painter.extend(egui::Shape::dashed_line(&[to_screen(from), to_screen(to)], stroke, 10.0, 6.0));
        }

        // Nodes
        let hover = ui
            .ctx()
            .pointer_hover_pos()
            .filter(|_| bg_resp.hovered())
            .and_then(|p| {
                let local = Point::new(p.x - origin.x, p.y - origin.y);
                self.store.node_at(self.viewport.screen_to_world(local), 1.0)
            });
        let selected = self.interaction.selected();
        let link_source = self.interaction.linking_from();
        for node in self.store.nodes.values() {
            let center = to_screen(node.position());
            let r = node.kind.radius() * scale;
            if !available.expand(r * 2.0).contains(center) {
                continue;
            }
            let alpha = if matches(&node.label) { 1.0 } else { 0.2 };
            let fill = parse_color(&node.color).gamma_multiply(alpha);
            let grow = if hover == Some(node.id) { 1.1 } else { 1.0 };
            painter.circle_filled(center, r * grow, fill);
            painter.circle_stroke(center, r * grow, Stroke::new(2.0, ink.gamma_multiply(alpha)));
            if selected == Some(node.id) || link_source == Some(node.id) {
                painter.circle_stroke(center, r * 1.25 + 4.0, Stroke::new(2.0, SELECT_RING));
            }
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                icon_glyph(&node.icon),
                egui::FontId::proportional((r * 0.9).clamp(6.0, 40.0)),
                INK.gamma_multiply(alpha),
            );
            if scale >= 0.5 || selected == Some(node.id) {
                painter.text(
                    Pos2::new(center.x, center.y + r + 6.0),
                    egui::Align2::CENTER_TOP,
                    &node.label,
                    egui::FontId::proportional((13.0 * scale).clamp(9.0, 22.0)),
                    ink.gamma_multiply(alpha),
                );
            }
        }

        // Help strip
        let hints = format!(
            "{}  ·  {}  ·  {}",
            self.text(UiText::PanHint),
            self.text(UiText::ZoomHint),
            self.text(UiText::LinkHint)
        );
        painter.text(
            Pos2::new(available.min.x + 12.0, available.max.y - 12.0),
            egui::Align2::LEFT_BOTTOM,
            hints,
            egui::FontId::proportional(12.0),
            ink.gamma_multiply(0.6),
        );
    }

    fn search_panel(&mut self, ctx: &egui::Context) {
        let Some(canvas) = self.last_canvas_rect else { return };
        let mut focus: Option<NodeId> = None;
        egui::Area::new(egui::Id::new("galaxy_search"))
            .fixed_pos(canvas.min + Vec2::splat(PANEL_MARGIN))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(260.0);
                    ui.add(egui::TextEdit::singleline(&mut self.search_query).hint_text(self.env.text(UiText::SearchHint)));
                    if !self.search_query.is_empty() {
                        for node in self.store.filter_by_label(&self.search_query).into_iter().take(SEARCH_RESULTS) {
                            let text = format!("{}  {}", icon_glyph(&node.icon), node.label);
                            if ui.selectable_label(false, text).clicked() {
                                focus = Some(node.id);
                            }
                        }
                    }
                });
            });
        if let Some(id) = focus {
            self.focus_node(id);
        }
    }

    fn node_panel(&mut self, ctx: &egui::Context) {
        let Some(canvas) = self.last_canvas_rect else { return };
        let selected = self.interaction.selected();

        // Capture the origin rectangle when the selection changes
        if selected != self.panel_node {
            self.panel_node = selected;
            self.tag_input.clear();
            self.panel_origin = selected.and_then(|id| self.store.find_node(id)).map(|n| {
                let s = self.viewport.world_to_screen(n.position());
                let r = n.kind.radius() * self.viewport.scale * 2.0;
                geometry::Rect::from_center_size(Point::new(s.x + canvas.min.x, s.y + canvas.min.y), r, r)
            });
        }
        let progress = ctx.animate_bool_with_time(egui::Id::new("galaxy_node_panel"), selected.is_some(), 0.3);
        let (Some(id), Some(origin)) = (selected, self.panel_origin) else { return };
        if progress <= 0.0 {
            return;
        }
        let Some(node) = self.store.find_node(id).cloned() else { return };

        let target = geometry::Rect::from_min_size(
            Point::new(canvas.max.x - PANEL_WIDTH - PANEL_MARGIN, canvas.min.y + PANEL_MARGIN),
            PANEL_WIDTH,
            (canvas.height() - PANEL_MARGIN * 2.0).max(120.0),
        );
        let rect = to_egui_rect(reveal(&origin, &target, progress));

        let mut patch = NodePatch::default();
        let mut close = false;
        let mut delete = false;
        let mut delete_link: Option<LinkId> = None;
        let mut tags = node.tags.clone();
        let mut tags_changed = false;
        let links: Vec<(LinkId, String)> = self
            .store
            .links_of(id)
            .into_iter()
            .map(|l| {
                let other = if l.source == id { l.target } else { l.source };
                let label = self.store.find_node(other).map(|n| n.label.clone()).unwrap_or_default();
                (l.id, label)
            })
            .collect();

        egui::Area::new(egui::Id::new("galaxy_node_panel_area"))
            .fixed_pos(rect.min)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .corner_radius(egui::CornerRadius::same(12))
                    .show(ui, |ui| {
                        ui.set_width(rect.width().max(40.0));
                        ui.set_max_height(rect.height());
                        if progress < 1.0 {
                            // Contents appear once the panel has grown into place
                            return;
                        }
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new(icon_glyph(&node.icon)).size(24.0).color(parse_color(&node.color)));
                            let mut label = node.label.clone();
                            if ui.text_edit_singleline(&mut label).changed() {
                                patch.label = Some(label);
                            }
                            if ui.button(self.env.text(UiText::Close)).clicked() {
                                close = true;
                            }
                        });
                        ui.small(format!("X: {}, Y: {}", node.x.round(), node.y.round()));

                        let mut kind = node.kind;
                        egui::ComboBox::from_id_salt("galaxy_node_kind")
                            .selected_text(format!("{:?}", kind))
                            .show_ui(ui, |ui| {
                                ui.selectable_value(&mut kind, NodeKind::Planet, "Planet");
                                ui.selectable_value(&mut kind, NodeKind::Moon, "Moon");
                            });
                        if kind != node.kind {
                            patch.kind = Some(kind);
                        }

                        ui.separator();
                        ui.label(egui::RichText::new(self.env.text(UiText::Context)).small().strong());
                        let mut description = node.description.clone();
                        if ui.add(egui::TextEdit::multiline(&mut description).desired_rows(5)).changed() {
                            patch.description = Some(description);
                        }

                        ui.label(egui::RichText::new(self.env.text(UiText::Tags)).small().strong());
                        ui.horizontal_wrapped(|ui| {
                            for tag in node.tags.iter() {
                                if ui.small_button(format!("{} ✕", tag)).clicked() {
                                    tags.remove(tag);
                                    tags_changed = true;
                                }
                            }
                        });
                        let resp = ui.text_edit_singleline(&mut self.tag_input);
                        if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                            for tag in parse_tags(&self.tag_input) {
                                tags_changed |= tags.insert(tag);
                            }
                            self.tag_input.clear();
                        }

                        ui.separator();
                        match &node.linked_note_id {
                            Some(note) if !note.is_empty() => {
                                ui.small(format!("{}: {}", self.env.text(UiText::OpenNote), note));
                            }
                            _ => {
                                ui.small(self.env.text(UiText::Orphan));
                            }
                        }
                        egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                            for (link_id, other) in &links {
                                ui.horizontal(|ui| {
                                    ui.label(format!("↔ {}", other));
                                    if ui.small_button("✕").clicked() {
                                        delete_link = Some(*link_id);
                                    }
                                });
                            }
                        });

                        ui.separator();
                        if ui.button(self.env.text(UiText::Delete)).clicked() {
                            delete = true;
                        }
                    });
            });

        if tags_changed {
            patch.tags = Some(tags);
        }
        let edited = patch.label.is_some()
            || patch.description.is_some()
            || patch.tags.is_some()
            || patch.kind.is_some();
        if edited && self.store.update_node(id, patch) {
            self.mark_dirty();
        }
        if let Some(link_id) = delete_link
            && self.store.delete_link(link_id)
        {
            self.mark_dirty();
        }
        if delete {
            self.delete_selected();
        } else if close {
            self.interaction.clear_selection();
        }
    }

    fn export_window(&mut self, ctx: &egui::Context) {
        if !self.show_export_window {
            return;
        }
        let mut open = true;
        let mut run = false;
        egui::Window::new("Export Galaxy").open(&mut open).collapsible(false).show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.radio_value(&mut self.export_is_json, true, "JSON");
                ui.radio_value(&mut self.export_is_json, false, "CSV");
            });
            ui.text_edit_singleline(&mut self.export_path);
            if ui.button("Export").clicked() {
                run = true;
            }
            if let Some(msg) = &self.export_status { ui.separator(); ui.small(msg.clone()); }
        });
        if run {
            let path = PathBuf::from(self.export_path.trim());
            let result = if self.export_is_json {
                export::export_galaxy_json(&self.store, &path).map(|_| path.display().to_string())
            } else {
                export::export_galaxy_csv(&self.store, &path)
                    .map(|(n, l)| format!("{} / {}", n.display(), l.display()))
            };
            self.export_status = Some(match result {
                Ok(dest) => format!("Exported to {}", dest),
                Err(e) => {
                    log::warn!("export failed: {:#}", e);
                    format!("Export failed: {}", e)
                }
            });
        }
        if !open { self.show_export_window = false; }
    }

    fn import_window(&mut self, ctx: &egui::Context) {
        if !self.show_import_window {
            return;
        }
        let mut open = true;
        let mut run = false;
        egui::Window::new("Import Notes").open(&mut open).collapsible(false).show(ctx, |ui| {
            ui.label("JSON array of notes (id, title, content, category, tags)");
            ui.text_edit_singleline(&mut self.import_path);
            ui.checkbox(&mut self.import_replace, self.env.text(UiText::ReplaceExisting));
            if ui.button("Import").clicked() {
                run = true;
            }
            if let Some(msg) = &self.import_status { ui.separator(); ui.small(msg.clone()); }
        });
        if run {
            let path = PathBuf::from(self.import_path.trim());
            match export::load_note_seeds(&path) {
                Ok(notes) => {
                    let created = if self.import_replace {
                        self.interaction.clear_selection();
                        self.panel_node = None;
                        self.fit_pending = true;
                        self.store.replace_with_notes(&notes)
                    } else {
                        self.store.add_note_nodes(&notes)
                    };
                    if self.import_replace || !created.is_empty() { self.mark_dirty(); }
                    self.import_status = Some(format!("Created {} node(s) from {} note(s)", created.len(), notes.len()));
                }
                Err(e) => {
                    log::warn!("note import failed: {:#}", e);
                    self.import_status = Some(format!("Import failed: {}", e));
                }
            }
        }
        if !open { self.show_import_window = false; }
    }

    fn versions_window(&mut self, ctx: &egui::Context) {
        if !self.show_load_versions {
            return;
        }
        let mut open = true;
        let mut chosen: Option<PathBuf> = None;
        egui::Window::new("Load Version").open(&mut open).show(ctx, |ui| {
            match persist::list_versions(&self.autosave_dir) {
                Ok(list) if list.is_empty() => { ui.label("No saved versions"); }
                Ok(list) => {
                    egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                        for p in list {
                            let name = p.file_name().and_then(|s| s.to_str()).unwrap_or("?").to_string();
                            if ui.button(name).clicked() {
                                chosen = Some(p.clone());
                            }
                        }
                    });
                }
                Err(e) => { ui.colored_label(Color32::RED, format!("{}", e)); }
            }
        });
        if let Some(path) = chosen {
            match persist::load_from_path(&path) {
                Ok(state) => {
                    self.replace_state(state);
                    self.notify(format!("Loaded {}", path.display()), NoticeStyle::Prominent);
                    open = false;
                }
                Err(e) => {
                    log::warn!("load failed: {:#}", e);
                    self.save_error = Some(format!("Load failed: {}", e));
                }
            }
        }
        self.show_load_versions = open;
    }

    fn prefs_window(&mut self, ctx: &egui::Context) {
        if !self.show_prefs_window {
            return;
        }
        let mut open = true;
        let mut apply = false;
        egui::Window::new("Preferences").open(&mut open).collapsible(false).show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Theme");
                ui.radio_value(&mut self.prefs_edit.theme, Theme::Light, "Light");
                ui.radio_value(&mut self.prefs_edit.theme, Theme::Dark, "Dark");
            });
            ui.horizontal(|ui| {
                ui.label("Language");
                ui.radio_value(&mut self.prefs_edit.language, Language::English, "English");
                ui.radio_value(&mut self.prefs_edit.language, Language::Chinese, "中文");
            });
            ui.add(egui::Slider::new(&mut self.prefs_edit.zoom_sensitivity, 0.0002..=0.005).text("Zoom sensitivity"));
            ui.checkbox(&mut self.prefs_edit.snap_to_grid, "Snap dragged nodes to grid");
            ui.add(egui::Slider::new(&mut self.prefs_edit.grid_size, 5.0..=100.0).text("Grid size"));
            ui.add(egui::Slider::new(&mut self.prefs_edit.autosave_secs, 1..=120).text("Autosave delay (s)"));
            ui.small(format!("Settings file: {}", AppSettings::settings_path().display()));
            if ui.button("Save").clicked() {
                apply = true;
            }
            if let Some(msg) = &self.prefs_status { ui.small(msg.clone()); }
        });
        if apply {
            let settings = self.prefs_edit.clone();
            self.prefs_status = Some(match settings.save() {
                Ok(()) => "Saved".to_string(),
                Err(e) => {
                    log::warn!("settings save failed: {:#}", e);
                    format!("Save failed: {}", e)
                }
            });
            self.apply_settings(ctx, settings);
        }
        if !open { self.show_prefs_window = false; }
    }

    fn zoom_controls(&mut self, ctx: &egui::Context) {
        let Some(canvas) = self.last_canvas_rect else { return };
        let mut action: Option<ZoomControl> = None;
        egui::Area::new(egui::Id::new("galaxy_zoom_controls"))
            .pivot(egui::Align2::LEFT_BOTTOM)
            .fixed_pos(Pos2::new(canvas.min.x + PANEL_MARGIN, canvas.max.y - HELP_STRIP))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.vertical(|ui| {
                        if ui.button("+").on_hover_text(self.env.text(UiText::ZoomIn)).clicked() {
                            action = Some(ZoomControl::In);
                        }
                        if ui.button("−").on_hover_text(self.env.text(UiText::ZoomOut)).clicked() {
                            action = Some(ZoomControl::Out);
                        }
                        if ui.button("⛶").on_hover_text(self.env.text(UiText::FitView)).clicked() {
                            action = Some(ZoomControl::Fit);
                        }
                    });
                });
            });
        let changed = match action {
            None => false,
            Some(ZoomControl::In) => {
                self.viewport.zoom(ZOOM_BUTTON_STEP / self.viewport.sensitivity());
                true
            }
            Some(ZoomControl::Out) => {
                self.viewport.zoom(-ZOOM_BUTTON_STEP / self.viewport.sensitivity());
                true
            }
            Some(ZoomControl::Fit) => self.fit_view(),
        };
        if changed {
            self.mark_dirty();
        }
    }

    /// Overview of all nodes plus the visible area. Clicking recentres the view.
    fn minimap(&mut self, ctx: &egui::Context) {
        let Some(canvas) = self.last_canvas_rect else { return };
        // The detail panel occupies the same corner
        if self.interaction.selected().is_some() {
            return;
        }
        let Some(bounds) = self.store.bounds() else { return };
        let visible = geometry::Rect {
            min: self.viewport.screen_to_world(Point::ZERO),
            max: self.viewport.screen_to_world(Point::new(canvas.width(), canvas.height())),
        };
        let world = bounds.union(&visible).expand(40.0);
        let mut jump: Option<Point> = None;
        egui::Area::new(egui::Id::new("galaxy_minimap"))
            .pivot(egui::Align2::RIGHT_BOTTOM)
            .fixed_pos(Pos2::new(canvas.max.x - PANEL_MARGIN, canvas.max.y - HELP_STRIP))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    let (resp, painter) = ui.allocate_painter(MINIMAP_SIZE, Sense::click());
                    let proj = MiniMapProjection::new(&world, resp.rect);
                    for node in self.store.nodes.values() {
                        let r = (node.kind.radius() * proj.scale).max(2.0);
                        painter.circle_filled(proj.to_map(node.position()), r, parse_color(&node.color));
                    }
                    let view = egui::Rect::from_two_pos(proj.to_map(visible.min), proj.to_map(visible.max));
                    painter.rect_filled(view, 2.0, SELECT_RING.gamma_multiply(0.08));
                    painter.rect_stroke(view, 2.0, Stroke::new(1.5, SELECT_RING), egui::StrokeKind::Inside);
                    if resp.clicked()
                        && let Some(p) = resp.interact_pointer_pos()
                    {
                        jump = Some(proj.to_world(p));
                    }
                });
            });
        if let Some(w) = jump {
            let s = self.viewport.world_to_screen(w);
            self.viewport.pan(canvas.width() * 0.5 - s.x, canvas.height() * 0.5 - s.y);
            self.mark_dirty();
        }
    }

    fn toast(&self, ctx: &egui::Context) {
        let (Some(msg), Some(when)) = (&self.last_save_info, self.last_info_time) else { return };
        if when.elapsed() > Duration::from_secs(3) {
            return;
        }
        egui::Area::new("bottom_right_toast".into())
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -HELP_STRIP))
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| match self.last_info_style {
                    NoticeStyle::Subtle => { ui.small(msg); }
                    NoticeStyle::Prominent => { ui.colored_label(Color32::LIGHT_GREEN, msg); }
                });
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

impl eframe::App for GalaxyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.feed_keys(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Vicoo Galaxy");
                ui.menu_button("File", |ui| {
                    if ui.button("Save").clicked() {
                        self.save_now_with(NoticeStyle::Prominent);
                        ui.close();
                    }
                    if ui.button("Save Version").clicked() {
                        self.save_versioned_now();
                        ui.close();
                    }
                    if ui.button("Load Latest").clicked() {
                        self.load_latest();
                        ui.close();
                    }
                    if ui.button("Load Version…").clicked() {
                        self.show_load_versions = true;
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Import Notes…").clicked() {
                        self.show_import_window = true;
                        ui.close();
                    }
                    if ui.button("Export…").clicked() {
                        if self.export_path.is_empty() {
                            self.export_path = self.default_export_path();
                        }
                        self.show_export_window = true;
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("New Galaxy").clicked() {
                        self.new_galaxy();
                        ui.close();
                    }
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close();
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button(self.env.text(UiText::Center)).clicked() {
                        self.center_view();
                        ui.close();
                    }
                    if ui.button(self.env.text(UiText::FitView)).clicked() {
                        if self.fit_view() {
                            self.mark_dirty();
                        }
                        ui.close();
                    }
                    ui.label("Zoom");
                    if ui
                        .add(egui::Slider::new(&mut self.viewport.scale, MIN_SCALE..=MAX_SCALE).clamping(egui::SliderClamping::Always))
                        .changed()
                    {
                        self.mark_dirty();
                    }
                });
                if ui.button("Preferences…").clicked() {
                    self.prefs_edit = self.env.settings().clone();
                    self.prefs_status = None;
                    self.show_prefs_window = true;
                }
                ui.separator();
                let mut linking = self.interaction.linking_toggle();
                if ui.toggle_value(&mut linking, self.env.text(UiText::LinkMode)).changed() {
                    self.interaction.set_linking_toggle(linking);
                }
                if ui.button(self.env.text(UiText::Center)).clicked() {
                    self.center_view();
                }
                ui.separator();
                ui.small(format!(
                    "N:{} L:{} orphans:{} | {:.0}%",
                    self.store.node_count(),
                    self.store.link_count(),
                    self.store.orphans().len(),
                    self.viewport.scale * 100.0
                ));
                if let Some(err) = &self.save_error { ui.separator(); ui.colored_label(Color32::RED, err); }
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas(ui));

        self.search_panel(ctx);
        self.zoom_controls(ctx);
        self.minimap(ctx);
        self.node_panel(ctx);
        self.export_window(ctx);
        self.import_window(ctx);
        self.versions_window(ctx);
        self.prefs_window(ctx);
        self.toast(ctx);

        // Debounced autosave
        let delay = Duration::from_secs(self.env.settings().autosave_secs);
        if self.dirty && self.last_change.elapsed() >= delay {
            self.save_now_with(NoticeStyle::Subtle);
        } else if self.dirty {
            ctx.request_repaint_after(delay);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.dirty {
            self.save_now_with(NoticeStyle::Subtle);
        }
    }
}

/// Tag names from a comma separated string, trimmed and de-duplicated.
fn parse_tags(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
