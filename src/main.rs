//! FSD Edit GUI - Finite State Diagram Editor
//! Interactive canvas for drawing states and transitions

use std::path::PathBuf;

use eframe::egui;
use log::{info, warn};

use fsdedit::editor::PointerEvent;
use fsdedit::geometry::{self, DISK_SIZE};
use fsdedit::layout::{PreviewLayout, NODE_DIAMETER};
use fsdedit::{
    dot, layered, load_config, persist, AppConfig, Diagram, DiagramResult, Editor, Item, LayoutDirection,
    Mode, Notification, StateKey, TransitionKey,
};

const TITLE: &str = "FSD Editor";

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(25, 28, 32);
const STATE_FILL: egui::Color32 = egui::Color32::from_rgb(40, 55, 75);
const STATE_STROKE: egui::Color32 = egui::Color32::from_rgb(100, 120, 145);
const INITIAL_STROKE: egui::Color32 = egui::Color32::from_rgb(100, 220, 100);
const EDGE_COLOR: egui::Color32 = egui::Color32::from_rgb(160, 175, 195);
const LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 230, 120);
const SELECTED_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 160, 60);

fn fsdedit_icon() -> egui::IconData {
    // 64x64: dark background, one state box and a filled initial disk above it
    let (w, h) = (64u32, 64u32);
    let mut rgba = vec![0u8; (w * h * 4) as usize];
    for y in 0..h {
        for x in 0..w {
            let (fx, fy) = (x as f32, y as f32);
            let in_box = (12.0..=52.0).contains(&fx) && (28.0..=54.0).contains(&fy);
            let on_border = in_box
                && (fx < 15.0 || fx > 49.0 || fy < 31.0 || fy > 51.0);
            let disk = ((fx - 32.0).powi(2) + (fy - 12.0).powi(2)).sqrt() <= 6.0;
            let stem = (31.0..=33.0).contains(&fx) && (12.0..28.0).contains(&fy);

            let (r, g, b) = if on_border || disk || stem {
                (235, 240, 245)
            } else if in_box {
                (40, 55, 75)
            } else {
                (20, 24, 28)
            };
            let i = ((y * w + x) * 4) as usize;
            rgba[i..i + 4].copy_from_slice(&[r, g, b, 255]);
        }
    }
    egui::IconData {
        rgba,
        width: w,
        height: h,
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let config = load_config(None::<PathBuf>).unwrap_or_else(|e| {
        warn!("{}; using the default configuration", e);
        AppConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(TITLE)
            .with_icon(fsdedit_icon()),
        ..Default::default()
    };

    eframe::run_native(
        "fsdedit",
        options,
        Box::new(|cc| Ok(Box::new(FsdEditApp::new(cc, config)))),
    )
}

/// File action waiting for the unsaved-changes prompt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PendingAction {
    New,
    Open,
    Quit,
}

/// Scene <-> screen mapping of the canvas
#[derive(Clone, Copy, Debug)]
struct View {
    origin: egui::Pos2,
    zoom: f32,
}

impl View {
    fn to_screen(self, p: egui::Pos2) -> egui::Pos2 {
        self.origin + p.to_vec2() * self.zoom
    }

    fn to_scene(self, p: egui::Pos2) -> egui::Pos2 {
        egui::Pos2::ZERO + (p - self.origin) / self.zoom
    }
}

struct FsdEditApp {
    /// The diagram being edited
    diagram: Diagram,
    /// Mode and in-progress gesture
    editor: Editor,
    /// Loaded configuration (preview layout parameters)
    config: AppConfig,
    /// File the diagram was loaded from / last saved to
    current_file: Option<PathBuf>,
    /// Unsaved modifications
    modified: bool,
    /// Last warning or error shown in the status bar
    status: Option<String>,
    /// Action waiting for the "save changes?" prompt
    pending: Option<PendingAction>,
    /// Set once the user agreed to close the window
    allow_close: bool,
    /// Window title currently applied
    title: String,
    /// Pan offset
    pan_offset: egui::Vec2,
    /// Zoom level
    zoom: f32,
    /// A primary press started on the canvas and has not been released yet
    pointer_down: bool,
    /// Show the layout preview window
    show_preview: bool,
    /// Selection the property buffers were filled from
    properties_for: Option<Item>,
    /// Text field for the selected state's id
    id_buffer: String,
    /// Text field for the selected transition's label
    label_buffer: String,
}

impl FsdEditApp {
    fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        Self {
            diagram: Diagram::new(),
            editor: Editor::new(),
            config,
            current_file: None,
            modified: false,
            status: None,
            pending: None,
            allow_close: false,
            title: TITLE.to_string(),
            pan_offset: egui::vec2(40.0, 40.0),
            zoom: 1.0,
            pointer_down: false,
            show_preview: false,
            properties_for: None,
            id_buffer: String::new(),
            label_buffer: String::new(),
        }
    }

    fn apply_notifications(&mut self, notifications: Vec<Notification>) {
        for notification in notifications {
            match notification {
                Notification::Modified => self.modified = true,
                Notification::Selected(item) => self.status = Some(self.describe(item)),
                Notification::Warning(e) => self.status = Some(format!("⚠ {}", e)),
            }
        }
    }

    /// Outcome of a properties-panel edit
    fn report(&mut self, result: DiagramResult<()>) {
        match result {
            Ok(()) => {
                self.modified = true;
                self.status = None;
            }
            Err(e) => {
                warn!("{}", e);
                self.status = Some(format!("⚠ {}", e));
            }
        }
        self.properties_for = None;
    }

    fn state_name(&self, key: StateKey) -> String {
        self.diagram
            .state(key)
            .map(|s| s.id().to_string())
            .unwrap_or_else(|| key.to_string())
    }

    fn describe(&self, item: Item) -> String {
        match item {
            Item::State(key) => format!("Selected state {}", self.state_name(key)),
            Item::Transition(key) => match self.diagram.transition(key) {
                Some(t) => format!(
                    "Selected transition {} -> {}",
                    self.state_name(t.source()),
                    self.state_name(t.destination())
                ),
                None => key.to_string(),
            },
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        let notifications = self.editor.set_mode(mode, &mut self.diagram);
        self.apply_notifications(notifications);
    }

    /// Replace the whole diagram (new or loaded file)
    fn replace_diagram(&mut self, diagram: Diagram, file: Option<PathBuf>) {
        self.editor.cancel_gesture(&mut self.diagram);
        self.diagram = diagram;
        self.editor.clear_selection();
        self.properties_for = None;
        self.current_file = file;
        self.modified = false;
        self.status = None;
    }

    // ------------------------------------------------------------------
    // File actions
    // ------------------------------------------------------------------

    fn request(&mut self, action: PendingAction, ctx: &egui::Context) {
        if self.modified {
            self.pending = Some(action);
        } else {
            self.perform(action, ctx);
        }
    }

    fn perform(&mut self, action: PendingAction, ctx: &egui::Context) {
        match action {
            PendingAction::New => {
                info!("New diagram");
                self.replace_diagram(Diagram::new(), None);
            }
            PendingAction::Open => self.open(),
            PendingAction::Quit => {
                self.allow_close = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn open(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("FSD", &["fsd", "json"])
            .pick_file()
        else {
            return;
        };
        match persist::load_file(&path) {
            Ok(diagram) => self.replace_diagram(diagram, Some(path)),
            Err(e) => {
                warn!("Cannot open {}: {}", path.display(), e);
                self.status = Some(format!("⚠ Cannot open {}: {}", path.display(), e));
            }
        }
    }

    /// Save to the current file, asking for a name if there is none. Returns true on success.
    fn save(&mut self) -> bool {
        match self.current_file.clone() {
            Some(path) => self.save_to(path),
            None => self.save_as(),
        }
    }

    fn save_as(&mut self) -> bool {
        match rfd::FileDialog::new().add_filter("FSD", &["fsd"]).save_file() {
            Some(path) => self.save_to(path),
            None => false,
        }
    }

    fn save_to(&mut self, path: PathBuf) -> bool {
        match persist::save_file(&self.diagram, &path) {
            Ok(()) => {
                self.current_file = Some(path);
                self.modified = false;
                true
            }
            Err(e) => {
                self.status = Some(format!("⚠ Cannot save {}: {}", path.display(), e));
                false
            }
        }
    }

    fn export_dot(&mut self) {
        if let Some(path) = rfd::FileDialog::new().add_filter("DOT", &["dot"]).save_file() {
            match dot::export_file(&self.diagram, &path) {
                Ok(()) => self.status = Some(format!("Exported {}", path.display())),
                Err(e) => self.status = Some(format!("⚠ Cannot export {}: {}", path.display(), e)),
            }
        }
    }

    fn update_title(&mut self, ctx: &egui::Context) {
        let mut title = match &self.current_file {
            Some(path) => format!("{} - {}", TITLE, path.display()),
            None => TITLE.to_string(),
        };
        if self.modified {
            title.push_str(" (Unsaved changes)");
        }
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }
    }

    fn unsaved_changes_dialog(&mut self, ctx: &egui::Context) {
        let Some(action) = self.pending else {
            return;
        };
        egui::Window::new("Unsaved changes")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("Do you want to save your changes?");
                ui.horizontal(|ui| {
                    if ui.button("💾 Save").clicked() {
                        self.pending = None;
                        if self.save() {
                            self.perform(action, ctx);
                        }
                    }
                    if ui.button("Discard").clicked() {
                        self.pending = None;
                        self.perform(action, ctx);
                    }
                    if ui.button("Cancel").clicked() {
                        self.pending = None;
                    }
                });
            });
    }

    // ------------------------------------------------------------------
    // Properties panel
    // ------------------------------------------------------------------

    fn refresh_property_buffers(&mut self) {
        self.id_buffer.clear();
        self.label_buffer.clear();
        match self.editor.selection() {
            Some(Item::State(key)) => {
                if let Some(state) = self.diagram.state(key) {
                    self.id_buffer = state.id().to_string();
                }
            }
            Some(Item::Transition(key)) => {
                if let Some(t) = self.diagram.transition(key) {
                    self.label_buffer = t.label().to_string();
                }
            }
            None => {}
        }
    }

    fn properties_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Properties");
        ui.separator();

        let selection = self.editor.selection();
        if selection != self.properties_for {
            self.properties_for = selection;
            self.refresh_property_buffers();
        }

        match selection {
            Some(Item::State(key)) => self.state_properties(ui, key),
            Some(Item::Transition(key)) => self.transition_properties(ui, key),
            None => {
                ui.label("Nothing selected.");
                ui.label("Pick a state or a transition in Select mode.");
            }
        }
    }

    fn state_properties(&mut self, ui: &mut egui::Ui, key: StateKey) {
        let Some(state) = self.diagram.state(key) else {
            return;
        };
        if state.is_pseudo() {
            ui.label("Initial pseudo-state");
            return;
        }
        let current_id = state.id().to_string();
        let position = state.position();
        let incident = state.transitions().len();

        let mut commit = false;
        ui.horizontal(|ui| {
            ui.label("Id:");
            let response = ui.text_edit_singleline(&mut self.id_buffer);
            commit = response.lost_focus() && self.id_buffer.trim() != current_id;
        });
        if commit {
            let id = self.id_buffer.trim().to_string();
            if id.is_empty() {
                self.status = Some("⚠ State id cannot be empty".to_string());
                self.properties_for = None;
            } else {
                let result = self.diagram.rename_state(key, &id);
                self.report(result);
            }
        }

        ui.label(format!("Position: ({:.0}, {:.0})", position.x, position.y));
        ui.label(format!("Transitions: {}", incident));
        if self.diagram.initial_state() == Some(key) {
            ui.colored_label(INITIAL_STROKE, "Initial state");
        }
    }

    fn transition_properties(&mut self, ui: &mut egui::Ui, key: TransitionKey) {
        let Some(t) = self.diagram.transition(key) else {
            return;
        };
        let (source, destination, location) = (t.source(), t.destination(), t.location());
        let current_label = t.label().to_string();
        let is_initial = self.diagram.is_initial(key);
        let candidates: Vec<(StateKey, String)> = self
            .diagram
            .states()
            .filter(|(_, s)| !s.is_pseudo())
            .map(|(k, s)| (k, s.id().to_string()))
            .collect();

        let mut new_source = source;
        let mut new_destination = destination;
        egui::Grid::new("transition_properties").num_columns(2).show(ui, |ui| {
            ui.label("Source:");
            if is_initial {
                ui.label("initial pseudo-state");
            } else {
                egui::ComboBox::from_id_salt("transition_source")
                    .selected_text(self.state_name(source))
                    .show_ui(ui, |ui| {
                        for (k, id) in &candidates {
                            ui.selectable_value(&mut new_source, *k, id);
                        }
                    });
            }
            ui.end_row();

            ui.label("Destination:");
            egui::ComboBox::from_id_salt("transition_destination")
                .selected_text(self.state_name(destination))
                .show_ui(ui, |ui| {
                    for (k, id) in &candidates {
                        ui.selectable_value(&mut new_destination, *k, id);
                    }
                });
            ui.end_row();

            if source == destination {
                ui.label("Location:");
                ui.label(format!("{:?}", location));
                ui.end_row();
            }
        });

        if new_source != source {
            let result = self.diagram.rewire_source(key, new_source);
            self.report(result);
        }
        if new_destination != destination {
            let result = self.diagram.rewire_destination(key, new_destination);
            self.report(result);
        }

        ui.horizontal(|ui| {
            ui.label("Label:");
            let response = ui.text_edit_singleline(&mut self.label_buffer);
            if response.lost_focus() && self.label_buffer != current_label {
                let result = self.diagram.set_label(key, self.label_buffer.clone());
                self.report(result);
            }
        });
        ui.small("guard/action labels are split in the DOT export");
    }

    // ------------------------------------------------------------------
    // Canvas
    // ------------------------------------------------------------------

    fn forward_pointer(&mut self, ui: &egui::Ui, response: &egui::Response, view: View) {
        let (pressed, released, moved, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.delta() != egui::Vec2::ZERO,
                i.pointer.interact_pos(),
            )
        });
        let Some(pos) = pos else {
            return;
        };
        let scene = view.to_scene(pos);

        let event = if pressed && response.hovered() {
            self.pointer_down = true;
            Some(PointerEvent::Down(scene))
        } else if self.pointer_down && released {
            self.pointer_down = false;
            Some(PointerEvent::Up(scene))
        } else if self.pointer_down && moved {
            Some(PointerEvent::Move(scene))
        } else {
            None
        };

        if let Some(event) = event {
            let notifications = self.editor.handle(&mut self.diagram, event);
            self.apply_notifications(notifications);
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());

        // Handle panning (right button, so the primary button stays with the editor)
        if response.dragged_by(egui::PointerButton::Secondary) {
            self.pan_offset += response.drag_delta();
        }

        // Handle zoom with scroll
        let scroll_delta = ctx.input(|i| i.raw_scroll_delta);
        if response.hovered() && scroll_delta.y != 0.0 {
            self.zoom = (self.zoom + scroll_delta.y * 0.001).clamp(0.3, 3.0);
        }

        let rect = response.rect;
        let view = View {
            origin: rect.min + self.pan_offset,
            zoom: self.zoom,
        };
        self.forward_pointer(ui, &response, view);

        painter.rect_filled(rect, 0.0, BACKGROUND);
        draw_grid(&painter, rect, self.zoom, self.pan_offset);

        let selection = self.editor.selection();
        let zoom = self.zoom;

        for (key, transition) in self.diagram.transitions() {
            let Some(route) = self.diagram.route(key) else {
                continue;
            };
            let color = if selection == Some(Item::Transition(key)) {
                SELECTED_COLOR
            } else {
                EDGE_COLOR
            };
            let points: Vec<egui::Pos2> = route.points.iter().map(|p| view.to_screen(*p)).collect();
            painter.add(egui::Shape::line(points, egui::Stroke::new(1.5 * zoom, color)));
            painter.add(egui::Shape::convex_polygon(
                route.arrow_head.iter().map(|p| view.to_screen(*p)).collect(),
                color,
                egui::Stroke::NONE,
            ));
            if !transition.label().is_empty() {
                painter.text(
                    view.to_screen(route.label_anchor),
                    egui::Align2::CENTER_BOTTOM,
                    transition.label(),
                    egui::FontId::proportional(13.0 * zoom),
                    LABEL_COLOR,
                );
            }
        }

        let initial = self.diagram.initial_state();
        for (key, state) in self.diagram.states() {
            let selected = selection == Some(Item::State(key));
            let center = view.to_screen(state.position());
            if state.is_pseudo() {
                let color = if selected { SELECTED_COLOR } else { egui::Color32::WHITE };
                painter.circle_filled(center, DISK_SIZE.x / 2.0 * zoom, color);
                continue;
            }

            let rect = egui::Rect::from_center_size(center, state.rect().size() * zoom);
            let stroke_color = if selected {
                SELECTED_COLOR
            } else if initial == Some(key) {
                INITIAL_STROKE
            } else {
                STATE_STROKE
            };
            painter.rect_filled(rect, 6.0 * zoom, STATE_FILL);
            painter.rect_stroke(rect, 6.0 * zoom, egui::Stroke::new(2.0 * zoom, stroke_color));
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                state.id(),
                egui::FontId::proportional(15.0 * zoom),
                egui::Color32::WHITE,
            );
        }

        if let Some((start, end)) = self.editor.rubber_band() {
            painter.extend(egui::Shape::dashed_line(
                &[view.to_screen(start), view.to_screen(end)],
                egui::Stroke::new(1.5, SELECTED_COLOR),
                6.0,
                4.0,
            ));
        }

        if self.diagram.is_empty() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Empty diagram.\nPick \"State\" in the toolbar and click on the canvas.",
                egui::FontId::proportional(18.0),
                egui::Color32::GRAY,
            );
        }
    }

    // ------------------------------------------------------------------
    // Preview
    // ------------------------------------------------------------------

    fn preview_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_preview;
        egui::Window::new("Preview")
            .open(&mut open)
            .default_size([520.0, 480.0])
            .show(ctx, |ui| {
                let layout_config = &mut self.config.layout;
                ui.horizontal(|ui| {
                    ui.label("Layout:");
                    egui::ComboBox::from_id_salt("layout_direction")
                        .selected_text(match layout_config.direction {
                            LayoutDirection::TB => "TB",
                            LayoutDirection::LR => "LR",
                        })
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut layout_config.direction, LayoutDirection::TB, "TB");
                            ui.selectable_value(&mut layout_config.direction, LayoutDirection::LR, "LR");
                        });
                    ui.add(egui::DragValue::new(&mut layout_config.nodesep).speed(1.0).range(0.0..=400.0).prefix("nodesep "));
                    ui.add(egui::DragValue::new(&mut layout_config.ranksep).speed(1.0).range(0.0..=400.0).prefix("ranksep "));
                });
                ui.separator();

                let layout = layered(&self.diagram, &self.config.layout);
                egui::ScrollArea::both().auto_shrink([false; 2]).show(ui, |ui| {
                    let (response, painter) = ui.allocate_painter(layout.size, egui::Sense::hover());
                    painter.rect_filled(response.rect, 0.0, BACKGROUND);
                    draw_preview(&painter, &layout, response.rect.min.to_vec2());
                });
            });
        self.show_preview = open;
    }
}

impl eframe::App for FsdEditApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) && self.modified && !self.allow_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.pending = Some(PendingAction::Quit);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            let notifications = self.editor.cancel_gesture(&mut self.diagram);
            self.pointer_down = false;
            self.apply_notifications(notifications);
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        self.request(PendingAction::New, ctx);
                        ui.close_menu();
                    }
                    if ui.button("📂 Open...").clicked() {
                        self.request(PendingAction::Open, ctx);
                        ui.close_menu();
                    }
                    if ui.button("💾 Save").clicked() {
                        self.save();
                        ui.close_menu();
                    }
                    if ui.button("Save As...").clicked() {
                        self.save_as();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("📤 Export to DOT...").clicked() {
                        self.export_dot();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        self.request(PendingAction::Quit, ctx);
                        ui.close_menu();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.checkbox(&mut self.show_preview, "Layout preview").clicked() {
                        ui.close_menu();
                    }
                    if ui.button("Reset view").clicked() {
                        self.zoom = 1.0;
                        self.pan_offset = egui::vec2(40.0, 40.0);
                        ui.close_menu();
                    }
                });
            });
        });

        // Mode toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for mode in Mode::ALL {
                    if ui
                        .selectable_label(self.editor.mode() == mode, mode.label())
                        .clicked()
                        && self.editor.mode() != mode
                    {
                        self.set_mode(mode);
                    }
                }
            });
        });

        // Bottom panel: status
        egui::TopBottomPanel::bottom("info_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("{} v{}", TITLE, env!("CARGO_PKG_VERSION")));
                ui.separator();
                ui.label(format!(
                    "States: {} | Transitions: {}",
                    self.diagram.state_count(),
                    self.diagram.transition_count()
                ));
                ui.separator();
                ui.label("Right-drag to pan | Scroll to zoom | Esc cancels");
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        egui::SidePanel::right("properties_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.properties_panel(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.canvas(ui, ctx));

        if self.show_preview {
            self.preview_window(ctx);
        }
        self.unsaved_changes_dialog(ctx);
        self.update_title(ctx);
    }
}

fn draw_grid(painter: &egui::Painter, rect: egui::Rect, zoom: f32, offset: egui::Vec2) {
    let grid_size = 50.0 * zoom;
    let grid_color = egui::Color32::from_rgba_unmultiplied(100, 100, 100, 30);
    let stroke = egui::Stroke::new(1.0, grid_color);
    let origin = rect.min + offset;

    let mut x = origin.x - ((origin.x - rect.left()) / grid_size).floor() * grid_size;
    while x < rect.right() {
        painter.line_segment([egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())], stroke);
        x += grid_size;
    }
    let mut y = origin.y - ((origin.y - rect.top()) / grid_size).floor() * grid_size;
    while y < rect.bottom() {
        painter.line_segment([egui::pos2(rect.left(), y), egui::pos2(rect.right(), y)], stroke);
        y += grid_size;
    }
}

/// Draw the read-only preview layout, shifted by `offset`
fn draw_preview(painter: &egui::Painter, layout: &PreviewLayout, offset: egui::Vec2) {
    let stroke = egui::Stroke::new(1.5, EDGE_COLOR);

    for edge in &layout.edges {
        let (start, end) = (edge.start + offset, edge.end + offset);
        if edge.is_self_loop {
            painter.circle_stroke(start, NODE_DIAMETER * 0.3, stroke);
        } else {
            painter.line_segment([start, end], stroke);
            if let Some(angle) = geometry::line_angle(end, start) {
                painter.add(egui::Shape::convex_polygon(
                    geometry::arrow_head(end, angle).to_vec(),
                    EDGE_COLOR,
                    egui::Stroke::NONE,
                ));
            }
        }
        if !edge.label.is_empty() {
            painter.text(
                edge.label_anchor + offset,
                egui::Align2::CENTER_CENTER,
                &edge.label,
                egui::FontId::monospace(11.0),
                LABEL_COLOR,
            );
        }
    }

    for node in &layout.nodes {
        let center = node.rect.center() + offset;
        if node.is_pseudo {
            painter.circle_filled(center, node.rect.width() / 2.0, egui::Color32::WHITE);
            continue;
        }
        painter.circle_filled(center, node.rect.width() / 2.0, STATE_FILL);
        painter.circle_stroke(center, node.rect.width() / 2.0, egui::Stroke::new(1.5, STATE_STROKE));
        painter.text(
            center,
            egui::Align2::CENTER_CENTER,
            &node.id,
            egui::FontId::proportional(13.0),
            egui::Color32::WHITE,
        );
    }
}
