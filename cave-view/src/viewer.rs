//! Interactive cave generation viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the configuration and the last
//! generated [`Cave`] and implements [`eframe::App`] to render every stage of
//! a pass (graph, ribbon meshes, hulls, tessellated layers).

use cave_core::{
    Cave, CaveConfig, generate_with_retry,
    tessellate::{HullKind, HullMesh, MaterialSlot},
};
use eframe::App;
use glam::Vec2;
use log::{error, info};

/// Which stages of a pass are drawn.
///
/// ### Fields
/// - `layers` - Tessellated hull layers (rock, interior, islands).
/// - `ribbons` - Triangle outlines of every segment mesh.
/// - `hulls` - Outer and inner hull loops.
/// - `graph` - Graph nodes and edges.
#[derive(Clone, Copy, Debug)]
struct LayerToggles {
    layers: bool,
    ribbons: bool,
    hulls: bool,
    graph: bool,
}

impl Default for LayerToggles {
    fn default() -> Self {
        Self {
            layers: true,
            ribbons: false,
            hulls: true,
            graph: true,
        }
    }
}

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions; config edits only take effect on regenerate.
/// 2. Render the enabled stages of the current cave.
///
/// ### Fields
/// - `cfg` - Configuration used for the next pass.
/// - `cave` - Result of the last successful pass, if any.
/// - `last_error` - Message of the last failed pass.
/// - `retries` - Attempts passed to [`generate_with_retry`].
/// - `auto_regenerate` - Regenerate whenever the config changes.
///
/// - `zoom` - Zoom factor for world-to-screen coordinate mapping.
/// - `pan` - Screen-space pan offset in pixels.
/// - `show` - Stage visibility toggles.
pub struct Viewer {
    cfg: CaveConfig,
    cave: Option<Cave>,
    last_error: Option<String>,
    retries: usize,
    auto_regenerate: bool,

    zoom: f32,
    pan: egui::Vec2,
    show: LayerToggles,
}

impl Viewer {
    /// Creates a viewer and runs the first pass with `cfg`.
    pub fn new(cfg: CaveConfig, retries: usize) -> Self {
        let mut viewer = Self {
            cfg,
            cave: None,
            last_error: None,
            retries,
            auto_regenerate: false,
            zoom: 6.0,
            pan: egui::vec2(0.0, 0.0),
            show: LayerToggles::default(),
        };
        viewer.regenerate();
        viewer
    }

    /// Runs a new pass with the current config.
    ///
    /// On failure the previous cave is dropped and the error is kept for the
    /// status bar.
    fn regenerate(&mut self) {
        match generate_with_retry(self.cfg.clone(), self.retries) {
            Ok(cave) => {
                info!("viewer: seed {} generated", cave.report.seed);
                self.cave = Some(cave);
                self.last_error = None;
            }
            Err(e) => {
                error!("viewer: generation failed: {e}");
                self.cave = None;
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Picks a fresh random seed and regenerates.
    fn reroll(&mut self) {
        self.cfg.seed = rand::random();
        self.regenerate();
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding).
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed))
                .changed()
        })
        .inner
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed))
                .changed()
        })
        .inner
    }

    /// Builds the top panel UI (generation controls, visibility, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("⟳ Regenerate").clicked() {
                    self.regenerate();
                }
                if ui.button("🎲 New seed").clicked() {
                    self.reroll();
                }
                ui.add(egui::DragValue::new(&mut self.cfg.seed).prefix("seed = "));

                ui.separator();
                ui.checkbox(&mut self.show.layers, "Layers");
                ui.checkbox(&mut self.show.ribbons, "Ribbons");
                ui.checkbox(&mut self.show.hulls, "Hulls");
                ui.checkbox(&mut self.show.graph, "Graph");

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=40.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar from the last pass report.
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if let Some(err) = &self.last_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err.as_str());
                    return;
                }
                let Some(cave) = &self.cave else {
                    return;
                };
                let report = &cave.report;
                ui.label(format!("seed = {}", report.seed));
                ui.separator();
                ui.label(format!("nodes = {}", report.nodes));
                ui.label(format!("segments = {}", report.segments));
                ui.label(format!("hulls = {}", report.hulls));
                ui.label(format!("discarded = {}", report.discarded_inner));
                if report.graph.crowded_angles > 0 {
                    ui.label(format!("crowded = {}", report.graph.crowded_angles));
                }
                if report.graph.hit_iteration_limit {
                    ui.colored_label(egui::Color32::YELLOW, "graph limit hit");
                }
                if report.hit_inner_limit {
                    ui.colored_label(egui::Color32::YELLOW, "inner hull limit hit");
                }
            });
        });
    }

    /// Builds the right-hand configuration panel.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Config");
                let mut changed = false;

                ui.separator();
                ui.label("Graph");
                changed |= Self::labeled_drag_f32(
                    ui,
                    "max_branch_angle:",
                    &mut self.cfg.max_branch_angle,
                    0.0..=180.0,
                    0.5,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "min_angle_difference:",
                    &mut self.cfg.minimum_angle_difference,
                    0.0..=90.0,
                    0.5,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "min_node_distance:",
                    &mut self.cfg.min_node_distance,
                    0.1..=100.0,
                    0.1,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "max_node_distance:",
                    &mut self.cfg.max_node_distance,
                    0.1..=100.0,
                    0.1,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "max_graph_length:",
                    &mut self.cfg.max_graph_length,
                    1.0..=1000.0,
                    1.0,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "branch_variance:",
                    &mut self.cfg.branch_variance,
                    0.0..=5.0,
                    0.05,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "force_branch_distance:",
                    &mut self.cfg.force_branch_distance,
                    0.0..=1.0,
                    0.01,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "node_merge_threshold:",
                    &mut self.cfg.node_merge_threshold,
                    0.0..=10.0,
                    0.05,
                );

                ui.separator();
                ui.label("Meshes");
                changed |= Self::labeled_drag_f32(
                    ui,
                    "cave_width:",
                    &mut self.cfg.cave_width,
                    0.1..=20.0,
                    0.05,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "segment_overlap:",
                    &mut self.cfg.segment_overlap,
                    0.0..=10.0,
                    0.05,
                );
                changed |= Self::labeled_drag_usize(
                    ui,
                    "vertices_per_segment:",
                    &mut self.cfg.vertices_per_segment,
                    2..=64,
                    1.0,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "uv_tiling:",
                    &mut self.cfg.uv_tiling,
                    0.1..=100.0,
                    0.1,
                );

                ui.separator();
                ui.label("Limits");
                changed |= Self::labeled_drag_usize(
                    ui,
                    "iteration_limit:",
                    &mut self.cfg.iteration_limit,
                    1..=100_000,
                    10.0,
                );
                changed |= Self::labeled_drag_usize(
                    ui,
                    "graph_iteration_limit:",
                    &mut self.cfg.graph_iteration_limit,
                    1..=100_000,
                    10.0,
                );
                Self::labeled_drag_usize(ui, "retries:", &mut self.retries, 1..=50, 1.0);

                ui.separator();
                ui.checkbox(&mut self.auto_regenerate, "Regenerate on change");
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = CaveConfig::default();
                    changed = true;
                }

                if changed && self.auto_regenerate {
                    self.regenerate();
                }
            });
    }

    /// Converts a tessellated layer into a flat-colored egui mesh.
    fn layer_mesh(&self, layer: &HullMesh, rect: egui::Rect) -> egui::Mesh {
        let color = match (layer.material, layer.kind) {
            (MaterialSlot::Background, _) => egui::Color32::from_rgb(40, 36, 48),
            (MaterialSlot::Foreground, HullKind::Inner) => egui::Color32::from_rgb(110, 96, 84),
            (MaterialSlot::Foreground, _) => egui::Color32::from_rgb(90, 78, 66),
        };

        let mut mesh = egui::Mesh::default();
        for &v in &layer.mesh.vertices {
            mesh.colored_vertex(self.world_to_screen(v, rect), color);
        }
        for tri in layer.mesh.indices.chunks_exact(3) {
            mesh.add_triangle(tri[0], tri[1], tri[2]);
        }
        mesh
    }

    /// Draws the enabled stages of `cave`, back to front.
    fn draw_cave(&self, cave: &Cave, painter: &egui::Painter, rect: egui::Rect) {
        if self.show.layers {
            // Deeper layers first.
            let mut layers: Vec<&HullMesh> = cave.meshes.iter().collect();
            layers.sort_by(|a, b| b.depth.total_cmp(&a.depth));
            for layer in layers {
                painter.add(egui::Shape::mesh(self.layer_mesh(layer, rect)));
            }
        }

        if self.show.ribbons {
            let stroke = egui::Stroke::new(0.5, egui::Color32::from_gray(140));
            for (_, record) in cave.arena.iter() {
                for tri in record.mesh.triangles() {
                    let points = tri.iter().map(|&p| self.world_to_screen(p, rect)).collect();
                    painter.add(egui::Shape::closed_line(points, stroke));
                }
            }
        }

        if self.show.hulls {
            let outer: Vec<egui::Pos2> = cave
                .hulls
                .outer
                .points()
                .map(|p| self.world_to_screen(p, rect))
                .collect();
            painter.add(egui::Shape::closed_line(
                outer,
                egui::Stroke::new(1.5, egui::Color32::YELLOW),
            ));
            for hull in &cave.hulls.inner {
                let points = hull.points().map(|p| self.world_to_screen(p, rect)).collect();
                painter.add(egui::Shape::closed_line(
                    points,
                    egui::Stroke::new(1.5, egui::Color32::ORANGE),
                ));
            }
        }

        if self.show.graph {
            let stroke = egui::Stroke::new(1.0, egui::Color32::LIGHT_GREEN);
            for (a, b) in cave.graph.edges() {
                let a = self.world_to_screen(cave.graph.pos(a), rect);
                let b = self.world_to_screen(cave.graph.pos(b), rect);
                painter.line_segment([a, b], stroke);
            }
            for (i, node) in cave.graph.nodes.iter().enumerate() {
                let color = if i == 0 {
                    egui::Color32::RED
                } else {
                    egui::Color32::LIGHT_BLUE
                };
                painter.circle_filled(self.world_to_screen(node.pos, rect), 2.0, color);
            }
        }
    }

    /// Builds the central panel where the cave is drawn; drag pans, scroll
    /// zooms around the cursor.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            if response.dragged() {
                self.pan += response.drag_delta();
            }

            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.1, 40.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            if let Some(cave) = &self.cave {
                self.draw_cave(cave, &painter, rect);
            }

            if let Some(p) = response.hover_pos() {
                let world = self.screen_to_world(p, rect);
                painter.text(
                    rect.left_bottom() + egui::vec2(8.0, -8.0),
                    egui::Align2::LEFT_BOTTOM,
                    format!("({:.1}, {:.1})", world.x, world.y),
                    egui::FontId::monospace(12.0),
                    egui::Color32::GRAY,
                );
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
