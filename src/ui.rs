/*
 * UI Module
 *
 * This module contains the egui control panel of the viewer and the debug
 * overlay drawn on top of the flock. Changes are detected by comparing the
 * controls before and after the frame.
 */

use nannou_egui::{egui, Egui};

use crate::debug::DebugInfo;
use crate::params::SimulationParams;
use crate::settings::Preset;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerControls {
    pub paused: bool,
    pub preset: Preset,
    pub group_interval: f32,
    pub enable_parallel: bool,
    pub show_debug: bool,
}

impl ViewerControls {
    pub fn from_params(params: &SimulationParams) -> Self {
        Self {
            paused: false,
            preset: params.preset,
            group_interval: params.group_interval,
            enable_parallel: params.enable_parallel,
            show_debug: false,
        }
    }
}

// What the app has to apply after this frame's UI pass
#[derive(Debug, Clone, Copy, Default)]
pub struct UiActions {
    pub preset_changed: bool,
    pub group_interval_changed: bool,
    pub parallel_changed: bool,
    pub reset_camera: bool,
    pub regroup_now: bool,
}

pub fn update_ui(
    egui: &mut Egui,
    controls: &mut ViewerControls,
    debug_info: &DebugInfo,
    boid_count: usize,
    camera_zoom: f32,
) -> UiActions {
    let before = *controls;
    let mut actions = UiActions::default();

    let ctx = egui.begin_frame();

    egui::Window::new("Flock Controls")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.collapsing("Preset", |ui| {
                ui.radio_value(&mut controls.preset, Preset::Fish, "Fish");
                ui.radio_value(&mut controls.preset, Preset::Bird, "Bird");
            });

            ui.collapsing("Flock Grouping", |ui| {
                ui.add(
                    egui::Slider::new(&mut controls.group_interval, SimulationParams::get_group_interval_range())
                        .text("Group Interval (s)"),
                );
                if ui.button("Regroup Now").clicked() {
                    actions.regroup_now = true;
                }
                ui.label(format!("Flocks: {}", debug_info.group_count));
                ui.label(format!("Largest flock: {}", debug_info.largest_group));
            });

            ui.collapsing("Camera Controls", |ui| {
                ui.label("Zoom: mouse wheel or trackpad pinch");
                ui.label("Pan: click and drag");
                if ui.button("Reset Camera").clicked() {
                    actions.reset_camera = true;
                }
                ui.label(format!("Zoom Level: {camera_zoom:.0} px/unit"));
            });

            ui.collapsing("Performance", |ui| {
                ui.checkbox(&mut controls.enable_parallel, "Enable Parallel Processing");
                ui.separator();
                ui.label(format!("FPS: {:.1}", debug_info.fps));
                ui.label(format!("Frame time: {:.2} ms", debug_info.frame_time.as_secs_f64() * 1000.0));
                ui.label(format!("Steps this frame: {}", debug_info.physics_updates_per_frame));
                ui.label(format!("Boids: {boid_count}"));
            });

            ui.checkbox(&mut controls.show_debug, "Show Debug Info");
            ui.checkbox(&mut controls.paused, "Pause Simulation");
        });

    actions.preset_changed = controls.preset != before.preset;
    actions.group_interval_changed = controls.group_interval != before.group_interval;
    actions.parallel_changed = controls.enable_parallel != before.enable_parallel;
    actions
}

// Text overlay in the top-left corner
pub fn draw_debug_info(draw: &nannou::Draw, debug_info: &DebugInfo, window_rect: nannou::geom::Rect, tick: u64) {
    let margin = 20.0;
    let line_height = 20.0;

    let mut lines = vec![
        format!("Tick: {tick}"),
        format!("FPS: {:.1}", debug_info.fps),
        format!("Flocks: {}", debug_info.group_count),
    ];
    if let Some(report) = debug_info.last_report {
        lines.push(format!("Saturated: {}", report.saturated));
        lines.push(format!("Coincident: {}", report.coincident));
    }
    if let Some(changed_at) = debug_info.groups_changed_at {
        lines.push(format!("Regrouped at tick {changed_at}"));
    }

    let panel_width = 220.0;
    let panel_height = line_height * lines.len() as f32 + margin;
    draw.rect()
        .x_y(window_rect.left() + panel_width / 2.0, window_rect.top() - panel_height / 2.0)
        .w_h(panel_width, panel_height)
        .color(nannou::color::rgba(0.0, 0.0, 0.0, 0.7));

    let text_x = window_rect.left() + margin;
    let text_y = window_rect.top() - margin;
    for (i, text) in lines.iter().enumerate() {
        draw.text(text)
            .x_y(text_x + 80.0, text_y - i as f32 * line_height)
            .color(nannou::color::WHITE)
            .font_size(14);
    }
}
