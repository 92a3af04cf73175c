/*
 * Application Module
 *
 * This module defines the viewer's model and its update loop. The viewer
 * owns a Simulation and drives it with the fixed-timestep accumulator:
 * every frame the elapsed wall time is fed to `Simulation::advance`, which
 * runs as many fixed steps as fit. Rendering happens in the renderer module.
 */

use std::sync::Mutex;
use std::time::Instant;

use nannou::prelude::*;
use nannou_egui::Egui;
use tracing::{error, info};

use crate::camera::Camera;
use crate::debug::DebugInfo;
use crate::error::FlockResult;
use crate::input;
use crate::params::SimulationParams;
use crate::physics::Simulation;
use crate::renderer;
use crate::ui::{self, ViewerControls};

// nannou builds the model from a plain fn pointer, so the prepared
// simulation is handed over through here
static PENDING: Mutex<Option<(SimulationParams, Simulation)>> = Mutex::new(None);

pub struct Model {
    pub simulation: Simulation,
    pub params: SimulationParams,
    pub controls: ViewerControls,
    pub egui: Egui,
    pub debug_info: DebugInfo,
    pub camera: Camera,
    pub mouse_position: Vec2,
    pub selected_boid: Option<usize>,
    pub last_update_time: Instant,
}

// Build the simulation up front so config errors surface before a window opens
pub fn run(params: SimulationParams) -> FlockResult<()> {
    let simulation = Simulation::new(&params)?;
    if let Ok(mut slot) = PENDING.lock() {
        *slot = Some((params, simulation));
    }
    nannou::app(model).update(update).run();
    Ok(())
}

fn take_pending() -> Option<(SimulationParams, Simulation)> {
    PENDING.lock().ok().and_then(|mut slot| slot.take())
}

fn model(app: &App) -> Model {
    let monitor = app.primary_monitor().expect("Failed to get primary monitor");
    let monitor_size = monitor.size();
    let window_width = monitor_size.width as f32 * 0.8;
    let window_height = monitor_size.height as f32 * 0.8;

    let window_id = app
        .new_window()
        .title("Flocking")
        .size(window_width as u32, window_height as u32)
        .view(renderer::view)
        .mouse_moved(input::mouse_moved)
        .mouse_pressed(input::mouse_pressed)
        .mouse_released(input::mouse_released)
        .mouse_wheel(input::mouse_wheel)
        .raw_event(input::raw_window_event)
        .build()
        .expect("Failed to build window");
    let window = app.window(window_id).expect("Window vanished right after creation");
    let egui = Egui::from_window(&window);

    let (params, simulation) = take_pending().expect("viewer started without a prepared simulation");

    let mut camera = Camera::new();
    camera.look_at(Camera::project(params.spawn_center));

    info!(boids = simulation.len(), "viewer started");

    Model {
        controls: ViewerControls::from_params(&params),
        simulation,
        params,
        egui,
        debug_info: DebugInfo::default(),
        camera,
        mouse_position: Vec2::ZERO,
        selected_boid: None,
        last_update_time: Instant::now(),
    }
}

fn update(app: &App, model: &mut Model, update: Update) {
    model.debug_info.fps = app.fps();
    model.debug_info.frame_time = update.since_last;

    let actions = ui::update_ui(
        &mut model.egui,
        &mut model.controls,
        &model.debug_info,
        model.simulation.len(),
        model.camera.zoom,
    );

    if actions.preset_changed {
        model.simulation.set_preset_all(model.controls.preset);
    }
    if actions.group_interval_changed {
        model.simulation.set_group_interval(model.controls.group_interval);
    }
    if actions.parallel_changed {
        model.simulation.set_parallel(model.controls.enable_parallel);
    }
    if actions.reset_camera {
        model.camera = Camera::new();
        model.camera.look_at(Camera::project(model.params.spawn_center));
    }
    if actions.regroup_now {
        if let Err(err) = model.simulation.regroup() {
            error!(%err, "regrouping failed");
        }
    }

    let now = Instant::now();
    let frame_time = now.duration_since(model.last_update_time);
    model.last_update_time = now;

    if model.controls.paused {
        model.debug_info.physics_updates_per_frame = 0;
    } else {
        match model.simulation.advance(frame_time) {
            Ok(steps) => {
                model.debug_info.physics_updates_per_frame = steps;
                if let Some(report) = model.simulation.last_report().filter(|_| steps > 0) {
                    model.debug_info.record_step(report);
                }
            }
            Err(err) => {
                error!(%err, "simulation step failed, pausing");
                model.controls.paused = true;
            }
        }
    }

    model.debug_info.record_groups(model.simulation.groups());
}
