/*
 * Input Module
 *
 * Mouse handling for the viewer:
 * - Camera panning with mouse drag
 * - Camera zooming with mouse wheel
 * - Clicking a boid selects it (and highlights its flock)
 */

use nannou::prelude::*;
use nannou::winit::event::{MouseButton, MouseScrollDelta, TouchPhase};

use crate::app::Model;
use crate::camera::Camera;

// Clicks within this many pixels of a boid select it
const SELECTION_RADIUS_PX: f32 = 10.0;

pub fn mouse_moved(_app: &App, model: &mut Model, pos: Point2) {
    let new_pos = Vec2::new(pos.x, pos.y);
    if model.camera.is_dragging {
        model.camera.drag(new_pos);
    }
    model.mouse_position = new_pos;
}

pub fn mouse_pressed(app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left || model.egui.ctx().is_pointer_over_area() {
        return;
    }

    let window_rect = app.window_rect();
    let selection_radius_sq = SELECTION_RADIUS_PX * SELECTION_RADIUS_PX;

    let clicked = model
        .simulation
        .positions()
        .iter()
        .map(|&p| model.camera.world_to_screen(Camera::project(p), window_rect))
        .map(|screen| screen.distance_squared(model.mouse_position))
        .enumerate()
        .filter(|&(_, d)| d <= selection_radius_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index);

    match clicked {
        Some(index) => model.selected_boid = Some(index),
        None => {
            model.selected_boid = None;
            model.camera.start_drag(model.mouse_position);
        }
    }
}

pub fn mouse_released(_app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left {
        model.camera.end_drag();
    }
}

pub fn mouse_wheel(app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    let window_rect = app.window_rect();
    match delta {
        MouseScrollDelta::LineDelta(x, y) => {
            model.camera.zoom(vec2(x, y), model.mouse_position, window_rect);
        }
        MouseScrollDelta::PixelDelta(pos) => {
            model.camera.zoom(vec2(pos.x as f32, pos.y as f32) * 0.01, model.mouse_position, window_rect);
        }
    }
}

pub fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}
