/*
 * Renderer Module
 *
 * Draws the flock seen from above: obstacles, waypoints and one triangle per
 * boid pointing along its velocity, tinted by the flock it belongs to.
 *
 * Optimized for performance by:
 * - Skipping boids outside the window (with a margin)
 * - Building the boid-to-flock lookup once per frame
 */

use nannou::prelude::*;
use tracing::error;

use crate::app::Model;
use crate::camera::Camera;
use crate::obstacle::Obstacle;
use crate::ui;

// Boid triangle length in world units, and its on-screen minimum in pixels
const BOID_SIZE: f32 = 0.06;
const MIN_BOID_SIZE_PX: f32 = 3.0;

pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(BLACK);

    let window_rect = app.window_rect();
    let camera = &model.camera;
    let simulation = &model.simulation;

    for obstacle in simulation.obstacles() {
        draw_obstacle(&draw, obstacle, camera, window_rect);
    }

    let current_waypoint = simulation.waypoints().current_index();
    for (i, &waypoint) in simulation.waypoints().positions().iter().enumerate() {
        let screen = camera.world_to_screen(Camera::project(waypoint), window_rect);
        let radius = simulation.waypoints().trigger_radius * camera.zoom;
        let color = if i == current_waypoint { rgba(1.0, 0.8, 0.0, 0.9) } else { rgba(0.5, 0.5, 0.5, 0.6) };
        draw.ellipse().xy(screen).radius(radius).no_fill().stroke(color).stroke_weight(1.5);
    }

    let groups = simulation.groups();
    let mut group_of = vec![None; simulation.len()];
    for (g, group) in groups.iter().enumerate() {
        for &index in group {
            if let Some(slot) = group_of.get_mut(index) {
                *slot = Some(g);
            }
        }
    }
    let selected_group = model.selected_boid.and_then(|i| group_of.get(i).copied().flatten());

    let size = (BOID_SIZE * camera.zoom).max(MIN_BOID_SIZE_PX);
    let points = [pt2(size, 0.0), pt2(-size, size / 2.0), pt2(-size, -size / 2.0)];
    let visible = window_rect.pad(-size * 2.0);

    for (boid, &position) in simulation.boids().iter().zip(simulation.positions()) {
        let screen = camera.world_to_screen(Camera::project(position), window_rect);
        if !visible.contains(screen) {
            continue;
        }

        let velocity = boid.velocity();
        let angle = velocity.z.atan2(velocity.x);
        let color: LinSrgba = match group_of[boid.index()] {
            Some(g) if selected_group.map_or(true, |s| s == g) => group_color(g).into_lin_srgba(),
            Some(_) => rgba(0.35, 0.35, 0.35, 1.0).into_lin_srgba(),
            None => rgba(0.85, 0.85, 0.85, 1.0).into_lin_srgba(),
        };

        draw.polygon().color(color).points(points.iter().cloned()).xy(screen).rotate(angle);
    }

    if model.controls.show_debug {
        if let Some(index) = model.selected_boid {
            draw_selected(&draw, model, index, window_rect);
        }
        ui::draw_debug_info(&draw, &model.debug_info, window_rect, simulation.tick().0);
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        error!(?err, "failed to draw frame");
    }
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        error!(?err, "failed to draw ui");
    }
}

// Golden-ratio hue spacing keeps neighboring flock ids apart
fn group_color(group: usize) -> Hsla {
    let hue = (group as f32 * 0.618_034).fract();
    hsla(hue, 0.7, 0.6, 1.0)
}

fn draw_obstacle(draw: &Draw, obstacle: &Obstacle, camera: &Camera, window_rect: Rect) {
    let stroke = rgba(0.6, 0.3, 0.2, 1.0);
    match *obstacle {
        Obstacle::Sphere { center, radius } => {
            let screen = camera.world_to_screen(Camera::project(center), window_rect);
            draw.ellipse()
                .xy(screen)
                .radius(radius * camera.zoom)
                .no_fill()
                .stroke(stroke)
                .stroke_weight(2.0);
        }
        Obstacle::Box { center, half_extents } => {
            let screen = camera.world_to_screen(Camera::project(center), window_rect);
            let size = Camera::project(half_extents) * 2.0 * camera.zoom;
            draw.rect().xy(screen).wh(size).no_fill().stroke(stroke).stroke_weight(2.0);
        }
    }
}

// Sensing radius, velocity and sensed neighbors of the selected boid
fn draw_selected(draw: &Draw, model: &Model, index: usize, window_rect: Rect) {
    let simulation = &model.simulation;
    let camera = &model.camera;
    let (Ok(boid), Some(&position)) = (simulation.boid(index), simulation.positions().get(index)) else {
        return;
    };
    let screen = camera.world_to_screen(Camera::project(position), window_rect);

    draw.ellipse()
        .xy(screen)
        .radius(boid.settings().sensing_radius() * camera.zoom)
        .no_fill()
        .stroke(GREEN)
        .stroke_weight(1.0);

    for &neighbor in boid.neighbor_indices() {
        if let Some(&other) = simulation.positions().get(neighbor) {
            let other_screen = camera.world_to_screen(Camera::project(other), window_rect);
            draw.line().start(screen).end(other_screen).color(rgba(0.3, 0.8, 0.3, 0.5)).stroke_weight(1.0);
        }
    }

    let velocity = Camera::project(boid.velocity());
    draw.arrow()
        .start(screen)
        .end(screen + velocity * 0.25 * camera.zoom)
        .color(YELLOW)
        .stroke_weight(2.0);
}
