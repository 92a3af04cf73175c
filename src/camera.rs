/*
 * Camera Module
 *
 * This module defines the Camera struct used by the viewer. The flock lives
 * in 3D; the viewer looks straight down the Y axis, so world X maps to
 * screen x and world Z to screen y. Zoom is measured in pixels per world
 * unit.
 */

use nannou::prelude::*;

pub struct Camera {
    pub position: Vec2,
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub is_dragging: bool,
    pub last_cursor_pos: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 120.0,
            min_zoom: 5.0,
            max_zoom: 1500.0,
            is_dragging: false,
            last_cursor_pos: Vec2::ZERO,
        }
    }

    // Top-down projection of a simulation position onto the ground plane
    pub fn project(point: ::glam::Vec3) -> Vec2 {
        vec2(point.x, point.z)
    }

    pub fn world_to_screen(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - self.position) * self.zoom + window_rect.xy()
    }

    pub fn screen_to_world(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - window_rect.xy()) / self.zoom + self.position
    }

    // Zoom around the cursor so the world point under it stays put
    pub fn zoom(&mut self, scroll_delta: Vec2, cursor_position: Vec2, window_rect: Rect) {
        let zoom_factor = 1.0 + scroll_delta.y * 0.1;
        let cursor_world_before = self.screen_to_world(cursor_position, window_rect);
        self.zoom = (self.zoom * zoom_factor).clamp(self.min_zoom, self.max_zoom);
        let cursor_world_after = self.screen_to_world(cursor_position, window_rect);
        self.position += cursor_world_before - cursor_world_after;
    }

    pub fn start_drag(&mut self, position: Vec2) {
        self.last_cursor_pos = position;
        self.is_dragging = true;
    }

    pub fn drag(&mut self, position: Vec2) {
        if !self.is_dragging {
            return;
        }
        let delta = position - self.last_cursor_pos;
        if delta.length_squared() > 0.0 {
            self.position -= delta / self.zoom;
            self.last_cursor_pos = position;
        }
    }

    pub fn end_drag(&mut self) {
        self.is_dragging = false;
    }

    // Center on a point of the ground plane
    pub fn look_at(&mut self, point: Vec2) {
        self.position = point;
    }
}
