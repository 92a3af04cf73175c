/*
 * Debug Information Module
 *
 * Per-frame metrics shown by the viewer:
 * - FPS and frame time
 * - Fixed steps run this frame
 * - The last step report (saturations, coincident pairs)
 * - Flock count and the largest flock
 */

use std::time::Duration;

use crate::physics::StepReport;

#[derive(Debug, Default)]
pub struct DebugInfo {
    pub fps: f32,
    pub frame_time: Duration,
    pub physics_updates_per_frame: usize,
    pub last_report: Option<StepReport>,
    pub group_count: usize,
    pub largest_group: usize,
    pub groups_changed_at: Option<u64>,
}

impl DebugInfo {
    pub fn record_groups(&mut self, groups: &[Vec<usize>]) {
        self.group_count = groups.len();
        self.largest_group = groups.iter().map(Vec::len).max().unwrap_or(0);
    }

    pub fn record_step(&mut self, report: StepReport) {
        if report.groups_changed == Some(true) {
            self.groups_changed_at = Some(report.tick.0);
        }
        self.last_report = Some(report);
    }
}
