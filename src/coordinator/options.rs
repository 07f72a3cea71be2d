use std::time::Duration;

use egui::Vec2;

/// What [`super::DragCoordinator::start_session`] does while another session is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StartPolicy {
    /// Keep the active session; the new start is logged and returned as an error.
    #[default]
    Reject,

    /// Cancel the active session (no occupancy change) and start the new one in the same call.
    Replace,
}

/// Options for [`super::DragCoordinator`] and the widgets that drive it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoordinatorOptions {
    /// How far (in points) outside a target's rect the pointer still counts as over it.
    pub margin: f32,

    /// Margin for central targets, which are statistically harder to land on.
    pub central_margin: f32,

    /// Multiplier on horizontal clearance before combining with vertical clearance.
    ///
    /// Values above 1 favor left-right alignment over vertical precision.
    pub horizontal_weight: f32,

    /// Score multiplier (< 1) for central targets so near-ties resolve toward the middle.
    pub central_preference: f32,

    pub start_policy: StartPolicy,

    /// How often slots re-register their geometry while a drag is active.
    pub refresh_interval: Duration,

    /// Offset of the drag proxy from the pointer.
    pub overlay_offset: Vec2,

    /// If true, record session and drop decisions in a small ring buffer
    /// (see [`super::DragCoordinator::debug_log_text`]).
    pub debug_event_log: bool,

    /// Maximum number of debug log lines to keep.
    pub debug_event_log_capacity: usize,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            margin: 15.0,
            central_margin: 25.0,
            horizontal_weight: 1.5,
            central_preference: 0.9,
            start_policy: StartPolicy::Reject,
            refresh_interval: Duration::from_millis(100),
            overlay_offset: Vec2::new(-20.0, -20.0),
            debug_event_log: false,
            debug_event_log_capacity: 200,
        }
    }
}
