//! The narrow boundary between the drag engine and the host's input system.
//!
//! Everything the engine needs from the outside world goes through here:
//! - pointer events (down/move/up/cancel), delivered by the host as [`PointerEvent`] values,
//! - pointer capture acquire/release,
//! - element bounding-rectangle queries.
//!
//! [`EguiPlatform`] wires this to a live `egui::Context`; [`HeadlessPlatform`] is a scriptable
//! stand-in so the coordinator, tokens and slots can be driven without any UI at all.

use egui::{Pos2, Rect};

mod egui_adapter;
mod headless;

pub use egui_adapter::EguiPlatform;
pub use headless::HeadlessPlatform;

/// An element that can hold pointer capture or report a bounding rectangle.
///
/// For egui hosts this is the widget id.
pub type ElementId = egui::Id;

/// Identity of one pointer (the mouse, or one touch contact).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PointerId(pub u64);

impl PointerId {
    /// The primary pointer. egui folds the first touch contact into it as well.
    pub const PRIMARY: Self = Self(0);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The platform interrupted the interaction (e.g. a system gesture took over a touch).
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub phase: PointerPhase,

    /// Position in the same coordinate space as the registered target rects.
    ///
    /// For [`PointerPhase::Cancel`] this is the last known position.
    pub pos: Pos2,
}

impl PointerEvent {
    pub fn new(pointer: PointerId, phase: PointerPhase, pos: Pos2) -> Self {
        Self {
            pointer,
            phase,
            pos,
        }
    }

    pub fn down(pos: Pos2) -> Self {
        Self::new(PointerId::PRIMARY, PointerPhase::Down, pos)
    }

    pub fn moved(pos: Pos2) -> Self {
        Self::new(PointerId::PRIMARY, PointerPhase::Move, pos)
    }

    pub fn up(pos: Pos2) -> Self {
        Self::new(PointerId::PRIMARY, PointerPhase::Up, pos)
    }

    pub fn cancel(pos: Pos2) -> Self {
        Self::new(PointerId::PRIMARY, PointerPhase::Cancel, pos)
    }
}

/// Pointer capture failures. These are environmental and never abort a drag:
/// callers log them and fall back to document-level listening.
#[derive(Debug)]
pub enum CaptureError {
    /// The platform has no capture mechanism for this element.
    Unsupported,

    /// The pointer is not pressed (any more), so there is nothing to capture.
    PointerNotActive(PointerId),

    /// Release was requested for a capture that is not held.
    NotHeld {
        element: ElementId,
        pointer: PointerId,
    },

    /// The platform refused for its own reasons.
    Rejected(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported => write!(f, "pointer capture is not supported"),
            Self::PointerNotActive(pointer) => {
                write!(f, "pointer {} is not active", pointer.0)
            }
            Self::NotHeld { element, pointer } => write!(
                f,
                "element {element:?} does not hold capture of pointer {}",
                pointer.0
            ),
            Self::Rejected(reason) => write!(f, "pointer capture rejected: {reason}"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Platform primitives used by tokens and slots.
///
/// Pointer event subscription is not part of the trait: the host feeds [`PointerEvent`]s into
/// [`crate::DraggableToken::handle_event`] (or [`crate::DragCoordinator::handle_pointer_event`]
/// for document-level listening).
pub trait PlatformAdapter {
    /// Route all further events of `pointer` to `element`, even outside its bounds.
    fn acquire_capture(&mut self, element: ElementId, pointer: PointerId)
        -> Result<(), CaptureError>;

    fn release_capture(&mut self, element: ElementId, pointer: PointerId)
        -> Result<(), CaptureError>;

    fn has_capture(&self, element: ElementId, pointer: PointerId) -> bool;

    /// Last known bounding rectangle of `element`, if it is laid out.
    fn element_rect(&self, element: ElementId) -> Option<Rect>;
}
