//! Pointer-driven drag-and-drop for egui word-slot puzzles.
//!
//! The learner drags word tokens into ordered slots. The engine decides, per drop, whether one
//! token may go into one slot; judging the whole sentence is left to the host.
//!
//! - [`DragCoordinator`]: the single drag session, the drop-target registry and hit-testing.
//! - [`DraggableToken`] / [`DropSlot`]: widgets that drive the coordinator.
//! - [`DragOverlay`]: the proxy that follows the pointer.
//! - [`platform`]: the narrow adapter over pointer capture and geometry, with an egui and a
//!   headless implementation.
//!
//! The coordinator is an ordinary value owned by the view that hosts the puzzle; there is no
//! global drag state.

#![forbid(unsafe_code)]

pub mod coordinator;
pub mod overlay;
pub mod platform;
pub mod slot;
pub mod token;

pub use coordinator::{
    CoordinatorOptions, DragCoordinator, DragPayload, DragSession, DropHandler, DropTargetRecord,
    RejectReason, ResolveOutcome, SessionHooks, SessionPhase, StartPolicy, StartSessionError,
    TargetEmphasis, TargetId, TokenId,
};
pub use overlay::DragOverlay;
pub use platform::{
    CaptureError, EguiPlatform, ElementId, HeadlessPlatform, PlatformAdapter, PointerEvent,
    PointerId, PointerPhase,
};
pub use slot::{central_slot_index, DropSlot, GeometryRefresh, RemoveHandler, SlotResponse};
pub use token::{DraggableToken, PointerRoute, TokenEvent, TokenResponse};
