use egui::{FontId, Pos2};

use super::registry::TargetId;

/// Identity of a draggable token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TokenId(pub egui::Id);

impl TokenId {
    pub fn new(source: impl std::hash::Hash) -> Self {
        Self(egui::Id::new(source))
    }
}

impl From<egui::Id> for TokenId {
    fn from(id: egui::Id) -> Self {
        Self(id)
    }
}

/// What is being dragged: the word plus the slot it belongs in.
#[derive(Clone, Debug, PartialEq)]
pub struct DragPayload {
    pub label: String,

    /// The only slot index this token may be dropped into.
    pub required_slot: usize,

    /// Font used for the token, its drag proxy and the slot once filled.
    pub font: Option<FontId>,
}

impl DragPayload {
    pub fn new(label: impl Into<String>, required_slot: usize) -> Self {
        Self {
            label: label.into(),
            required_slot,
            font: None,
        }
    }

    pub fn with_font(mut self, font: FontId) -> Self {
        self.font = Some(font);
        self
    }

    pub(crate) fn font_or_default(&self) -> FontId {
        self.font.clone().unwrap_or_else(|| FontId::proportional(18.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Dragging,
}

/// The live state of the single in-progress drag.
///
/// Only [`super::DragCoordinator`] creates or mutates sessions; everything else sees `&DragSession`.
#[derive(Clone, Debug)]
pub struct DragSession {
    pub(super) serial: u64,
    pub(super) token_id: TokenId,
    pub(super) payload: DragPayload,
    pub(super) pointer: Pos2,
    pub(super) hovered: Option<TargetId>,
    pub(super) phase: SessionPhase,
}

impl DragSession {
    pub(super) fn new(serial: u64, token_id: TokenId, payload: DragPayload, pointer: Pos2) -> Self {
        Self {
            serial,
            token_id,
            payload,
            pointer,
            hovered: None,
            phase: SessionPhase::Dragging,
        }
    }

    /// Monotonic per-coordinator serial, starting at 1.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    pub fn payload(&self) -> &DragPayload {
        &self.payload
    }

    pub fn pointer(&self) -> Pos2 {
        self.pointer
    }

    pub fn hovered(&self) -> Option<TargetId> {
        self.hovered
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }
}
