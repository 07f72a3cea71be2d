use egui::{Pos2, Rect};

mod debug;
mod options;
mod registry;
mod session;

#[cfg(test)]
mod model_tests;

pub use hit_test::{hovered_target, target_score};
pub use options::{CoordinatorOptions, StartPolicy};
pub use registry::{DropHandler, DropTargetRecord, TargetEmphasis, TargetId, TargetRegistry};
pub use session::{DragPayload, DragSession, SessionPhase, TokenId};

use debug::DebugEventLog;

use crate::platform::{PointerEvent, PointerPhase};

/// Optional host hooks around the session lifecycle, e.g. for "token in use" styling.
pub trait SessionHooks {
    fn on_session_start(&mut self, _token: TokenId) {}

    fn on_session_end(&mut self, _token: TokenId) {}
}

/// Returned by [`DragCoordinator::start_session`] under [`StartPolicy::Reject`].
#[derive(Debug)]
pub enum StartSessionError {
    SessionActive { active: TokenId },
}

impl std::fmt::Display for StartSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionActive { active } => {
                write!(f, "a drag session is already active for token {:?}", active.0)
            }
        }
    }
}

impl std::error::Error for StartSessionError {}

/// Why a drop was not accepted. These are normal game outcomes: the token returns to its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Released while not over any target.
    NoTarget,

    Occupied { target: TargetId },

    /// The hovered slot is not the token's required slot.
    SlotMismatch {
        target: TargetId,
        slot_index: usize,
        required_slot: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// No session was active.
    NoSession,

    Accepted {
        token: TokenId,
        target: TargetId,
        slot_index: usize,
    },

    Rejected {
        token: TokenId,
        reason: RejectReason,
    },
}

impl ResolveOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Owns the single active drag session and the drop-target registry.
///
/// Construct one per puzzle view and pass it (`&mut`) to the tokens and slots that need it.
/// State machine: `Idle → Dragging` ([`Self::start_session`]) `→ Idle` ([`Self::resolve`] or
/// [`Self::cancel`]).
///
/// Invariants:
/// - at most one session exists;
/// - the session's hovered target is always a live registry key;
/// - a record's `occupied` flag changes only in [`Self::resolve`] and in a slot's remove action.
pub struct DragCoordinator {
    pub options: CoordinatorOptions,

    registry: TargetRegistry,
    session: Option<DragSession>,
    next_session_serial: u64,
    hooks: Option<Box<dyn SessionHooks>>,
    debug_log: DebugEventLog,
}

impl Default for DragCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DragCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragCoordinator")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::new_with_options(CoordinatorOptions::default())
    }

    pub fn new_with_options(options: CoordinatorOptions) -> Self {
        Self {
            options,
            registry: TargetRegistry::default(),
            session: None,
            next_session_serial: 1,
            hooks: None,
            debug_log: DebugEventLog::default(),
        }
    }

    pub fn set_hooks(&mut self, hooks: impl SessionHooks + 'static) {
        self.hooks = Some(Box::new(hooks));
    }

    pub fn clear_hooks(&mut self) {
        self.hooks = None;
    }

    // ------------------------------------------------------------------------
    // Session

    /// Begins a drag. With [`StartPolicy::Reject`] an active session is left untouched and the
    /// call fails; with [`StartPolicy::Replace`] the active session is cancelled first, and its
    /// token releases capture as described on [`Self::cancel`].
    pub fn start_session(
        &mut self,
        token: TokenId,
        payload: DragPayload,
        pos: Pos2,
    ) -> Result<(), StartSessionError> {
        if let Some(active) = &self.session {
            match self.options.start_policy {
                StartPolicy::Reject => {
                    let active = active.token_id;
                    log::debug!(
                        "start_session ignored for {:?}: session for {:?} still active",
                        token.0,
                        active.0
                    );
                    self.debug_event(format!(
                        "session START rejected token={:?} active={:?}",
                        token.0, active.0
                    ));
                    return Err(StartSessionError::SessionActive { active });
                }
                StartPolicy::Replace => {
                    self.end_session("replaced");
                }
            }
        }

        let serial = self.next_session_serial.max(1);
        self.next_session_serial = serial.saturating_add(1);
        log::debug!(
            "session {serial} start token={:?} label={:?} required_slot={}",
            token.0,
            payload.label,
            payload.required_slot
        );
        self.debug_event(format!(
            "session START id={serial} token={:?} label={:?} pos={pos:?}",
            token.0, payload.label
        ));
        self.session = Some(DragSession::new(serial, token, payload, pos));

        if let Some(hooks) = &mut self.hooks {
            hooks.on_session_start(token);
        }
        Ok(())
    }

    /// Moves the pointer and recomputes the hovered target. No-op without a session.
    pub fn update_position(&mut self, pos: Pos2) {
        let Some(session) = &mut self.session else {
            return;
        };
        session.pointer = pos;
        let hovered = hit_test::hovered_target(self.registry.records(), pos, &self.options);
        if hovered != session.hovered {
            log::trace!("session {} hover {:?} -> {:?}", session.serial, session.hovered, hovered);
            session.hovered = hovered;
        }
    }

    /// Commits or rejects the drop at the current hover and ends the session.
    ///
    /// Accepts only when the hovered target is unoccupied and its slot index equals the payload's
    /// required slot. On accept the target becomes occupied and its drop handler runs exactly once,
    /// after the coordinator's own state is settled.
    pub fn resolve(&mut self) -> ResolveOutcome {
        let Some(session) = &self.session else {
            return ResolveOutcome::NoSession;
        };
        let token = session.token_id;

        let decision = match session.hovered.and_then(|id| self.registry.get(id)) {
            None => Err(RejectReason::NoTarget),
            Some(record) if record.occupied => Err(RejectReason::Occupied { target: record.id }),
            Some(record) if record.slot_index != session.payload.required_slot => {
                Err(RejectReason::SlotMismatch {
                    target: record.id,
                    slot_index: record.slot_index,
                    required_slot: session.payload.required_slot,
                })
            }
            Some(record) => Ok((record.id, record.slot_index, record.on_drop.clone())),
        };

        match decision {
            Ok((target, slot_index, on_drop)) => {
                self.registry.set_occupied(target, true);
                let Some(session) = self.end_session("accepted") else {
                    return ResolveOutcome::NoSession;
                };
                log::debug!(
                    "session {} accepted into slot {slot_index} ({:?})",
                    session.serial,
                    target.0
                );
                on_drop(&session.payload, slot_index);
                ResolveOutcome::Accepted {
                    token,
                    target,
                    slot_index,
                }
            }
            Err(reason) => {
                self.end_session("rejected");
                log::debug!("drop of {:?} rejected: {reason:?}", token.0);
                self.debug_event(format!("drop REJECTED token={:?} reason={reason:?}", token.0));
                ResolveOutcome::Rejected { token, reason }
            }
        }
    }

    /// Ends any session without touching the registry. Returns whether a session was active.
    ///
    /// The coordinator holds no pointer capture itself. A token that captured the pointer releases
    /// it on its next frame or event; hosts without a frame loop call
    /// [`crate::DraggableToken::detach`] right after cancelling.
    pub fn cancel(&mut self) -> bool {
        self.end_session("cancelled").is_some()
    }

    /// Document-level listening: routes a pointer event straight to the session.
    ///
    /// `Down` is ignored (sessions start from tokens). Returns the outcome for `Up`.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> Option<ResolveOutcome> {
        match event.phase {
            PointerPhase::Down => None,
            PointerPhase::Move => {
                self.update_position(event.pos);
                None
            }
            PointerPhase::Up => {
                self.update_position(event.pos);
                Some(self.resolve())
            }
            PointerPhase::Cancel => {
                self.cancel();
                None
            }
        }
    }

    fn end_session(&mut self, reason: &'static str) -> Option<DragSession> {
        let session = self.session.take()?;
        self.debug_event(format!(
            "session END id={} token={:?} reason={reason} hovered={:?}",
            session.serial,
            session.token_id.0,
            session.hovered.map(|t| t.0)
        ));
        if let Some(hooks) = &mut self.hooks {
            hooks.on_session_end(session.token_id);
        }
        Some(session)
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn hovered_target_id(&self) -> Option<TargetId> {
        self.session.as_ref().and_then(|s| s.hovered)
    }

    // ------------------------------------------------------------------------
    // Registry

    /// Upserts a target. The last write for an id wins.
    pub fn register_target(
        &mut self,
        id: TargetId,
        rect: Rect,
        slot_index: usize,
        occupied: bool,
        on_drop: DropHandler,
    ) {
        self.register_target_with(DropTargetRecord::new(id, rect, slot_index, occupied, on_drop));
    }

    pub fn register_target_with(&mut self, record: DropTargetRecord) {
        let id = record.id;
        if self.registry.upsert(record).is_none() {
            log::trace!("registered target {:?}", id.0);
        }
    }

    /// Removes a target. If it was hovered, the session continues hovering nothing.
    pub fn unregister_target(&mut self, id: TargetId) {
        if self.registry.remove(id).is_none() {
            return;
        }
        if let Some(session) = &mut self.session {
            if session.hovered == Some(id) {
                session.hovered = None;
                log::trace!("session {} lost hovered target {:?}", session.serial, id.0);
            }
        }
    }

    /// Geometry-only update. Returns false if the target is not registered.
    pub fn refresh_target_rect(&mut self, id: TargetId, rect: Rect) -> bool {
        self.registry.set_rect(id, rect)
    }

    /// Clears occupancy for a slot's manual remove action. Never called by the drag path.
    pub(crate) fn release_target(&mut self, id: TargetId) -> bool {
        let released = self.registry.set_occupied(id, false);
        if released {
            self.debug_event(format!("target RELEASED id={:?}", id.0));
        }
        released
    }

    pub fn target(&self, id: TargetId) -> Option<&DropTargetRecord> {
        self.registry.get(id)
    }

    pub fn target_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------------
    // Debug

    fn debug_event(&mut self, message: String) {
        if !self.options.debug_event_log {
            return;
        }
        self.debug_log
            .push(self.options.debug_event_log_capacity, message);
    }

    pub fn debug_log_text(&self) -> String {
        self.debug_log.text()
    }

    pub fn debug_log_clear(&mut self) {
        self.debug_log.clear();
    }
}
