use egui::{CursorIcon, Sense, Vec2};

use crate::coordinator::{DragCoordinator, DragPayload, ResolveOutcome, TokenId};
use crate::platform::{
    EguiPlatform, ElementId, PlatformAdapter, PointerEvent, PointerId, PointerPhase,
};

/// How a token receives the moves of its active pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerRoute {
    /// The element holds pointer capture; the token forwards moves itself.
    Captured,

    /// Capture failed or was lost; moves are taken at document level through
    /// [`DragCoordinator::handle_pointer_event`].
    Document,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActivePointer {
    pointer: PointerId,
    route: PointerRoute,
}

/// What a pointer event did to a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenEvent {
    Ignored,
    Started { route: PointerRoute },
    Moved,
    Dropped(ResolveOutcome),
    Cancelled,
}

/// A word that can be picked up and dragged into a slot.
///
/// The token starts sessions and forwards pointer input; accepting or rejecting a drop is entirely
/// up to the coordinator.
#[derive(Clone, Debug)]
pub struct DraggableToken {
    token_id: TokenId,
    element: ElementId,
    payload: DragPayload,

    /// Already dropped into its slot; pointer-down is ignored.
    pub placed: bool,
    pub disabled: bool,

    active: Option<ActivePointer>,
}

impl DraggableToken {
    pub fn new(token_id: TokenId, payload: DragPayload) -> Self {
        Self {
            token_id,
            element: token_id.0.with("egui_wordslots_token"),
            payload,
            placed: false,
            disabled: false,
            active: None,
        }
    }

    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn payload(&self) -> &DragPayload {
        &self.payload
    }

    pub fn route(&self) -> Option<PointerRoute> {
        self.active.map(|a| a.route)
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    fn owns_session(&self, coordinator: &DragCoordinator) -> bool {
        coordinator
            .session()
            .is_some_and(|s| s.token_id() == self.token_id)
    }

    /// Feeds one platform pointer event to this token.
    pub fn handle_event(
        &mut self,
        event: PointerEvent,
        coordinator: &mut DragCoordinator,
        platform: &mut dyn PlatformAdapter,
    ) -> TokenEvent {
        match event.phase {
            PointerPhase::Down => self.on_pointer_down(event, coordinator, platform),
            PointerPhase::Move => self.on_pointer_move(event, coordinator, platform),
            PointerPhase::Up => self.on_pointer_up(event, coordinator, platform),
            PointerPhase::Cancel => self.on_pointer_cancel(event, coordinator, platform),
        }
    }

    fn on_pointer_down(
        &mut self,
        event: PointerEvent,
        coordinator: &mut DragCoordinator,
        platform: &mut dyn PlatformAdapter,
    ) -> TokenEvent {
        if self.placed || self.disabled || self.active.is_some() {
            return TokenEvent::Ignored;
        }
        let hit = platform
            .element_rect(self.element)
            .is_some_and(|rect| rect.contains(event.pos));
        if !hit {
            return TokenEvent::Ignored;
        }

        if coordinator
            .start_session(self.token_id, self.payload.clone(), event.pos)
            .is_err()
        {
            return TokenEvent::Ignored;
        }

        let route = match platform.acquire_capture(self.element, event.pointer) {
            Ok(()) => PointerRoute::Captured,
            Err(err) => {
                log::warn!(
                    "pointer capture failed for token {:?}: {err}; listening at document level",
                    self.token_id.0
                );
                PointerRoute::Document
            }
        };
        self.active = Some(ActivePointer {
            pointer: event.pointer,
            route,
        });
        TokenEvent::Started { route }
    }

    fn on_pointer_move(
        &mut self,
        event: PointerEvent,
        coordinator: &mut DragCoordinator,
        platform: &mut dyn PlatformAdapter,
    ) -> TokenEvent {
        let Some(active) = self.active else {
            return TokenEvent::Ignored;
        };
        if active.pointer != event.pointer {
            return TokenEvent::Ignored;
        }
        if !self.owns_session(coordinator) {
            // Our session was replaced or cancelled elsewhere.
            self.abandon(platform);
            return TokenEvent::Ignored;
        }

        match active.route {
            PointerRoute::Captured if platform.has_capture(self.element, active.pointer) => {
                coordinator.update_position(event.pos);
            }
            PointerRoute::Captured => {
                log::warn!(
                    "token {:?} lost pointer capture; listening at document level",
                    self.token_id.0
                );
                self.active = Some(ActivePointer {
                    route: PointerRoute::Document,
                    ..active
                });
                coordinator.handle_pointer_event(event);
            }
            PointerRoute::Document => {
                coordinator.handle_pointer_event(event);
            }
        }
        TokenEvent::Moved
    }

    fn on_pointer_up(
        &mut self,
        event: PointerEvent,
        coordinator: &mut DragCoordinator,
        platform: &mut dyn PlatformAdapter,
    ) -> TokenEvent {
        let Some(active) = self.active else {
            return TokenEvent::Ignored;
        };
        if active.pointer != event.pointer {
            return TokenEvent::Ignored;
        }
        self.abandon(platform);
        if !self.owns_session(coordinator) {
            return TokenEvent::Ignored;
        }

        let outcome = match active.route {
            PointerRoute::Captured => {
                coordinator.update_position(event.pos);
                coordinator.resolve()
            }
            PointerRoute::Document => coordinator
                .handle_pointer_event(event)
                .unwrap_or(ResolveOutcome::NoSession),
        };
        if outcome.is_accepted() {
            self.placed = true;
        }
        TokenEvent::Dropped(outcome)
    }

    fn on_pointer_cancel(
        &mut self,
        event: PointerEvent,
        coordinator: &mut DragCoordinator,
        platform: &mut dyn PlatformAdapter,
    ) -> TokenEvent {
        let Some(active) = self.active else {
            return TokenEvent::Ignored;
        };
        if active.pointer != event.pointer {
            return TokenEvent::Ignored;
        }
        self.abandon(platform);
        if self.owns_session(coordinator) {
            coordinator.cancel();
        }
        TokenEvent::Cancelled
    }

    /// Drops this token's pointer and releases its capture after the host ended the session
    /// directly (e.g. [`DragCoordinator::cancel`] or a replacing start). Returns whether the token
    /// was tracking a pointer.
    ///
    /// [`Self::ui`] does this on its own at the start of each frame.
    pub fn detach(&mut self, platform: &mut dyn PlatformAdapter) -> bool {
        let was_active = self.active.is_some();
        self.abandon(platform);
        was_active
    }

    /// Forgets the active pointer and releases capture if it is still held.
    fn abandon(&mut self, platform: &mut dyn PlatformAdapter) {
        let Some(active) = self.active.take() else {
            return;
        };
        if !platform.has_capture(self.element, active.pointer) {
            return;
        }
        if let Err(err) = platform.release_capture(self.element, active.pointer) {
            log::warn!(
                "releasing pointer capture for token {:?} failed: {err}",
                self.token_id.0
            );
        }
    }

    /// Shows the word card and processes this frame's pointer events.
    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        coordinator: &mut DragCoordinator,
        platform: &mut EguiPlatform,
    ) -> TokenResponse {
        let in_use = self.placed || self.disabled || self.owns_session(coordinator);
        let visuals = if in_use {
            ui.visuals().widgets.noninteractive
        } else {
            ui.visuals().widgets.inactive
        };

        let galley = ui.painter().layout_no_wrap(
            self.payload.label.clone(),
            self.payload.font_or_default(),
            visuals.text_color(),
        );
        let padding = Vec2::new(20.0, 12.0);
        let (rect, _) = ui.allocate_exact_size(galley.size() + 2.0 * padding, Sense::hover());
        let response = ui.interact(rect, self.element, Sense::drag());
        platform.note_element_rect(self.element, rect);

        if self.active.is_some() && !self.owns_session(coordinator) {
            log::debug!("token {:?} detached: session ended elsewhere", self.token_id.0);
            self.detach(platform);
        }

        let mut events = Vec::new();
        for event in platform.pointer_events().to_vec() {
            let result = self.handle_event(event, coordinator, platform);
            if result != TokenEvent::Ignored {
                events.push(result);
            }
        }

        if self.is_dragging() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if response.hovered() && !self.placed && !self.disabled {
            ui.ctx().set_cursor_icon(CursorIcon::Grab);
        }

        if ui.is_rect_visible(rect) {
            let fade = if in_use { 0.5 } else { 1.0 };
            let painter = ui.painter();
            painter.rect(
                rect,
                8.0,
                visuals.weak_bg_fill.gamma_multiply(fade),
                visuals.bg_stroke,
                egui::StrokeKind::Inside,
            );
            painter.galley(
                rect.min + padding,
                galley,
                visuals.text_color().gamma_multiply(fade),
            );
        }

        TokenResponse { response, events }
    }
}

pub struct TokenResponse {
    pub response: egui::Response,

    /// Everything this frame's pointer events did, in order.
    pub events: Vec<TokenEvent>,
}

impl TokenResponse {
    /// The drop outcome, if the drag ended this frame.
    pub fn dropped(&self) -> Option<ResolveOutcome> {
        self.events.iter().find_map(|e| match e {
            TokenEvent::Dropped(outcome) => Some(*outcome),
            _ => None,
        })
    }
}
