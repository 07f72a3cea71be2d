use egui::{Context, Event, PointerButton, Pos2, Rect, TouchPhase};

use super::{CaptureError, ElementId, PlatformAdapter, PointerEvent, PointerId, PointerPhase};

/// [`PlatformAdapter`] backed by a live `egui::Context`.
///
/// Call [`Self::begin_frame`] once per frame before any token or slot UI runs; it translates this
/// frame's raw egui input into [`PointerEvent`]s that every widget then sees in the same order.
///
/// Capture maps onto egui's dragged-widget id, which already keeps routing pointer input to the
/// dragged widget after the pointer leaves its rect.
#[derive(Debug)]
pub struct EguiPlatform {
    ctx: Context,
    events: Vec<PointerEvent>,
    track: PointerTrack,
    rects: ahash::HashMap<ElementId, Rect>,
    captured: Option<(ElementId, PointerId)>,
}

impl EguiPlatform {
    pub fn new(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            events: Vec::new(),
            track: PointerTrack::default(),
            rects: Default::default(),
            captured: None,
        }
    }

    pub fn begin_frame(&mut self, ctx: &Context) {
        self.ctx = ctx.clone();
        let mut track = self.track;
        self.events = ctx.input(|i| translate_events(&i.events, &mut track));
        self.track = track;
    }

    /// This frame's pointer events, in arrival order.
    pub fn pointer_events(&self) -> &[PointerEvent] {
        &self.events
    }

    pub fn last_pointer_pos(&self) -> Option<Pos2> {
        self.track.last_pos
    }

    /// Records where a widget was laid out this frame.
    pub fn note_element_rect(&mut self, element: ElementId, rect: Rect) {
        self.rects.insert(element, rect);
    }

    pub fn forget_element(&mut self, element: ElementId) {
        self.rects.remove(&element);
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }
}

/// Pointer state carried across frames by [`translate_events`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PointerTrack {
    pub last_pos: Option<Pos2>,
    pub primary_down: bool,
}

/// Maps raw egui events to engine pointer events.
///
/// Only the primary button drives drags. egui folds the first touch into the pointer stream, so
/// touch events are only consulted for cancellation. A pointer that leaves the window with the
/// button held may never report its release, so `PointerGone` cancels in that case.
pub(crate) fn translate_events(events: &[Event], track: &mut PointerTrack) -> Vec<PointerEvent> {
    let mut out = Vec::new();
    for event in events {
        match event {
            Event::PointerMoved(pos) => {
                track.last_pos = Some(*pos);
                out.push(PointerEvent::moved(*pos));
            }
            Event::PointerButton {
                pos,
                button: PointerButton::Primary,
                pressed,
                ..
            } => {
                track.last_pos = Some(*pos);
                track.primary_down = *pressed;
                let phase = if *pressed {
                    PointerPhase::Down
                } else {
                    PointerPhase::Up
                };
                out.push(PointerEvent::new(PointerId::PRIMARY, phase, *pos));
            }
            Event::Touch {
                phase: TouchPhase::Cancel,
                pos,
                ..
            } => {
                track.primary_down = false;
                out.push(PointerEvent::cancel(track.last_pos.unwrap_or(*pos)));
            }
            Event::PointerGone if track.primary_down => {
                track.primary_down = false;
                out.push(PointerEvent::cancel(track.last_pos.unwrap_or(Pos2::ZERO)));
            }
            _ => {}
        }
    }
    out
}

impl PlatformAdapter for EguiPlatform {
    fn acquire_capture(
        &mut self,
        element: ElementId,
        pointer: PointerId,
    ) -> Result<(), CaptureError> {
        if pointer != PointerId::PRIMARY {
            return Err(CaptureError::Unsupported);
        }
        if !self.ctx.input(|i| i.pointer.any_down()) {
            return Err(CaptureError::PointerNotActive(pointer));
        }
        self.ctx.set_dragged_id(element);
        self.captured = Some((element, pointer));
        Ok(())
    }

    fn release_capture(
        &mut self,
        element: ElementId,
        pointer: PointerId,
    ) -> Result<(), CaptureError> {
        if self.captured != Some((element, pointer)) {
            return Err(CaptureError::NotHeld { element, pointer });
        }
        self.captured = None;
        if self.ctx.dragged_id() == Some(element) {
            self.ctx.stop_dragging();
        }
        Ok(())
    }

    fn has_capture(&self, element: ElementId, pointer: PointerId) -> bool {
        self.captured == Some((element, pointer))
    }

    fn element_rect(&self, element: ElementId) -> Option<Rect> {
        self.rects
            .get(&element)
            .copied()
            .or_else(|| self.ctx.read_response(element).map(|r| r.rect))
    }
}
