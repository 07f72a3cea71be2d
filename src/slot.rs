use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use egui::{Rect, Sense, Vec2};

use crate::coordinator::{
    DragCoordinator, DragPayload, DropHandler, DropTargetRecord, TargetEmphasis, TargetId,
};
use crate::platform::{EguiPlatform, ElementId, PlatformAdapter};

/// Called by a slot's manual remove action with `(payload, slot_index)`.
pub type RemoveHandler = Rc<dyn Fn(&DragPayload, usize)>;

/// The middle slot of a row, which gets a larger hit margin and a slight preference.
///
/// Only odd rows of three or more have one.
pub fn central_slot_index(row_len: usize) -> Option<usize> {
    (row_len >= 3 && row_len % 2 == 1).then_some(row_len / 2)
}

/// Periodic geometry refresh while a drag is active.
///
/// Layout can shift without any event we observe directly (virtual keyboard, reflow), so slots
/// re-register on a short timer instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeometryRefresh {
    last: Option<f64>,
}

impl GeometryRefresh {
    /// True when a refresh is due at `now` (seconds). The first call of a drag is always due.
    pub fn due(&mut self, now: f64, interval: Duration) -> bool {
        match self.last {
            Some(last) if now - last < interval.as_secs_f64() => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// One fixed position in the target sentence.
pub struct DropSlot {
    target_id: TargetId,
    element: ElementId,
    slot_index: usize,
    emphasis: TargetEmphasis,

    /// Written by the registered drop handler, cleared by [`Self::remove`].
    filled: Rc<RefCell<Option<DragPayload>>>,
    on_drop: DropHandler,
    on_remove: RemoveHandler,

    refresh: GeometryRefresh,
    mounted: bool,
    registered_rect: Option<Rect>,
}

impl std::fmt::Debug for DropSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropSlot")
            .field("target_id", &self.target_id)
            .field("slot_index", &self.slot_index)
            .field("emphasis", &self.emphasis)
            .field("filled", &self.filled.borrow())
            .field("mounted", &self.mounted)
            .finish_non_exhaustive()
    }
}

impl DropSlot {
    /// `on_drop` runs after the coordinator accepts a token into this slot.
    pub fn new(target_id: TargetId, slot_index: usize, on_drop: DropHandler) -> Self {
        let filled: Rc<RefCell<Option<DragPayload>>> = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&filled);
        let on_drop: DropHandler = Rc::new(move |payload, slot_index| {
            *sink.borrow_mut() = Some(payload.clone());
            on_drop(payload, slot_index);
        });

        Self {
            target_id,
            element: target_id.0,
            slot_index,
            emphasis: TargetEmphasis::Normal,
            filled,
            on_drop,
            on_remove: Rc::new(|_, _| {}),
            refresh: GeometryRefresh::default(),
            mounted: false,
            registered_rect: None,
        }
    }

    pub fn with_on_remove(mut self, on_remove: RemoveHandler) -> Self {
        self.on_remove = on_remove;
        self
    }

    pub fn with_emphasis(mut self, emphasis: TargetEmphasis) -> Self {
        self.emphasis = emphasis;
        self
    }

    /// Marks the slot central if it is the middle of a row of `row_len` slots.
    pub fn in_row(self, row_len: usize) -> Self {
        let emphasis = if central_slot_index(row_len) == Some(self.slot_index) {
            TargetEmphasis::Central
        } else {
            TargetEmphasis::Normal
        };
        self.with_emphasis(emphasis)
    }

    pub fn target_id(&self) -> TargetId {
        self.target_id
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn slot_index(&self) -> usize {
        self.slot_index
    }

    pub fn emphasis(&self) -> TargetEmphasis {
        self.emphasis
    }

    pub fn filled(&self) -> Option<DragPayload> {
        self.filled.borrow().clone()
    }

    pub fn is_filled(&self) -> bool {
        self.filled.borrow().is_some()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_hovered(&self, coordinator: &DragCoordinator) -> bool {
        coordinator.hovered_target_id() == Some(self.target_id)
    }

    fn register(&mut self, coordinator: &mut DragCoordinator, platform: &dyn PlatformAdapter) -> bool {
        let Some(rect) = platform.element_rect(self.element) else {
            log::trace!("slot {} has no geometry yet", self.slot_index);
            return false;
        };
        coordinator.register_target_with(
            DropTargetRecord::new(
                self.target_id,
                rect,
                self.slot_index,
                self.is_filled(),
                Rc::clone(&self.on_drop),
            )
            .with_emphasis(self.emphasis),
        );
        self.registered_rect = Some(rect);
        true
    }

    /// Registers the slot's current geometry. Returns false if the element has no rect yet.
    pub fn mount(&mut self, coordinator: &mut DragCoordinator, platform: &dyn PlatformAdapter) -> bool {
        self.mounted = self.register(coordinator, platform);
        self.mounted
    }

    /// Window resize or scroll: re-register with fresh geometry.
    pub fn on_geometry_changed(
        &mut self,
        coordinator: &mut DragCoordinator,
        platform: &dyn PlatformAdapter,
    ) -> bool {
        if !self.mounted {
            return self.mount(coordinator, platform);
        }
        self.register(coordinator, platform)
    }

    /// Periodic refresh; only does work while a session is active. Returns true if it re-registered.
    pub fn tick(
        &mut self,
        coordinator: &mut DragCoordinator,
        platform: &dyn PlatformAdapter,
        now: f64,
    ) -> bool {
        if !self.mounted {
            return false;
        }
        if !coordinator.is_dragging() {
            self.refresh.reset();
            return false;
        }
        let interval = coordinator.options.refresh_interval;
        self.refresh.due(now, interval) && self.register(coordinator, platform)
    }

    /// Manual remove of an already-filled slot. Independent of the drag path.
    pub fn remove(&mut self, coordinator: &mut DragCoordinator) -> Option<DragPayload> {
        let payload = self.filled.borrow_mut().take()?;
        coordinator.release_target(self.target_id);
        log::debug!("slot {} cleared ({:?})", self.slot_index, payload.label);
        (self.on_remove)(&payload, self.slot_index);
        Some(payload)
    }

    pub fn unmount(&mut self, coordinator: &mut DragCoordinator) {
        coordinator.unregister_target(self.target_id);
        self.mounted = false;
        self.registered_rect = None;
        self.refresh.reset();
    }

    /// Shows the slot. Double-click removes a placed word.
    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        coordinator: &mut DragCoordinator,
        platform: &mut EguiPlatform,
        min_size: Vec2,
    ) -> SlotResponse {
        let filled = self.filled();
        let galley = filled.as_ref().map(|payload| {
            ui.painter().layout_no_wrap(
                payload.label.clone(),
                payload.font_or_default(),
                ui.visuals().strong_text_color(),
            )
        });
        let padding = Vec2::new(10.0, 10.0);
        let size = galley
            .as_ref()
            .map_or(min_size, |g| (g.size() + 2.0 * padding).max(min_size));

        let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
        let response = ui.interact(rect, self.element, Sense::click());
        platform.note_element_rect(self.element, rect);

        if !self.mounted {
            self.mount(coordinator, platform);
        } else if self.registered_rect != Some(rect) {
            // Resize, scroll and reflow all show up as a moved rect.
            self.on_geometry_changed(coordinator, platform);
        }

        let now = ui.input(|i| i.time);
        self.tick(coordinator, platform, now);
        if coordinator.is_dragging() {
            ui.ctx()
                .request_repaint_after(coordinator.options.refresh_interval);
        }

        let removed = if response.double_clicked() {
            self.remove(coordinator)
        } else {
            None
        };

        let hovered = self.is_hovered(coordinator);
        if ui.is_rect_visible(rect) {
            let visuals = ui.visuals();
            let (fill, stroke) = if hovered {
                (
                    visuals.selection.bg_fill.gamma_multiply(0.45),
                    visuals.selection.stroke,
                )
            } else if filled.is_some() {
                (
                    visuals.widgets.inactive.weak_bg_fill,
                    visuals.widgets.inactive.bg_stroke,
                )
            } else {
                (
                    egui::Color32::TRANSPARENT,
                    visuals.widgets.noninteractive.bg_stroke,
                )
            };
            let painter = ui.painter();
            painter.rect(rect, 8.0, fill, stroke, egui::StrokeKind::Inside);
            if removed.is_none() {
                if let Some(galley) = galley {
                    let pos = rect.center() - galley.size() * 0.5;
                    painter.galley(pos, galley, visuals.strong_text_color());
                }
            }
        }

        SlotResponse {
            response,
            hovered,
            removed,
        }
    }
}

pub struct SlotResponse {
    pub response: egui::Response,

    /// The slot is the coordinator's current hovered target.
    pub hovered: bool,

    /// Payload cleared by the remove action this frame.
    pub removed: Option<DragPayload>,
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use egui::Pos2;

    use super::*;
    use crate::coordinator::TokenId;
    use crate::platform::HeadlessPlatform;

    fn slot_rect(index: usize) -> Rect {
        Rect::from_min_size(Pos2::new(index as f32 * 120.0, 0.0), Vec2::new(100.0, 50.0))
    }

    fn mounted_slot(
        coordinator: &mut DragCoordinator,
        platform: &mut HeadlessPlatform,
        index: usize,
    ) -> DropSlot {
        let mut slot = DropSlot::new(TargetId::new(("slot", index)), index, Rc::new(|_, _| {}));
        platform.set_rect(slot.element(), slot_rect(index));
        assert!(slot.mount(coordinator, platform));
        slot
    }

    #[test]
    fn central_slot_only_for_odd_rows() {
        assert_eq!(central_slot_index(3), Some(1));
        assert_eq!(central_slot_index(5), Some(2));
        assert_eq!(central_slot_index(4), None);
        assert_eq!(central_slot_index(1), None);
        assert_eq!(central_slot_index(0), None);

        let slot = DropSlot::new(TargetId::new("s"), 1, Rc::new(|_, _| {})).in_row(3);
        assert_eq!(slot.emphasis(), TargetEmphasis::Central);
        let slot = DropSlot::new(TargetId::new("s"), 0, Rc::new(|_, _| {})).in_row(3);
        assert_eq!(slot.emphasis(), TargetEmphasis::Normal);
    }

    #[test]
    fn mount_without_geometry_is_deferred() {
        let mut coordinator = DragCoordinator::new();
        let platform = HeadlessPlatform::new();
        let mut slot = DropSlot::new(TargetId::new("s"), 0, Rc::new(|_, _| {}));

        assert!(!slot.mount(&mut coordinator, &platform));
        assert!(!slot.is_mounted());
        assert_eq!(coordinator.target_count(), 0);
    }

    #[test]
    fn geometry_refresh_interval() {
        let mut refresh = GeometryRefresh::default();
        let interval = Duration::from_millis(100);
        assert!(refresh.due(1.0, interval));
        assert!(!refresh.due(1.05, interval));
        assert!(refresh.due(1.1, interval));
        refresh.reset();
        assert!(refresh.due(1.11, interval));
    }

    #[test]
    fn tick_refreshes_only_while_dragging() {
        let mut coordinator = DragCoordinator::new();
        let mut platform = HeadlessPlatform::new();
        let mut slot = mounted_slot(&mut coordinator, &mut platform, 0);

        // Layout shifts under us (e.g. a virtual keyboard opened).
        let shifted = slot_rect(0).translate(Vec2::new(0.0, -80.0));
        platform.set_rect(slot.element(), shifted);

        assert!(!slot.tick(&mut coordinator, &platform, 0.0));
        assert_eq!(coordinator.target(slot.target_id()).unwrap().rect, slot_rect(0));

        coordinator
            .start_session(TokenId::new("t"), DragPayload::new("t", 0), Pos2::ZERO)
            .unwrap();
        assert!(slot.tick(&mut coordinator, &platform, 0.0));
        assert_eq!(coordinator.target(slot.target_id()).unwrap().rect, shifted);
        assert!(!slot.tick(&mut coordinator, &platform, 0.05));
    }

    #[test]
    fn remove_clears_occupancy_and_notifies() {
        let removed_calls = Rc::new(Cell::new(0));
        let mut coordinator = DragCoordinator::new();
        let mut platform = HeadlessPlatform::new();

        let counter = Rc::clone(&removed_calls);
        let mut slot = DropSlot::new(TargetId::new("s"), 0, Rc::new(|_, _| {})).with_on_remove(
            Rc::new(move |payload, slot_index| {
                assert_eq!(payload.label, "hello");
                assert_eq!(slot_index, 0);
                counter.set(counter.get() + 1);
            }),
        );
        platform.set_rect(slot.element(), slot_rect(0));
        slot.mount(&mut coordinator, &platform);

        // Nothing to remove yet.
        assert!(slot.remove(&mut coordinator).is_none());
        assert_eq!(removed_calls.get(), 0);

        coordinator
            .start_session(TokenId::new("t"), DragPayload::new("hello", 0), Pos2::ZERO)
            .unwrap();
        coordinator.update_position(Pos2::new(50.0, 25.0));
        assert!(coordinator.resolve().is_accepted());
        assert!(slot.is_filled());
        assert!(coordinator.target(slot.target_id()).unwrap().occupied);

        let removed = slot.remove(&mut coordinator).expect("slot was filled");
        assert_eq!(removed.label, "hello");
        assert!(!slot.is_filled());
        assert!(!coordinator.target(slot.target_id()).unwrap().occupied);
        assert_eq!(removed_calls.get(), 1);
    }

    #[test]
    fn reregistration_keeps_occupancy_in_sync() {
        let mut coordinator = DragCoordinator::new();
        let mut platform = HeadlessPlatform::new();
        let mut slot = mounted_slot(&mut coordinator, &mut platform, 0);

        coordinator
            .start_session(TokenId::new("t"), DragPayload::new("w", 0), Pos2::ZERO)
            .unwrap();
        coordinator.update_position(Pos2::new(50.0, 25.0));
        assert!(coordinator.resolve().is_accepted());

        assert!(slot.on_geometry_changed(&mut coordinator, &platform));
        assert!(coordinator.target(slot.target_id()).unwrap().occupied);
        assert_eq!(coordinator.target_count(), 1);
    }

    #[test]
    fn unmount_unregisters() {
        let mut coordinator = DragCoordinator::new();
        let mut platform = HeadlessPlatform::new();
        let mut slot = mounted_slot(&mut coordinator, &mut platform, 2);

        slot.unmount(&mut coordinator);
        assert!(!slot.is_mounted());
        assert!(coordinator.target(slot.target_id()).is_none());
    }

    // ------------------------------------------------------------------------
    // Driven through egui

    /// A row of slots laid out by a real `egui::Context`, shifted down by `offset`.
    struct EguiRow {
        ctx: egui::Context,
        coordinator: DragCoordinator,
        platform: EguiPlatform,
        slots: Vec<DropSlot>,
        rects: Vec<Rect>,
        removed: Vec<DragPayload>,
        offset: f32,
        time: f64,
    }

    impl EguiRow {
        fn new(len: usize) -> Self {
            let ctx = egui::Context::default();
            let slots = (0..len)
                .map(|i| DropSlot::new(TargetId::new(("egui_row", i)), i, Rc::new(|_, _| {})))
                .collect();
            let mut row = Self {
                platform: EguiPlatform::new(&ctx),
                ctx,
                coordinator: DragCoordinator::new(),
                slots,
                rects: Vec::new(),
                removed: Vec::new(),
                offset: 0.0,
                time: 1.0,
            };
            row.frame(Vec::new());
            row
        }

        fn frame(&mut self, events: Vec<egui::Event>) {
            self.time += 1.0 / 60.0;
            self.ctx.begin_pass(egui::RawInput {
                screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))),
                time: Some(self.time),
                events,
                ..Default::default()
            });
            self.platform.begin_frame(&self.ctx);
            let ctx = self.ctx.clone();
            egui::CentralPanel::default().show(&ctx, |ui| {
                ui.add_space(self.offset);
                ui.horizontal(|ui| {
                    self.rects.clear();
                    for slot in &mut self.slots {
                        let response = slot.ui(
                            ui,
                            &mut self.coordinator,
                            &mut self.platform,
                            Vec2::new(96.0, 48.0),
                        );
                        self.rects.push(response.response.rect);
                        self.removed.extend(response.removed);
                    }
                });
            });
            let _ = self.ctx.end_pass();
        }

        fn click(&mut self, pos: Pos2) {
            for pressed in [true, false] {
                self.frame(vec![egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    modifiers: egui::Modifiers::default(),
                }]);
            }
        }
    }

    #[test]
    fn egui_slot_follows_its_layout() {
        let mut row = EguiRow::new(2);
        let id = row.slots[1].target_id();
        let before = row.rects[1];
        assert_eq!(row.coordinator.target(id).map(|r| r.rect), Some(before));

        row.offset = 30.0;
        row.frame(Vec::new());
        let after = row.rects[1];
        assert_eq!(after, before.translate(Vec2::new(0.0, 30.0)));
        assert_eq!(row.coordinator.target(id).map(|r| r.rect), Some(after));
        assert_eq!(row.coordinator.target_count(), 2);
    }

    #[test]
    fn egui_double_click_removes_the_word() {
        let mut row = EguiRow::new(2);
        let id = row.slots[0].target_id();
        let center = row.rects[0].center();

        row.coordinator
            .start_session(TokenId::new("t"), DragPayload::new("w", 0), Pos2::ZERO)
            .unwrap();
        row.coordinator.update_position(center);
        assert!(row.coordinator.resolve().is_accepted());
        assert!(row.slots[0].is_filled());
        assert!(row.coordinator.target(id).unwrap().occupied);

        row.frame(vec![egui::Event::PointerMoved(center)]);
        row.click(center);
        assert!(row.removed.is_empty(), "a single click keeps the word");
        row.click(center);

        assert_eq!(
            row.removed.iter().map(|p| p.label.as_str()).collect::<Vec<_>>(),
            vec!["w"]
        );
        assert!(!row.slots[0].is_filled());
        assert!(!row.coordinator.target(id).unwrap().occupied);
    }
}
