#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui;
use egui_wordslots::{
    CoordinatorOptions, DragCoordinator, DragOverlay, DragPayload, DraggableToken, DropSlot,
    EguiPlatform, ResolveOutcome, TargetId, TokenId,
};

const SENTENCE: &[&str] = &["the", "quick", "brown", "fox", "jumps"];

/// Callbacks only queue; the app applies them after the engine call returns.
#[derive(Clone, Debug)]
enum PuzzleEvent {
    Filled { label: String, slot_index: usize },
    Cleared { slot_index: usize },
}

type EventQueue = Rc<RefCell<Vec<PuzzleEvent>>>;

struct App {
    coordinator: DragCoordinator,
    platform: EguiPlatform,
    overlay: DragOverlay,
    tokens: Vec<DraggableToken>,
    slots: Vec<DropSlot>,
    events: EventQueue,
    status: String,
    show_debug_log: bool,
}

impl App {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let options = CoordinatorOptions {
            debug_event_log: true,
            ..Default::default()
        };
        let events: EventQueue = Rc::new(RefCell::new(Vec::new()));

        let slots = (0..SENTENCE.len())
            .map(|slot_index| {
                let on_drop = Rc::clone(&events);
                let on_remove = Rc::clone(&events);
                DropSlot::new(
                    TargetId::new(("word_puzzle_slot", slot_index)),
                    slot_index,
                    Rc::new(move |payload: &DragPayload, slot_index| {
                        on_drop.borrow_mut().push(PuzzleEvent::Filled {
                            label: payload.label.clone(),
                            slot_index,
                        });
                    }),
                )
                .with_on_remove(Rc::new(move |_, slot_index| {
                    on_remove
                        .borrow_mut()
                        .push(PuzzleEvent::Cleared { slot_index });
                }))
                .in_row(SENTENCE.len())
            })
            .collect();

        // A fixed shuffle keeps the demo reproducible.
        let order = [3, 0, 4, 2, 1];
        let tokens = order
            .iter()
            .map(|&slot_index| {
                let word = SENTENCE[slot_index];
                DraggableToken::new(
                    TokenId::new(("word_puzzle_token", slot_index)),
                    DragPayload::new(word, slot_index),
                )
            })
            .collect();

        Self {
            overlay: DragOverlay::from_options(&options),
            coordinator: DragCoordinator::new_with_options(options),
            platform: EguiPlatform::new(&cc.egui_ctx),
            tokens,
            slots,
            events,
            status: "Drag the words into the right order.".to_owned(),
            show_debug_log: false,
        }
    }

    fn apply_events(&mut self) {
        let drained: Vec<PuzzleEvent> = self.events.borrow_mut().drain(..).collect();
        for event in drained {
            match event {
                PuzzleEvent::Filled { label, slot_index } => {
                    log::info!("placed {label:?} in slot {slot_index}");
                }
                PuzzleEvent::Cleared { slot_index } => {
                    for token in &mut self.tokens {
                        if token.payload().required_slot == slot_index {
                            token.placed = false;
                        }
                    }
                }
            }
        }
    }

    fn check_answer(&mut self) {
        let placed: Vec<String> = self
            .slots
            .iter()
            .map(|slot| slot.filled().map_or_else(|| "_".to_owned(), |p| p.label))
            .collect();
        self.status = if self.slots.iter().all(DropSlot::is_filled) {
            format!("Correct: {}", placed.join(" "))
        } else {
            format!("Not yet: {}", placed.join(" "))
        };
    }

    fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.remove(&mut self.coordinator);
        }
        self.apply_events();
        self.status = "Cleared.".to_owned();
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.platform.begin_frame(ctx);

        egui::TopBottomPanel::bottom("word_puzzle_controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Check answer").clicked() {
                    self.check_answer();
                }
                if ui.button("Clear").clicked() {
                    self.clear();
                }
                ui.checkbox(&mut self.show_debug_log, "Debug log");
                ui.label(&self.status);
            });
        });

        if self.show_debug_log {
            egui::SidePanel::right("word_puzzle_debug_log").show(ctx, |ui| {
                if ui.button("Clear log").clicked() {
                    self.coordinator.debug_log_clear();
                }
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        ui.monospace(self.coordinator.debug_log_text());
                    });
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Build the sentence");
            ui.add_space(16.0);

            ui.horizontal(|ui| {
                for slot in &mut self.slots {
                    slot.ui(
                        ui,
                        &mut self.coordinator,
                        &mut self.platform,
                        egui::vec2(96.0, 48.0),
                    );
                }
            });
            self.apply_events();

            ui.add_space(48.0);
            ui.horizontal_wrapped(|ui| {
                for token in &mut self.tokens {
                    let response = token.ui(ui, &mut self.coordinator, &mut self.platform);
                    if let Some(ResolveOutcome::Rejected { reason, .. }) = response.dropped() {
                        log::debug!("{:?} returned: {reason:?}", token.payload().label);
                    }
                }
            });
            self.apply_events();
        });

        self.overlay.paint(ctx, &self.coordinator);
    }
}

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 360.0])
            .with_title("egui_wordslots demo"),
        ..Default::default()
    };

    eframe::run_native(
        "egui_wordslots demo",
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    )
}
