use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use egui::{Pos2, Rect, Vec2};

use super::{
    CoordinatorOptions, DragCoordinator, DragPayload, DropHandler, DropTargetRecord,
    ResolveOutcome, StartPolicy, TargetEmphasis, TargetId, TokenId,
};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed ^ 0x5107_5107_5107_5107)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005u64)
            .wrapping_add(1442695040888963407u64);
        self.0
    }

    fn next_usize(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        ((self.next_u64() >> 33) as usize) % upper
    }

    fn next_bool(&mut self) -> bool {
        (self.next_u64() >> 63) == 1
    }

    fn next_f32(&mut self, upper: f32) -> f32 {
        (self.next_usize(10_000) as f32 / 10_000.0) * upper
    }
}

const KEYS: usize = 6;

fn key(i: usize) -> TargetId {
    TargetId::new(("model_target", i))
}

fn random_rect(rng: &mut Rng) -> Rect {
    Rect::from_min_size(
        Pos2::new(rng.next_f32(400.0), rng.next_f32(200.0)),
        Vec2::new(40.0 + rng.next_f32(80.0), 30.0 + rng.next_f32(30.0)),
    )
}

fn occupancy(coordinator: &DragCoordinator) -> BTreeMap<TargetId, bool> {
    coordinator
        .registry()
        .records()
        .map(|r| (r.id, r.occupied))
        .collect()
}

/// Checks the structural invariants that must hold between any two calls.
fn assert_coordinator_ok(
    coordinator: &DragCoordinator,
    live: &BTreeMap<TargetId, ()>,
    step: usize,
) {
    assert_eq!(
        coordinator.target_count(),
        live.len(),
        "step {step}: registry size diverged\n{}",
        coordinator.registry().summary()
    );
    for id in live.keys() {
        assert!(coordinator.registry().contains(*id), "step {step}: lost {id:?}");
    }
    if let Some(hovered) = coordinator.hovered_target_id() {
        assert!(
            coordinator.registry().contains(hovered),
            "step {step}: hovered {hovered:?} is not registered"
        );
    }
    if coordinator.session().is_none() {
        assert_eq!(coordinator.hovered_target_id(), None);
    }
}

fn churn(seed: u64, policy: StartPolicy) {
    let mut rng = Rng::new(seed);
    let mut coordinator = DragCoordinator::new_with_options(CoordinatorOptions {
        start_policy: policy,
        ..Default::default()
    });
    let drops = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&drops);
    let handler: DropHandler = Rc::new(move |_, _| counter.set(counter.get() + 1));

    let mut live: BTreeMap<TargetId, ()> = BTreeMap::new();
    let mut last_serial = 0;

    for step in 0..2_000 {
        match rng.next_usize(8) {
            0 | 1 => {
                let id = key(rng.next_usize(KEYS));
                let mut record = DropTargetRecord::new(
                    id,
                    random_rect(&mut rng),
                    rng.next_usize(4),
                    rng.next_usize(4) == 0,
                    Rc::clone(&handler),
                );
                if rng.next_bool() {
                    record = record.with_emphasis(TargetEmphasis::Central);
                }
                coordinator.register_target_with(record);
                live.insert(id, ());
            }
            2 => {
                let id = key(rng.next_usize(KEYS));
                coordinator.unregister_target(id);
                live.remove(&id);
                assert!(coordinator.target(id).is_none(), "step {step}");
            }
            3 => {
                let token = TokenId::new(("model_token", rng.next_usize(3)));
                let was_active = coordinator.is_dragging();
                let result = coordinator.start_session(
                    token,
                    DragPayload::new("w", rng.next_usize(4)),
                    Pos2::new(rng.next_f32(500.0), rng.next_f32(300.0)),
                );
                match (policy, was_active) {
                    (StartPolicy::Reject, true) => assert!(result.is_err(), "step {step}"),
                    _ => {
                        assert!(result.is_ok(), "step {step}");
                        let serial = coordinator.session().unwrap().serial();
                        assert!(serial > last_serial, "step {step}: serial went backwards");
                        last_serial = serial;
                        assert_eq!(coordinator.session().unwrap().token_id(), token);
                    }
                }
            }
            4 | 5 => {
                let before = occupancy(&coordinator);
                coordinator.update_position(Pos2::new(rng.next_f32(500.0), rng.next_f32(300.0)));
                assert_eq!(occupancy(&coordinator), before, "step {step}: hover mutated state");
                if let Some(hovered) = coordinator.hovered_target_id() {
                    assert!(!coordinator.target(hovered).unwrap().occupied, "step {step}");
                }
            }
            6 => {
                let before = occupancy(&coordinator);
                let hovered = coordinator.hovered_target_id();
                let required = coordinator.session().map(|s| s.payload().required_slot);
                let drops_before = drops.get();

                let outcome = coordinator.resolve();
                let after = occupancy(&coordinator);
                let changed: Vec<TargetId> = before
                    .iter()
                    .filter(|(id, occupied)| after.get(*id) != Some(*occupied))
                    .map(|(id, _)| *id)
                    .collect();

                assert!(!coordinator.is_dragging(), "step {step}");
                match outcome {
                    ResolveOutcome::Accepted {
                        target, slot_index, ..
                    } => {
                        assert_eq!(Some(target), hovered, "step {step}");
                        assert_eq!(Some(slot_index), required, "step {step}");
                        assert_eq!(changed, vec![target], "step {step}");
                        assert_eq!(before.get(&target), Some(&false), "step {step}");
                        assert_eq!(drops.get(), drops_before + 1, "step {step}");
                    }
                    ResolveOutcome::Rejected { .. } | ResolveOutcome::NoSession => {
                        assert!(changed.is_empty(), "step {step}: rejected drop mutated");
                        assert_eq!(drops.get(), drops_before, "step {step}");
                    }
                }
            }
            _ => {
                let before = occupancy(&coordinator);
                let was_active = coordinator.is_dragging();
                assert_eq!(coordinator.cancel(), was_active, "step {step}");
                assert_eq!(occupancy(&coordinator), before, "step {step}: cancel mutated");
            }
        }

        assert_coordinator_ok(&coordinator, &live, step);
    }
}

#[test]
fn churn_with_reject_policy() {
    for seed in 0..16 {
        churn(seed, StartPolicy::Reject);
    }
}

#[test]
fn churn_with_replace_policy() {
    for seed in 100..116 {
        churn(seed, StartPolicy::Replace);
    }
}

#[test]
fn identical_reregistration_is_idempotent() {
    let mut rng = Rng::new(7);
    let handler: DropHandler = Rc::new(|_, _| {});
    let mut coordinator = DragCoordinator::new();

    for i in 0..KEYS {
        let record = DropTargetRecord::new(
            key(i),
            random_rect(&mut rng),
            i,
            rng.next_bool(),
            handler.clone(),
        );
        coordinator.register_target_with(record.clone());
        let summary = coordinator.registry().summary();
        coordinator.register_target_with(record.clone());
        coordinator.register_target_with(record.clone());

        assert_eq!(coordinator.registry().summary(), summary);
        assert!(coordinator.target(key(i)).unwrap().same_registration(&record));
    }
    assert_eq!(coordinator.target_count(), KEYS);
}

#[test]
fn last_write_wins_per_id() {
    let handler: DropHandler = Rc::new(|_, _| {});
    let mut coordinator = DragCoordinator::new();
    let id = key(0);
    let first = Rect::from_min_size(Pos2::ZERO, Vec2::splat(50.0));
    let second = Rect::from_min_size(Pos2::new(200.0, 0.0), Vec2::splat(50.0));

    coordinator.register_target(id, first, 0, false, handler.clone());
    coordinator.register_target(id, second, 3, true, handler);
    let record = coordinator.target(id).unwrap();
    assert_eq!(record.rect, second);
    assert_eq!(record.slot_index, 3);
    assert!(record.occupied);
    assert_eq!(coordinator.target_count(), 1);

    assert!(coordinator.refresh_target_rect(id, first));
    assert_eq!(coordinator.target(id).unwrap().rect, first);
    assert!(coordinator.target(id).unwrap().occupied);
    assert!(!coordinator.refresh_target_rect(key(1), first));
}
