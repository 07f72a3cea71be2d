use std::rc::Rc;

use egui::Rect;
use itertools::Itertools as _;

use super::session::DragPayload;

/// Called once per accepted drop with `(payload, slot_index)`.
pub type DropHandler = Rc<dyn Fn(&DragPayload, usize)>;

/// Identity of a drop target (one slot).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(pub egui::Id);

impl TargetId {
    pub fn new(source: impl std::hash::Hash) -> Self {
        Self(egui::Id::new(source))
    }

    pub fn value(self) -> u64 {
        self.0.value()
    }
}

impl From<egui::Id> for TargetId {
    fn from(id: egui::Id) -> Self {
        Self(id)
    }
}

impl PartialOrd for TargetId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TargetId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value().cmp(&other.value())
    }
}

/// How forgiving hit-testing is for a target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TargetEmphasis {
    #[default]
    Normal,

    /// The middle slot of a row: larger margin and a slight score preference.
    Central,
}

/// One registered drop target.
#[derive(Clone)]
pub struct DropTargetRecord {
    pub id: TargetId,

    /// Last known bounding box.
    pub rect: Rect,
    pub slot_index: usize,
    pub occupied: bool,
    pub emphasis: TargetEmphasis,
    pub on_drop: DropHandler,
}

impl DropTargetRecord {
    pub fn new(
        id: TargetId,
        rect: Rect,
        slot_index: usize,
        occupied: bool,
        on_drop: DropHandler,
    ) -> Self {
        Self {
            id,
            rect,
            slot_index,
            occupied,
            emphasis: TargetEmphasis::Normal,
            on_drop,
        }
    }

    pub fn with_emphasis(mut self, emphasis: TargetEmphasis) -> Self {
        self.emphasis = emphasis;
        self
    }

    /// Field-wise equality, with handlers compared by identity.
    pub fn same_registration(&self, other: &Self) -> bool {
        self.id == other.id
            && self.rect == other.rect
            && self.slot_index == other.slot_index
            && self.occupied == other.occupied
            && self.emphasis == other.emphasis
            && Rc::ptr_eq(&self.on_drop, &other.on_drop)
    }
}

impl std::fmt::Debug for DropTargetRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropTargetRecord")
            .field("id", &self.id)
            .field("rect", &self.rect)
            .field("slot_index", &self.slot_index)
            .field("occupied", &self.occupied)
            .field("emphasis", &self.emphasis)
            .finish_non_exhaustive()
    }
}

/// The coordinator's live directory of drop targets. Keys are unique; order carries no meaning.
#[derive(Default)]
pub struct TargetRegistry {
    targets: ahash::HashMap<TargetId, DropTargetRecord>,
}

impl TargetRegistry {
    /// Insert or replace. Returns the previous record for this id.
    pub(super) fn upsert(&mut self, record: DropTargetRecord) -> Option<DropTargetRecord> {
        self.targets.insert(record.id, record)
    }

    pub(super) fn remove(&mut self, id: TargetId) -> Option<DropTargetRecord> {
        self.targets.remove(&id)
    }

    pub(super) fn set_occupied(&mut self, id: TargetId, occupied: bool) -> bool {
        match self.targets.get_mut(&id) {
            Some(record) => {
                record.occupied = occupied;
                true
            }
            None => false,
        }
    }

    pub(super) fn set_rect(&mut self, id: TargetId, rect: Rect) -> bool {
        match self.targets.get_mut(&id) {
            Some(record) => {
                record.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: TargetId) -> Option<&DropTargetRecord> {
        self.targets.get(&id)
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.targets.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// All records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &DropTargetRecord> {
        self.targets.values()
    }

    /// One line per target, sorted by slot index, for debug logs.
    pub fn summary(&self) -> String {
        self.targets
            .values()
            .sorted_by_key(|r| (r.slot_index, r.id))
            .map(|r| {
                format!(
                    "slot={} id={:?} occupied={} emphasis={:?} rect=[{:.0},{:.0} {:.0}x{:.0}]",
                    r.slot_index,
                    r.id.0,
                    r.occupied,
                    r.emphasis,
                    r.rect.min.x,
                    r.rect.min.y,
                    r.rect.width(),
                    r.rect.height(),
                )
            })
            .join("\n")
    }
}

impl std::fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetRegistry")
            .field("len", &self.targets.len())
            .finish_non_exhaustive()
    }
}
