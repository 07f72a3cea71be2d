use std::collections::VecDeque;

/// Bounded ring buffer of human-readable engine events, for on-screen debug panels and bug reports.
#[derive(Debug, Default)]
pub(super) struct DebugEventLog {
    lines: VecDeque<String>,
    sequence: u64,
}

impl DebugEventLog {
    pub(super) fn push(&mut self, capacity: usize, message: String) {
        let cap = capacity.clamp(1, 10_000);
        while self.lines.len() >= cap {
            self.lines.pop_front();
        }
        self.sequence = self.sequence.wrapping_add(1);
        self.lines.push_back(format!("[{}] {}", self.sequence, message));
    }

    pub(super) fn clear(&mut self) {
        self.lines.clear();
    }

    pub(super) fn text(&self) -> String {
        self.lines
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }
}
