use egui::Rect;

use super::{CaptureError, ElementId, PlatformAdapter, PointerId};

/// A scriptable [`PlatformAdapter`] with no UI behind it.
///
/// Hosts use it to drive tokens and slots from unit tests: set element rects by hand,
/// and optionally make capture fail to exercise the document-level fallback.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    rects: ahash::HashMap<ElementId, Rect>,
    captures: Vec<(ElementId, PointerId)>,

    /// When set, every [`PlatformAdapter::acquire_capture`] fails with this reason.
    pub fail_capture: Option<String>,

    /// Number of successful capture releases, for assertions.
    pub releases: usize,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capture_failure(reason: impl Into<String>) -> Self {
        Self {
            fail_capture: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn set_rect(&mut self, element: ElementId, rect: Rect) {
        self.rects.insert(element, rect);
    }

    pub fn remove_rect(&mut self, element: ElementId) {
        self.rects.remove(&element);
    }

    /// Number of captures currently held.
    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }

    /// Simulates the platform dropping a capture on its own (e.g. the element was re-created).
    pub fn revoke_capture(&mut self, element: ElementId, pointer: PointerId) {
        self.captures.retain(|&c| c != (element, pointer));
    }
}

impl PlatformAdapter for HeadlessPlatform {
    fn acquire_capture(
        &mut self,
        element: ElementId,
        pointer: PointerId,
    ) -> Result<(), CaptureError> {
        if let Some(reason) = &self.fail_capture {
            return Err(CaptureError::Rejected(reason.clone()));
        }
        // One capture per pointer.
        self.captures.retain(|&(_, p)| p != pointer);
        self.captures.push((element, pointer));
        Ok(())
    }

    fn release_capture(
        &mut self,
        element: ElementId,
        pointer: PointerId,
    ) -> Result<(), CaptureError> {
        let before = self.captures.len();
        self.captures.retain(|&c| c != (element, pointer));
        if self.captures.len() == before {
            return Err(CaptureError::NotHeld { element, pointer });
        }
        self.releases += 1;
        Ok(())
    }

    fn has_capture(&self, element: ElementId, pointer: PointerId) -> bool {
        self.captures.contains(&(element, pointer))
    }

    fn element_rect(&self, element: ElementId) -> Option<Rect> {
        self.rects.get(&element).copied()
    }
}
