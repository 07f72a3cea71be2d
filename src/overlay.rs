use egui::{Context, Id, LayerId, Order, Rect, Vec2};

use crate::coordinator::{CoordinatorOptions, DragCoordinator};

/// Paints a proxy of the dragged word that follows the pointer.
///
/// Presentation only: it paints on a tooltip-order layer through a bare painter and never
/// allocates a response, so it cannot shadow the slots underneath.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragOverlay {
    /// Offset of the proxy's top-left corner from the pointer.
    pub offset: Vec2,
    pub padding: Vec2,
}

impl Default for DragOverlay {
    fn default() -> Self {
        Self::from_options(&CoordinatorOptions::default())
    }
}

impl DragOverlay {
    pub fn from_options(options: &CoordinatorOptions) -> Self {
        Self {
            offset: options.overlay_offset,
            padding: Vec2::new(20.0, 12.0),
        }
    }

    fn layer_id() -> LayerId {
        LayerId::new(Order::Tooltip, Id::new("egui_wordslots_drag_overlay"))
    }

    /// Where the proxy goes for a label of `label_size`, or `None` when nothing is dragged.
    pub fn proxy_rect(&self, coordinator: &DragCoordinator, label_size: Vec2) -> Option<Rect> {
        let session = coordinator.session()?;
        Some(Rect::from_min_size(
            session.pointer() + self.offset,
            label_size + 2.0 * self.padding,
        ))
    }

    /// Paints the proxy for the active session. Returns its rect, or `None` when idle.
    pub fn paint(&self, ctx: &Context, coordinator: &DragCoordinator) -> Option<Rect> {
        let session = coordinator.session()?;
        let payload = session.payload();
        let painter = ctx.layer_painter(Self::layer_id());
        let visuals = ctx.style().visuals.clone();

        let galley = painter.layout_no_wrap(
            payload.label.clone(),
            payload.font_or_default(),
            visuals.strong_text_color(),
        );
        let rect = self.proxy_rect(coordinator, galley.size())?;

        painter.rect(
            rect,
            8.0,
            visuals.widgets.active.weak_bg_fill.gamma_multiply(0.8),
            visuals.widgets.active.bg_stroke,
            egui::StrokeKind::Inside,
        );
        painter.galley(rect.min + self.padding, galley, visuals.strong_text_color());
        ctx.request_repaint();
        Some(rect)
    }
}
