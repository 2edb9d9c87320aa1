//! Window geometry: stored bounds, reset policy and anchor placement.

use serde::{Deserialize, Serialize};

use crate::config::{Anchor, ResetPolicy, Settings};

/// Gap between an anchored window and the work-area edge, in pixels.
pub const WINDOW_MARGIN: i32 = 10;

/// Work area assumed when no display information is available.
pub const FALLBACK_WORK_AREA: Rect = Rect {
    x: 0,
    y: 0,
    width: 1280,
    height: 800,
};

/// Physical-pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Persisted bounds. The position is optional: a reset of the position, or
/// a record written by an older build, leaves it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
}

impl StoredBounds {
    pub fn size_only(width: u32, height: u32) -> Self {
        Self {
            x: None,
            y: None,
            width,
            height,
        }
    }

    pub fn without_position(self) -> Self {
        Self::size_only(self.width, self.height)
    }
}

impl From<Rect> for StoredBounds {
    fn from(rect: Rect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: rect.width,
            height: rect.height,
        }
    }
}

/// Place a window of the given size against `work_area` at `anchor`.
///
/// Axes centered by the anchor ignore the margin.
pub fn anchored_position(anchor: Anchor, width: u32, height: u32, work_area: Rect) -> (i32, i32) {
    enum Edge {
        Start,
        Middle,
        End,
    }

    let (horizontal, vertical) = match anchor {
        Anchor::TopLeft => (Edge::Start, Edge::Start),
        Anchor::Top => (Edge::Middle, Edge::Start),
        Anchor::TopRight => (Edge::End, Edge::Start),
        Anchor::Left => (Edge::Start, Edge::Middle),
        Anchor::Center => (Edge::Middle, Edge::Middle),
        Anchor::Right => (Edge::End, Edge::Middle),
        Anchor::BottomLeft => (Edge::Start, Edge::End),
        Anchor::Bottom => (Edge::Middle, Edge::End),
        Anchor::BottomRight => (Edge::End, Edge::End),
    };

    let place = |edge: Edge, origin: i32, available: u32, size: u32| -> i32 {
        let free = available as i32 - size as i32;
        match edge {
            Edge::Start => origin + WINDOW_MARGIN,
            Edge::Middle => origin + free / 2,
            Edge::End => origin + free - WINDOW_MARGIN,
        }
    };

    (
        place(horizontal, work_area.x, work_area.width, width),
        place(vertical, work_area.y, work_area.height, height),
    )
}

/// Inputs needed to decide a page window's bounds.
pub struct BoundsRequest<'a> {
    pub settings: &'a Settings,
    /// Bounds already stored for this page (or the shared record).
    pub stored: Option<StoredBounds>,
    /// Whether this page has had bounds applied during this session.
    pub applied_this_session: bool,
    /// Whether the one-shot shared-bounds reset was already used.
    pub shared_reset_consumed: bool,
    pub work_area: Rect,
}

/// Result of [`resolve_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBounds {
    pub rect: Rect,
    /// True when a shared-bounds reset was applied and must now be marked consumed.
    pub consumed_shared_reset: bool,
}

/// Decide the bounds a page window should receive.
pub fn resolve_bounds(req: &BoundsRequest<'_>) -> ResolvedBounds {
    let settings = req.settings;
    let defaults = StoredBounds::size_only(settings.default_width, settings.default_height);

    let reset_applies = !req.applied_this_session
        && settings.reset_bounds != ResetPolicy::None
        && !(settings.shared_bounds && req.shared_reset_consumed);

    let chosen = if reset_applies {
        match settings.reset_bounds {
            ResetPolicy::Bounds => defaults,
            _ => req.stored.unwrap_or(defaults).without_position(),
        }
    } else {
        req.stored.unwrap_or(defaults)
    };

    let rect = match (chosen.x, chosen.y) {
        (Some(x), Some(y)) => Rect {
            x,
            y,
            width: chosen.width,
            height: chosen.height,
        },
        _ => {
            let (x, y) = anchored_position(
                settings.default_position,
                chosen.width,
                chosen.height,
                req.work_area,
            );
            Rect {
                x,
                y,
                width: chosen.width,
                height: chosen.height,
            }
        },
    };

    ResolvedBounds {
        rect,
        consumed_shared_reset: reset_applies && settings.shared_bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORK: Rect = Rect {
        x: 0,
        y: 0,
        width: 1920,
        height: 1040,
    };

    fn settings(reset: ResetPolicy, shared: bool) -> Settings {
        Settings {
            reset_bounds: reset,
            shared_bounds: shared,
            ..Settings::default()
        }
    }

    #[test]
    fn test_center_anchor_is_exact_half() {
        for _ in 0..3 {
            let (x, y) = anchored_position(Anchor::Center, 400, 200, WORK);
            assert_eq!(x, (1920 - 400) / 2);
            assert_eq!(y, (1040 - 200) / 2);
        }
    }

    #[test]
    fn test_center_respects_work_area_origin() {
        let work = Rect {
            x: 1920,
            y: 40,
            width: 1000,
            height: 600,
        };
        assert_eq!(anchored_position(Anchor::Center, 200, 100, work), (2320, 290));
    }

    #[test]
    fn test_corner_anchors_apply_margin() {
        assert_eq!(anchored_position(Anchor::TopLeft, 400, 300, WORK), (10, 10));
        assert_eq!(
            anchored_position(Anchor::BottomRight, 400, 300, WORK),
            (1920 - 400 - 10, 1040 - 300 - 10)
        );
        // Centered axis ignores margin, edge axis keeps it
        assert_eq!(anchored_position(Anchor::Top, 400, 300, WORK), (760, 10));
        assert_eq!(anchored_position(Anchor::Right, 400, 300, WORK), (1510, 370));
    }

    #[test]
    fn test_stored_bounds_used_without_reset() {
        let s = settings(ResetPolicy::None, false);
        let stored = StoredBounds {
            x: Some(5),
            y: Some(6),
            width: 300,
            height: 400,
        };
        let resolved = resolve_bounds(&BoundsRequest {
            settings: &s,
            stored: Some(stored),
            applied_this_session: false,
            shared_reset_consumed: false,
            work_area: WORK,
        });
        assert_eq!(resolved.rect, Rect { x: 5, y: 6, width: 300, height: 400 });
        assert!(!resolved.consumed_shared_reset);
    }

    #[test]
    fn test_position_reset_keeps_size() {
        let s = settings(ResetPolicy::Position, false);
        let stored = StoredBounds {
            x: Some(5),
            y: Some(6),
            width: 300,
            height: 400,
        };
        let resolved = resolve_bounds(&BoundsRequest {
            settings: &s,
            stored: Some(stored),
            applied_this_session: false,
            shared_reset_consumed: false,
            work_area: WORK,
        });
        assert_eq!(resolved.rect.width, 300);
        assert_eq!(resolved.rect.height, 400);
        assert_eq!((resolved.rect.x, resolved.rect.y), (1920 - 300 - 10, 10));
    }

    #[test]
    fn test_bounds_reset_uses_defaults() {
        let s = settings(ResetPolicy::Bounds, false);
        let stored = StoredBounds {
            x: Some(5),
            y: Some(6),
            width: 300,
            height: 400,
        };
        let resolved = resolve_bounds(&BoundsRequest {
            settings: &s,
            stored: Some(stored),
            applied_this_session: false,
            shared_reset_consumed: false,
            work_area: WORK,
        });
        assert_eq!(resolved.rect.width, s.default_width);
        assert_eq!(resolved.rect.height, s.default_height);
    }

    #[test]
    fn test_reset_skipped_once_applied() {
        let s = settings(ResetPolicy::Bounds, false);
        let stored = StoredBounds {
            x: Some(5),
            y: Some(6),
            width: 300,
            height: 400,
        };
        let resolved = resolve_bounds(&BoundsRequest {
            settings: &s,
            stored: Some(stored),
            applied_this_session: true,
            shared_reset_consumed: false,
            work_area: WORK,
        });
        assert_eq!(resolved.rect.x, 5);
    }

    #[test]
    fn test_shared_reset_is_one_shot() {
        let s = settings(ResetPolicy::Bounds, true);
        let stored = StoredBounds {
            x: Some(5),
            y: Some(6),
            width: 300,
            height: 400,
        };
        let first = resolve_bounds(&BoundsRequest {
            settings: &s,
            stored: Some(stored),
            applied_this_session: false,
            shared_reset_consumed: false,
            work_area: WORK,
        });
        assert!(first.consumed_shared_reset);
        assert_eq!(first.rect.width, s.default_width);

        let second = resolve_bounds(&BoundsRequest {
            settings: &s,
            stored: Some(stored),
            applied_this_session: false,
            shared_reset_consumed: true,
            work_area: WORK,
        });
        assert!(!second.consumed_shared_reset);
        assert_eq!(second.rect, Rect { x: 5, y: 6, width: 300, height: 400 });
    }

    #[test]
    fn test_missing_position_uses_anchor() {
        let s = Settings {
            default_position: Anchor::Center,
            ..Settings::default()
        };
        let resolved = resolve_bounds(&BoundsRequest {
            settings: &s,
            stored: Some(StoredBounds::size_only(400, 200)),
            applied_this_session: true,
            shared_reset_consumed: false,
            work_area: WORK,
        });
        assert_eq!((resolved.rect.x, resolved.rect.y), (760, 420));
    }
}
