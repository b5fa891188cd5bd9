//! Scroll-axis strategy: the few operations that depend on which way content
//! moves. The controller is generic over this instead of being subclassed.

/// Which way the content moved since the last notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Content moves toward the leading edge; later entries appear at the tail.
    Forward,
    /// Content moves toward the trailing edge; earlier entries reappear at the head.
    Backward,
}

pub trait Axis {
    /// Convert a host-reported content position into a scroll offset.
    fn position_from_offset(&self, raw: f64) -> f64;

    /// Compare the previous and new offsets.
    fn direction(&self, previous: f64, current: f64) -> ScrollDirection;

    /// Clamp an offset into the valid scroll range `[0, +inf)`.
    fn clamp(&self, offset: f64) -> f64;
}

/// Top-to-bottom scrolling. Offsets grow as the user scrolls down.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertical;

impl Axis for Vertical {
    fn position_from_offset(&self, raw: f64) -> f64 {
        raw
    }

    fn direction(&self, previous: f64, current: f64) -> ScrollDirection {
        if previous <= current {
            ScrollDirection::Forward
        } else {
            ScrollDirection::Backward
        }
    }

    fn clamp(&self, offset: f64) -> f64 {
        if offset.is_nan() {
            return 0.0;
        }
        offset.clamp(0.0, f64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_forward_on_equal() {
        assert_eq!(Vertical.direction(5.0, 5.0), ScrollDirection::Forward);
        assert_eq!(Vertical.direction(5.0, 6.0), ScrollDirection::Forward);
        assert_eq!(Vertical.direction(5.0, 4.0), ScrollDirection::Backward);
    }

    #[test]
    fn clamp_rejects_negative_and_nan() {
        assert_eq!(Vertical.clamp(-3.0), 0.0);
        assert_eq!(Vertical.clamp(f64::NAN), 0.0);
        assert_eq!(Vertical.clamp(f64::INFINITY), f64::MAX);
        assert_eq!(Vertical.clamp(12.5), 12.5);
    }
}
