//! Pointer gesture tracking for mouse and touch.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;

/// Where a pointer event came from. Touch start, move and end are treated
/// the same as their mouse counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointerSource {
    #[default]
    Mouse,
    Touch,
}

/// Pointer event in stage coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, source: PointerSource },
    Move { position: Point, source: PointerSource },
    Up { position: Point, source: PointerSource },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. } => position,
        }
    }
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn action_mod(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// How a press ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Pointer came up without a press (e.g. the press landed outside the stage).
    Stray,
    Click,
    /// Second click within the double-click window.
    DoubleClick,
    /// The pointer travelled past the drag threshold.
    DragEnd,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    start: Point,
    dragging: bool,
}

/// Turns raw pointer events into clicks, double-clicks and drags.
#[derive(Debug, Clone)]
pub struct InputState {
    pub pointer_position: Point,
    pub modifiers: Modifiers,
    drag_threshold: f64,
    double_click: Duration,
    press: Option<Press>,
    last_click: Option<(Instant, Point)>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(3.0, Duration::from_millis(400))
    }
}

impl InputState {
    /// Max distance between the two clicks of a double-click.
    const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

    pub fn new(drag_threshold: f64, double_click: Duration) -> Self {
        Self {
            pointer_position: Point::ZERO,
            modifiers: Modifiers::default(),
            drag_threshold,
            double_click,
            press: None,
            last_click: None,
        }
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.press.is_some_and(|press| press.dragging)
    }

    pub fn press(&mut self, position: Point) {
        self.pointer_position = position;
        self.press = Some(Press {
            start: position,
            dragging: false,
        });
    }

    /// Track movement. Returns true while the current press is a drag.
    pub fn move_to(&mut self, position: Point) -> bool {
        self.pointer_position = position;
        let threshold = self.drag_threshold;
        match &mut self.press {
            Some(press) => {
                if !press.dragging && (position - press.start).hypot() > threshold {
                    press.dragging = true;
                }
                press.dragging
            }
            None => false,
        }
    }

    pub fn release(&mut self, position: Point, now: Instant) -> Release {
        self.pointer_position = position;
        let Some(press) = self.press.take() else {
            return Release::Stray;
        };
        if press.dragging {
            self.last_click = None;
            return Release::DragEnd;
        }

        let is_double = self.last_click.is_some_and(|(time, pos)| {
            now.saturating_duration_since(time) <= self.double_click
                && (position - pos).hypot() < Self::DOUBLE_CLICK_DISTANCE
        });
        if is_double {
            // Reset so a third click starts a new pair
            self.last_click = None;
            Release::DoubleClick
        } else {
            self.last_click = Some((now, position));
            Release::Click
        }
    }

    /// Drop the current press without producing a gesture.
    pub fn cancel(&mut self) {
        self.press = None;
    }

    pub fn drag_delta(&self) -> Option<Vec2> {
        self.press.map(|press| self.pointer_position - press.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(input: &mut InputState, position: Point, now: Instant) -> Release {
        input.press(position);
        input.release(position, now)
    }

    #[test]
    fn test_click() {
        let mut input = InputState::default();
        assert_eq!(click(&mut input, Point::new(10.0, 10.0), Instant::now()), Release::Click);
        assert!(!input.is_pressed());
    }

    #[test]
    fn test_drag_past_threshold() {
        let mut input = InputState::default();
        input.press(Point::new(100.0, 100.0));
        assert!(!input.move_to(Point::new(101.0, 101.0)));
        assert!(input.move_to(Point::new(150.0, 120.0)));

        let delta = input.drag_delta().unwrap();
        assert!((delta.x - 50.0).abs() < f64::EPSILON);
        assert!((delta.y - 20.0).abs() < f64::EPSILON);

        assert_eq!(input.release(Point::new(150.0, 120.0), Instant::now()), Release::DragEnd);
        assert!(!input.is_dragging());
    }

    #[test]
    fn test_double_click_detection() {
        let mut input = InputState::default();
        let pos = Point::new(100.0, 100.0);
        let start = Instant::now();
        assert_eq!(click(&mut input, pos, start), Release::Click);
        assert_eq!(
            click(&mut input, pos, start + Duration::from_millis(100)),
            Release::DoubleClick
        );
        // Third click starts over
        assert_eq!(
            click(&mut input, pos, start + Duration::from_millis(200)),
            Release::Click
        );
    }

    #[test]
    fn test_double_click_too_slow() {
        let mut input = InputState::default();
        let pos = Point::new(100.0, 100.0);
        let start = Instant::now();
        click(&mut input, pos, start);
        assert_eq!(
            click(&mut input, pos, start + Duration::from_millis(900)),
            Release::Click
        );
    }

    #[test]
    fn test_double_click_too_far() {
        let mut input = InputState::default();
        let start = Instant::now();
        click(&mut input, Point::new(100.0, 100.0), start);
        assert_eq!(
            click(&mut input, Point::new(200.0, 200.0), start + Duration::from_millis(50)),
            Release::Click
        );
    }

    #[test]
    fn test_stray_release() {
        let mut input = InputState::default();
        assert_eq!(input.release(Point::ZERO, Instant::now()), Release::Stray);
        assert!(!input.move_to(Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_action_modifier() {
        let cmd = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert!(cmd.action_mod());
        assert!(!Modifiers::NONE.action_mod());
    }
}
