use foundation::math::Vec2;

use crate::camera::RigLimits;
use crate::config::InputConfig;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// DOM-style button index: 0 primary, 1 middle, 2 secondary.
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            _ => PointerButton::Primary,
        }
    }
}

/// Snapshot taken on pointer-down, consumed on pointer-up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerGesture {
    pub start_time_ms: f64,
    pub start_position: Vec2,
    pub button: PointerButton,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GestureKind {
    Click,
    Drag,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DragAction {
    Rotate,
    Pan,
    Ignore,
}

/// Short and still means click; anything else is a drag.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GestureClassifier {
    pub max_click_ms: f64,
    pub max_click_px: f64,
}

impl GestureClassifier {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            max_click_ms: config.click_max_ms,
            max_click_px: config.click_max_px,
        }
    }

    pub fn classify(&self, gesture: &PointerGesture, end_time_ms: f64, end_position: Vec2) -> GestureKind {
        let elapsed = end_time_ms - gesture.start_time_ms;
        let moved = gesture.start_position.distance(end_position);
        if elapsed < self.max_click_ms && moved < self.max_click_px {
            GestureKind::Click
        } else {
            GestureKind::Drag
        }
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(&InputConfig::default())
    }
}

/// What a held-button drag does to the camera under `limits`.
pub fn drag_action(button: PointerButton, limits: &RigLimits) -> DragAction {
    match button {
        PointerButton::Secondary | PointerButton::Middle if limits.enable_pan => DragAction::Pan,
        PointerButton::Primary if limits.enable_rotate => DragAction::Rotate,
        PointerButton::Primary if limits.enable_pan => DragAction::Pan,
        _ => DragAction::Ignore,
    }
}

/// Pointer tracking between down and up.
#[derive(Debug, Default, Clone)]
pub struct PointerState {
    gesture: Option<PointerGesture>,
    last_position: Option<Vec2>,
}

impl PointerState {
    /// Starts a gesture, replacing any unfinished one.
    pub fn down(&mut self, position: Vec2, time_ms: f64, button: PointerButton) {
        self.gesture = Some(PointerGesture {
            start_time_ms: time_ms,
            start_position: position,
            button,
        });
        self.last_position = Some(position);
    }

    /// Movement since the last event while a button is held.
    pub fn moved(&mut self, position: Vec2) -> Option<(Vec2, PointerButton)> {
        let gesture = self.gesture?;
        let last = self.last_position.replace(position)?;
        Some((position - last, gesture.button))
    }

    pub fn up(&mut self) -> Option<PointerGesture> {
        self.last_position = None;
        self.gesture.take()
    }

    pub fn reset(&mut self) {
        self.gesture = None;
        self.last_position = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DragAction, GestureClassifier, GestureKind, PointerButton, PointerGesture, PointerState,
        drag_action,
    };
    use crate::camera::RigLimits;
    use foundation::math::Vec2;
    use foundation::math::projection::ProjectionMode;

    fn gesture_at(x: f64, y: f64, t: f64) -> PointerGesture {
        PointerGesture {
            start_time_ms: t,
            start_position: Vec2::new(x, y),
            button: PointerButton::Primary,
        }
    }

    #[test]
    fn quick_still_release_is_click() {
        let c = GestureClassifier::default();
        let g = gesture_at(100.0, 100.0, 0.0);
        assert_eq!(c.classify(&g, 120.0, Vec2::new(102.0, 101.0)), GestureKind::Click);
    }

    #[test]
    fn movement_or_time_makes_drag() {
        let c = GestureClassifier::default();
        let g = gesture_at(100.0, 100.0, 0.0);
        assert_eq!(c.classify(&g, 100.0, Vec2::new(105.0, 100.0)), GestureKind::Drag);
        assert_eq!(c.classify(&g, 250.0, Vec2::new(100.0, 100.0)), GestureKind::Drag);
        assert_eq!(c.classify(&g, 249.0, Vec2::new(104.9, 100.0)), GestureKind::Click);
    }

    #[test]
    fn drag_actions_follow_mode_limits() {
        let globe = RigLimits::for_mode(ProjectionMode::Globe);
        let map = RigLimits::for_mode(ProjectionMode::Map);
        assert_eq!(drag_action(PointerButton::Primary, &globe), DragAction::Rotate);
        assert_eq!(drag_action(PointerButton::Secondary, &globe), DragAction::Ignore);
        assert_eq!(drag_action(PointerButton::Primary, &map), DragAction::Pan);
        assert_eq!(drag_action(PointerButton::Secondary, &map), DragAction::Pan);
    }

    #[test]
    fn pointer_state_tracks_deltas() {
        let mut p = PointerState::default();
        assert!(p.moved(Vec2::new(1.0, 1.0)).is_none());
        p.down(Vec2::new(10.0, 10.0), 0.0, PointerButton::Secondary);
        let (d, b) = p.moved(Vec2::new(13.0, 6.0)).unwrap();
        assert_eq!(d, Vec2::new(3.0, -4.0));
        assert_eq!(b, PointerButton::Secondary);
        let (d, _) = p.moved(Vec2::new(14.0, 6.0)).unwrap();
        assert_eq!(d, Vec2::new(1.0, 0.0));
        let g = p.up().unwrap();
        assert_eq!(g.start_position, Vec2::new(10.0, 10.0));
        assert!(p.up().is_none());
        assert!(p.moved(Vec2::new(20.0, 6.0)).is_none());
    }

    #[test]
    fn new_down_overwrites_gesture() {
        let mut p = PointerState::default();
        p.down(Vec2::new(0.0, 0.0), 0.0, PointerButton::Primary);
        p.down(Vec2::new(5.0, 5.0), 40.0, PointerButton::Primary);
        assert_eq!(p.up().unwrap().start_time_ms, 40.0);
    }
}
