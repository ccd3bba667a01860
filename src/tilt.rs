use crate::reveal::Rect;

/// Pointer distance from the card centre (px) per degree of rotation.
pub const TILT_DIVISOR: f64 = 15.0;
pub const HOVER_SCALE: f64 = 1.02;
pub const PERSPECTIVE_PX: f64 = 1000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tilt {
    pub rotate_x: f64,
    pub rotate_y: f64,
    pub hovered: bool,
}

impl Tilt {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn hovered(self) -> Self {
        Self {
            hovered: true,
            ..self
        }
    }

    pub fn toward(card: Rect, pointer_x: f64, pointer_y: f64) -> Self {
        let (center_x, center_y) = card.center();

        Self {
            rotate_x: -(pointer_y - center_y) / TILT_DIVISOR,
            rotate_y: (pointer_x - center_x) / TILT_DIVISOR,
            hovered: true,
        }
    }

    pub fn transform(&self) -> String {
        let scale = if self.hovered { HOVER_SCALE } else { 1.0 };
        format!(
            "perspective({PERSPECTIVE_PX}px) rotateX({:.2}deg) rotateY({:.2}deg) scale({scale})",
            self.rotate_x + 0.0,
            self.rotate_y + 0.0,
        )
    }

    // Follow the pointer quickly, settle back slowly.
    pub fn transition(&self) -> &'static str {
        if self.hovered {
            "transform 0.1s ease-out"
        } else {
            "transform 0.5s cubic-bezier(0.23, 1, 0.32, 1)"
        }
    }

    pub fn style(&self) -> String {
        format!("transform: {}; transition: {};", self.transform(), self.transition())
    }
}
