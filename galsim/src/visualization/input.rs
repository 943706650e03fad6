//! Input state the viewer keeps between frames

use crate::simulation::states::NVec2;

/// Turns a held mouse button into a single spawn request per press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnTrigger {
    released: bool,
}

impl Default for SpawnTrigger {
    fn default() -> Self {
        Self { released: true }
    }
}

impl SpawnTrigger {
    /// Feed the button state for this frame. True only on the frame the
    /// button goes down after having been up.
    pub fn poll(&mut self, pressed: bool) -> bool {
        let fire = pressed && self.released;
        self.released = !pressed;
        fire
    }
}

/// Pixel offset between simulation coordinates and the screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOffset {
    pub x: i32,
    pub y: i32,
}

impl ViewOffset {
    /// Simulation point under screen position (`sx`, `sy`)
    pub fn to_world(&self, sx: f64, sy: f64) -> NVec2 {
        NVec2::new(sx - self.x as f64, sy - self.y as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holding_the_button_spawns_once() {
        let mut trigger = SpawnTrigger::default();
        let fired: Vec<bool> = [true, true, true, false, true, false, false]
            .into_iter()
            .map(|pressed| trigger.poll(pressed))
            .collect();
        assert_eq!(fired, vec![true, false, false, false, true, false, false]);
    }

    #[test]
    fn spawn_point_is_translated_by_offset() {
        let offset = ViewOffset { x: 10, y: -4 };
        assert_eq!(offset.to_world(100.0, 50.0), NVec2::new(90.0, 54.0));
    }
}
