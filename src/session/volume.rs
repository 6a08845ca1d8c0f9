use crate::protocol::Command;

/// Turns a pointer dragged around the volume knob into VOL_UP / VOL_DN commands.
///
/// The angle around the knob's center is quantized into steps of `step_degrees`. The radio has no
/// absolute volume we could set, so only the difference between the current and the previous
/// step is sent: one command per step boundary crossed.
#[derive(Debug, Clone)]
pub struct VolumeKnob {
    step_degrees: f32,
    last_step: i32,
    angle: f32,
}

impl VolumeKnob {
    pub fn new(step_degrees: u16) -> Self {
        VolumeKnob {
            step_degrees: f32::from(step_degrees.max(1)),
            last_step: 0,
            angle: 0.0,
        }
    }

    /// Current rotation in degrees, [0, 360).
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// `dx` and `dy` are the pointer position relative to the knob's center, with y growing
    /// downwards (screen coordinates), so turning clockwise increases the angle.
    pub fn sample(&mut self, dx: f32, dy: f32) -> Vec<Command> {
        let angle = dy.atan2(dx).to_degrees().rem_euclid(360.0);
        self.angle = angle;

        let step = (angle / self.step_degrees).floor() as i32;
        if step == self.last_step {
            return Vec::new();
        }

        let command = if step > self.last_step { Command::VolumeUp } else { Command::VolumeDown };
        let crossed = (step - self.last_step).unsigned_abs() as usize;
        self.last_step = step;

        vec![command; crossed]
    }
}
