pub mod application;
pub mod knob;
pub mod style;
pub mod types;
