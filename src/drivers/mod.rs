//! Actuator and input drivers plus the indicator fade engine.

pub mod fade;
pub mod indicator;
pub mod inputs;
pub mod light_strip;
pub mod valve;
