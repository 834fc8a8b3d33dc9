//! Foundation utilities shared by all managers

pub mod math;
pub mod time;
