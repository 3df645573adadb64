pub mod burnout;
pub mod gate;
