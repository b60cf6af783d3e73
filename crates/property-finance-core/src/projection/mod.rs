pub mod parameters;
pub mod yearly;
