pub mod appreciation;
pub mod rental;
