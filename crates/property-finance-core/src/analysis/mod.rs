pub mod comparison;
pub mod metrics;
pub mod sell_vs_hold;
pub mod sensitivity;
pub mod summary;
