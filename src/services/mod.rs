pub mod admission;
pub mod availability;
pub mod lifecycle;
pub mod notify;
