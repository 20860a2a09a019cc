pub mod booking;
pub mod customer;
pub mod salon;
pub mod service;
pub mod timeslot;

pub use booking::{Booking, BookingStatus};
pub use customer::Customer;
pub use salon::{SalonConfig, StoredSalonConfig};
pub use service::Service;
pub use timeslot::AlternativeSlot;
