pub mod resend;

use async_trait::async_trait;

use crate::models::{AlternativeSlot, Booking, Customer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationKind {
    BookingConfirmed,
    BookingRejected,
    AlternativesProposed,
}

/// Outbound customer notifications. Fire-and-forget from the core's
/// perspective: callers log failures and never roll back a transition
/// because a notification could not be delivered.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        kind: NotificationKind,
        booking: &Booking,
        customer: &Customer,
        alternatives: &[AlternativeSlot],
    ) -> anyhow::Result<()>;
}
