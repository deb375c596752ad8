pub mod availability;
pub mod booking;
pub mod notifier;

pub use availability::AvailabilityService;
pub use booking::BookingCoordinator;
pub use notifier::{BookingNotifier, LogNotifier, WebhookNotifier};
