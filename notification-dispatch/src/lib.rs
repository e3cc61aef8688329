/// Caseline Notification Dispatch
///
/// Translates case-thread domain events into push notification requests and
/// hands them to the shared FCM client. The surrounding web layer calls
/// `NotificationDispatcher::notify` (or the detached variant) after its own
/// write has committed; delivery is attempted at most once per event, and
/// retry policy stays with the job system that owns the event.
pub mod adapter;
pub mod dispatcher;
pub mod events;

pub use adapter::{notification_for_message, BROADCAST_TOPIC};
pub use dispatcher::NotificationDispatcher;
pub use events::{MessageCreated, MessageType};
