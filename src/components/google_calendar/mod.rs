//! Google Calendar writer: an actor that owns the HTTP client and token
//! cache, reached through a cloneable [`GoogleCalendarHandle`].

mod actor;
mod handle;
pub mod models;
pub mod token;

pub use actor::events_url;
pub use handle::GoogleCalendarHandle;
pub use models::EventBody;
