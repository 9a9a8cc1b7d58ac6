mod notification;
mod notification_created;
mod ws_server_event;

pub use notification::*;
pub use notification_created::*;
pub use ws_server_event::*;
