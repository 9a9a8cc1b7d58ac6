mod notification;
mod ws_client_event;

pub use notification::*;
pub use ws_client_event::*;
