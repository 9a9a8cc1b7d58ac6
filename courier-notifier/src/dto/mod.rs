//!
//! Dtos passed between the server, the queue and connected clients
//!

pub mod input;
pub mod output;

mod notification_message;
mod notification_status;
mod notification_type;

pub use notification_message::*;
pub use notification_status::*;
pub use notification_type::*;
