mod channel_sender;
mod error;
mod mailgun_email_sender;
mod twilio_sms_sender;

pub use channel_sender::*;
pub use error::*;
pub use mailgun_email_sender::*;
pub use twilio_sms_sender::*;
