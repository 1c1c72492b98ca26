pub mod command;
pub mod dtos;
pub mod format;
pub mod handlers;
pub mod reminders;

pub use command::{CommandError, CommandOutput, CommandRunner, ProcessRunner};
pub use format::{emoji_for, format_amount, reminder_title};
pub use reminders::Reminders;
