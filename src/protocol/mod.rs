pub mod command;
pub mod notification;

pub use command::Command;
pub use notification::{Notification, Station};
