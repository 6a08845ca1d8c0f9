//! The link to the radio as the user sees it.
//!
//! [`controller::Session`] owns the link and applies intents and link events, [`driver`] runs it
//! as the window's background subscription, [`view`] is how it reaches the screen.

pub mod controller;
pub mod driver;
pub mod state;
pub mod view;
pub mod volume;

pub use controller::{Followup, Intent, Session};
pub use state::{LinkStatus, SessionState};
