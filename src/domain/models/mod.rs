mod action;
mod backend;
mod error;
mod event;
mod job;
mod message;
mod poll_state;
mod session;
mod slash_commands;
mod submission;
mod timestamp;

pub use action::*;
pub use backend::*;
pub use error::*;
pub use event::*;
pub use job::*;
pub use message::*;
pub use poll_state::*;
pub use session::*;
pub use slash_commands::*;
pub use submission::*;
