pub mod actions;
mod app_state;
mod poller;
mod sessions;

pub use app_state::*;
pub use poller::*;
pub use sessions::*;
