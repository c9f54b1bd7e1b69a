pub mod api;
pub mod channel;
pub mod events;
pub mod models;
pub mod signal;

pub use channel::{channel_key, default_channel};
