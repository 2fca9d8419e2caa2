//! Domain entities

mod message;
mod user;

pub use message::Message;
pub use user::{User, UserId};
