//! Domain model for a Secret Santa room: participants, exchange details and
//! the draw that hands every participant a gift recipient.

pub mod draw;
pub mod error;
pub mod room;
pub mod user;

pub type RoomId = u64;
pub type UserId = u64;

pub use draw::derangement;
pub use error::{RoomError, RoomResult, ValidationFailure};
pub use room::{Room, RoomDetails, UsersLimits};
pub use user::{User, UserProfile, Wish};
