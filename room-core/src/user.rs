use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RoomId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wish {
    pub name: String,
    pub info_link: Option<String>,
}

/// Everything a participant fills in when creating or joining a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub delivery_info: String,
    pub want_surprise: bool,
    pub interests: Option<String>,
    pub wishes: Vec<Wish>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub room_id: RoomId,
    pub auth_code: String,
    pub is_admin: bool,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub delivery_info: String,
    pub want_surprise: bool,
    pub interests: Option<String>,
    pub wishes: Vec<Wish>,
    pub gift_recipient_user_id: Option<UserId>,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl User {
    pub fn new(
        id: UserId,
        room_id: RoomId,
        auth_code: impl Into<String>,
        is_admin: bool,
        profile: UserProfile,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            room_id,
            auth_code: auth_code.into(),
            is_admin,
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone: profile.phone,
            email: profile.email,
            delivery_info: profile.delivery_info,
            want_surprise: profile.want_surprise,
            interests: profile.interests,
            wishes: profile.wishes,
            gift_recipient_user_id: None,
            created_on: now,
            modified_on: now,
        }
    }
}
