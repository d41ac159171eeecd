//! Request and response bodies. JSON is camelCase to match the web client.

use chrono::{DateTime, NaiveDate, Utc};
use room_core::{Room, RoomDetails, RoomId, User, UserId, UserProfile, Wish};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserCodeQuery {
    #[validate(length(min = 1, message = "User code is required."))]
    pub user_code: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomCodeQuery {
    #[validate(length(min = 1, message = "Room code is required."))]
    pub room_code: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DrawParams {
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WishDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(url)]
    pub info_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_preferences"))]
pub struct UserCreate {
    #[validate(length(min = 1, max = 40))]
    pub first_name: String,
    #[validate(length(min = 1, max = 40))]
    pub last_name: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub delivery_info: String,
    pub want_surprise: bool,
    #[validate(length(max = 1000))]
    pub interests: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5), nested)]
    pub wishes: Vec<WishDto>,
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or("");
    let valid = (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("phone")
            .with_message("Phone must be '+' followed by 10 to 15 digits.".into()))
    }
}

/// A participant either wants a surprise (and lists interests) or lists wishes.
fn validate_preferences(user: &UserCreate) -> Result<(), ValidationError> {
    if user.want_surprise {
        let has_interests = user
            .interests
            .as_deref()
            .is_some_and(|i| !i.trim().is_empty());
        if !has_interests {
            return Err(ValidationError::new("interests_required")
                .with_message("Interests are required when a surprise is wanted.".into()));
        }
    } else if user.wishes.is_empty() {
        return Err(ValidationError::new("wishes_required")
            .with_message("At least one wish is required when no surprise is wanted.".into()));
    }
    Ok(())
}

impl From<UserCreate> for UserProfile {
    fn from(dto: UserCreate) -> Self {
        UserProfile {
            first_name: dto.first_name.trim().to_string(),
            last_name: dto.last_name.trim().to_string(),
            phone: dto.phone,
            email: dto.email,
            delivery_info: dto.delivery_info,
            want_surprise: dto.want_surprise,
            interests: if dto.want_surprise { dto.interests } else { None },
            wishes: if dto.want_surprise {
                Vec::new()
            } else {
                dto.wishes
                    .into_iter()
                    .map(|w| Wish {
                        name: w.name,
                        info_link: w.info_link,
                    })
                    .collect()
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreate {
    #[validate(length(min = 1, max = 40))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub description: String,
    pub gift_exchange_date: NaiveDate,
    #[validate(range(max = 100_000))]
    pub gift_maximum_budget: u32,
}

impl From<RoomCreate> for RoomDetails {
    fn from(dto: RoomCreate) -> Self {
        RoomDetails {
            name: dto.name,
            description: dto.description,
            gift_exchange_date: dto.gift_exchange_date,
            gift_maximum_budget: dto.gift_maximum_budget,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[validate(nested)]
    pub room: RoomCreate,
    #[validate(nested)]
    pub admin_user: UserCreate,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdate {
    #[validate(length(min = 1, max = 40))]
    pub name: Option<String>,
    #[validate(length(max = 200))]
    pub description: Option<String>,
    pub gift_exchange_date: Option<NaiveDate>,
    #[validate(range(max = 100_000))]
    pub gift_maximum_budget: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub invitation_code: String,
    pub gift_exchange_date: NaiveDate,
    pub gift_maximum_budget: u32,
    pub min_users_limit: u32,
    pub max_users_limit: u32,
    pub users_count: usize,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
    pub closed_on: Option<DateTime<Utc>>,
}

impl From<&Room> for RoomView {
    fn from(room: &Room) -> Self {
        RoomView {
            id: room.id,
            name: room.name.clone(),
            description: room.description.clone(),
            invitation_code: room.invitation_code.clone(),
            gift_exchange_date: room.gift_exchange_date,
            gift_maximum_budget: room.gift_maximum_budget,
            min_users_limit: room.min_users_limit,
            max_users_limit: room.max_users_limit,
            users_count: room.users.len(),
            created_on: room.created_on,
            modified_on: room.modified_on,
            closed_on: room.closed_on,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room: RoomView,
    pub user_code: String,
}

/// A participant as seen by another participant of the same room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub room_id: RoomId,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub want_surprise: bool,
    pub interests: Option<String>,
    pub wishes: Vec<WishDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift_recipient_user_id: Option<UserId>,
}

impl UserView {
    /// Contact details are visible to the admin and to the user themself;
    /// the gift recipient only to the user themself.
    pub fn for_viewer(user: &User, viewer: &User) -> Self {
        let is_self = user.id == viewer.id;
        let show_contacts = is_self || viewer.is_admin;
        UserView {
            id: user.id,
            room_id: user.room_id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_admin: user.is_admin,
            want_surprise: user.want_surprise,
            interests: user.interests.clone(),
            wishes: user
                .wishes
                .iter()
                .map(|w| WishDto {
                    name: w.name.clone(),
                    info_link: w.info_link.clone(),
                })
                .collect(),
            phone: show_contacts.then(|| user.phone.clone()),
            email: if show_contacts { user.email.clone() } else { None },
            delivery_info: show_contacts.then(|| user.delivery_info.clone()),
            gift_recipient_user_id: if is_self {
                user.gift_recipient_user_id
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUserResponse {
    #[serde(flatten)]
    pub user: UserView,
    pub user_code: String,
}
