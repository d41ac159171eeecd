use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::draw::derangement;
use crate::error::{RoomError, RoomResult, ValidationFailure};
use crate::user::User;
use crate::{RoomId, UserId};

pub const NAME_MAX_LEN: usize = 40;
pub const DESCRIPTION_MAX_LEN: usize = 200;
pub const GIFT_MAXIMUM_BUDGET: u32 = 100_000;

const CLOSED_MESSAGE: &str = "Room is already closed.";

/// Editable exchange parameters of a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomDetails {
    pub name: String,
    pub description: String,
    pub gift_exchange_date: NaiveDate,
    pub gift_maximum_budget: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsersLimits {
    pub min: u32,
    pub max: u32,
}

impl Default for UsersLimits {
    fn default() -> Self {
        Self { min: 3, max: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub invitation_code: String,
    pub gift_exchange_date: NaiveDate,
    pub gift_maximum_budget: u32,
    pub min_users_limit: u32,
    pub max_users_limit: u32,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
    pub closed_on: Option<DateTime<Utc>>,
    pub users: Vec<User>,
    /// Bumped by the store on every successful update.
    #[serde(default)]
    pub version: u64,
}

impl Room {
    pub fn new(
        id: RoomId,
        invitation_code: impl Into<String>,
        details: RoomDetails,
        limits: UsersLimits,
        now: DateTime<Utc>,
    ) -> RoomResult<Self> {
        let mut failures = Vec::new();
        failures.extend(check_name(&details.name).err());
        failures.extend(check_description(&details.description).err());
        failures.extend(check_exchange_date(details.gift_exchange_date, now).err());
        failures.extend(check_budget(details.gift_maximum_budget).err());
        if limits.min > limits.max {
            failures.push(ValidationFailure::new(
                "room.minUsersLimit",
                "Minimum users limit cannot exceed maximum users limit.",
            ));
        }
        if !failures.is_empty() {
            return Err(RoomError::BadRequest(failures));
        }

        Ok(Self {
            id,
            name: details.name.trim().to_string(),
            description: details.description.trim().to_string(),
            invitation_code: invitation_code.into(),
            gift_exchange_date: details.gift_exchange_date,
            gift_maximum_budget: details.gift_maximum_budget,
            min_users_limit: limits.min,
            max_users_limit: limits.max,
            created_on: now,
            modified_on: now,
            closed_on: None,
            users: Vec::new(),
            version: 0,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed_on.is_some()
    }

    pub fn ensure_open(&self) -> RoomResult<()> {
        if self.is_closed() {
            return Err(RoomError::bad_request("room.closedOn", CLOSED_MESSAGE));
        }
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> RoomResult<()> {
        self.ensure_open()?;
        check_name(name).map_err(single)?;
        self.name = name.trim().to_string();
        self.touch();
        Ok(())
    }

    pub fn set_description(&mut self, description: &str) -> RoomResult<()> {
        self.ensure_open()?;
        check_description(description).map_err(single)?;
        self.description = description.trim().to_string();
        self.touch();
        Ok(())
    }

    pub fn set_gift_exchange_date(&mut self, date: NaiveDate, now: DateTime<Utc>) -> RoomResult<()> {
        self.ensure_open()?;
        check_exchange_date(date, now).map_err(single)?;
        self.gift_exchange_date = date;
        self.touch();
        Ok(())
    }

    pub fn set_gift_maximum_budget(&mut self, budget: u32) -> RoomResult<()> {
        self.ensure_open()?;
        check_budget(budget).map_err(single)?;
        self.gift_maximum_budget = budget;
        self.touch();
        Ok(())
    }

    pub fn add_user(&mut self, user: User) -> RoomResult<()> {
        self.ensure_open()?;
        if self.users.len() >= self.max_users_limit as usize {
            return Err(RoomError::bad_request(
                "room.maxUsersLimit",
                format!("Room cannot have more than {} users.", self.max_users_limit),
            ));
        }
        self.users.push(user);
        self.touch();
        Ok(())
    }

    pub fn remove_user(&mut self, id: UserId) -> RoomResult<User> {
        self.ensure_open()?;
        let index = self
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| RoomError::not_found("id", "User with specified id not found."))?;
        let removed = self.users.remove(index);
        self.touch();
        Ok(removed)
    }

    pub fn find_user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn find_user_by_code(&self, auth_code: &str) -> Option<&User> {
        self.users.iter().find(|u| u.auth_code == auth_code)
    }

    /// Assigns every participant a gift recipient other than themselves and
    /// closes the room.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R, now: DateTime<Utc>) -> RoomResult<()> {
        self.ensure_open()?;

        let required = (self.min_users_limit as usize).max(2);
        if self.users.len() < required {
            return Err(RoomError::bad_request(
                "room.minUsersLimit",
                format!("Room must have at least {required} users to draw."),
            ));
        }

        let order = derangement(self.users.len(), rng).ok_or_else(|| {
            RoomError::bad_request("room.minUsersLimit", "Not enough users to draw.")
        })?;
        let ids: Vec<UserId> = self.users.iter().map(|u| u.id).collect();
        for (user, target) in self.users.iter_mut().zip(order) {
            user.gift_recipient_user_id = Some(ids[target]);
            user.modified_on = now;
        }

        self.closed_on = Some(now);
        self.modified_on = now;
        Ok(())
    }

    fn touch(&mut self) {
        self.modified_on = Utc::now();
    }
}

fn single(failure: ValidationFailure) -> RoomError {
    RoomError::BadRequest(vec![failure])
}

fn check_name(name: &str) -> Result<(), ValidationFailure> {
    let len = name.trim().chars().count();
    if len == 0 || len > NAME_MAX_LEN {
        return Err(ValidationFailure::new(
            "room.name",
            format!("Name must be between 1 and {NAME_MAX_LEN} characters."),
        ));
    }
    Ok(())
}

fn check_description(description: &str) -> Result<(), ValidationFailure> {
    if description.trim().chars().count() > DESCRIPTION_MAX_LEN {
        return Err(ValidationFailure::new(
            "room.description",
            format!("Description cannot exceed {DESCRIPTION_MAX_LEN} characters."),
        ));
    }
    Ok(())
}

fn check_exchange_date(date: NaiveDate, now: DateTime<Utc>) -> Result<(), ValidationFailure> {
    if date < now.date_naive() {
        return Err(ValidationFailure::new(
            "room.giftExchangeDate",
            "Gift exchange date cannot be in the past.",
        ));
    }
    Ok(())
}

fn check_budget(budget: u32) -> Result<(), ValidationFailure> {
    if budget > GIFT_MAXIMUM_BUDGET {
        return Err(ValidationFailure::new(
            "room.giftMaximumBudget",
            format!("Gift maximum budget cannot exceed {GIFT_MAXIMUM_BUDGET}."),
        ));
    }
    Ok(())
}
