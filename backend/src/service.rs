//! Application layer: one handler per use case. Each handler loads the room
//! through the caller's user code, runs its checks in order and persists the
//! result.

use std::sync::Arc;

use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use room_core::{Room, RoomError, User, UserId, UsersLimits, ValidationFailure};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::dto::{CreateRoomRequest, RoomUpdate, UserCreate};
use crate::error::AppResult;
use crate::repository::{RoomRepository, StoreError, UserReadRepository};

/// Remove a participant from the caller's room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteUserCommand {
    pub user_code: String,
    pub user_id: UserId,
}

#[derive(Clone)]
pub struct RoomService {
    rooms: Arc<dyn RoomRepository>,
    users: Arc<dyn UserReadRepository>,
    limits: UsersLimits,
}

fn new_code() -> String {
    Uuid::new_v4().simple().to_string()
}

impl RoomService {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        users: Arc<dyn UserReadRepository>,
        limits: UsersLimits,
    ) -> Self {
        Self {
            rooms,
            users,
            limits,
        }
    }

    async fn room_for_code(&self, user_code: &str) -> AppResult<Room> {
        self.rooms
            .get_by_user_code(user_code)
            .await?
            .ok_or_else(|| {
                RoomError::not_found("userCode", "Room for specified user code not found.").into()
            })
    }

    fn member<'a>(room: &'a Room, user_code: &str) -> AppResult<&'a User> {
        room.find_user_by_code(user_code)
            .ok_or_else(|| RoomError::not_found("userCode", "Auth user not found in room.").into())
    }

    fn admin_member<'a>(room: &'a Room, user_code: &str, action: &str) -> AppResult<&'a User> {
        let user = Self::member(room, user_code)?;
        if !user.is_admin {
            return Err(
                RoomError::forbidden("userCode", format!("Only admin can {action}.")).into(),
            );
        }
        Ok(user)
    }

    /// Creates a room with its admin. Returns the room and the admin's user code.
    #[instrument(skip_all, fields(room_name = %request.room.name))]
    pub async fn create_room(&self, request: CreateRoomRequest) -> AppResult<(Room, String)> {
        let now = Utc::now();
        let room_id = self.rooms.next_room_id().await?;
        let mut room = Room::new(room_id, new_code(), request.room.into(), self.limits, now)?;

        let user_id = self.rooms.next_user_id().await?;
        let admin_code = new_code();
        let admin = User::new(user_id, room_id, admin_code.clone(), true, request.admin_user.into(), now);
        room.add_user(admin)?;

        let room = self.rooms.add(room).await?;
        info!(room_id, admin_id = user_id, "room created");
        Ok((room, admin_code))
    }

    /// Adds a participant through the room's invitation code.
    #[instrument(skip_all)]
    pub async fn join_room(&self, room_code: &str, profile: UserCreate) -> AppResult<(User, String)> {
        let mut room = self
            .rooms
            .get_by_invitation_code(room_code)
            .await?
            .ok_or_else(|| RoomError::not_found("roomCode", "Room with specified code not found."))?;

        room.ensure_open()?;
        let user_id = self.rooms.next_user_id().await?;
        let user_code = new_code();
        let user = User::new(user_id, room.id, user_code.clone(), false, profile.into(), Utc::now());
        room.add_user(user.clone())?;

        self.rooms.update(room).await?;
        info!(room_id = user.room_id, user_id, "user joined room");
        Ok((user, user_code))
    }

    pub async fn get_room(&self, user_code: &str) -> AppResult<Room> {
        let room = self.room_for_code(user_code).await?;
        Self::member(&room, user_code)?;
        Ok(room)
    }

    #[instrument(skip_all)]
    pub async fn update_room(&self, user_code: &str, update: RoomUpdate) -> AppResult<Room> {
        let mut room = self.room_for_code(user_code).await?;
        Self::admin_member(&room, user_code, "update the room")?;

        let now = Utc::now();
        room.ensure_open()?;
        if let Some(name) = &update.name {
            room.set_name(name)?;
        }
        if let Some(description) = &update.description {
            room.set_description(description)?;
        }
        if let Some(date) = update.gift_exchange_date {
            room.set_gift_exchange_date(date, now)?;
        }
        if let Some(budget) = update.gift_maximum_budget {
            room.set_gift_maximum_budget(budget)?;
        }

        let room = self.rooms.update(room).await?;
        info!(room_id = room.id, "room updated");
        Ok(room)
    }

    /// Runs the draw and closes the room. A seed makes the assignment
    /// reproducible.
    #[instrument(skip(self, user_code))]
    pub async fn draw_room(&self, user_code: &str, seed: Option<u64>) -> AppResult<Room> {
        let mut room = self.room_for_code(user_code).await?;
        Self::admin_member(&room, user_code, "draw the room")?;

        let mut rng = seed
            .map(ChaCha8Rng::seed_from_u64)
            .unwrap_or_else(ChaCha8Rng::from_entropy);
        room.draw(&mut rng, Utc::now())?;

        let room = self.rooms.update(room).await?;
        info!(room_id = room.id, users = room.users.len(), "room drawn");
        Ok(room)
    }

    /// Members of the caller's room plus the caller.
    pub async fn list_users(&self, user_code: &str) -> AppResult<(Vec<User>, User)> {
        let room = self.room_for_code(user_code).await?;
        let caller = Self::member(&room, user_code)?.clone();
        let users = self.users.get_by_room_id(room.id).await?;
        Ok((users, caller))
    }

    pub async fn get_user(&self, user_code: &str, id: UserId) -> AppResult<(User, User)> {
        let room = self.room_for_code(user_code).await?;
        let caller = Self::member(&room, user_code)?.clone();
        let user = room
            .find_user(id)
            .cloned()
            .ok_or_else(|| RoomError::not_found("id", "User with specified id not found."))?;
        Ok((user, caller))
    }

    /// Removes a non-admin participant. Only the room's admin may do this,
    /// and only before the draw.
    #[instrument(skip(self, command), fields(user_id = command.user_id))]
    pub async fn delete_user(&self, command: DeleteUserCommand) -> AppResult<()> {
        let mut room = self.room_for_code(&command.user_code).await?;

        if room.is_closed() {
            return Err(
                RoomError::bad_request("room", "Cannot remove users from a closed room.").into(),
            );
        }

        let auth_user = room
            .find_user_by_code(&command.user_code)
            .ok_or_else(|| RoomError::not_found("userCode", "Auth user not found in room."))?;
        if !auth_user.is_admin {
            warn!(room_id = room.id, caller = auth_user.id, "non-admin tried to remove a user");
            return Err(RoomError::forbidden(
                "userCode",
                "Only admin can remove users from room.",
            )
            .into());
        }

        if self.users.get_by_id(command.user_id).await?.is_none() {
            return Err(RoomError::not_found("id", "User with specified id not found.").into());
        }

        let target = room.find_user(command.user_id).ok_or_else(|| {
            RoomError::forbidden("id", "Admin and target user belong to different rooms.")
        })?;
        if target.is_admin {
            return Err(RoomError::forbidden("id", "Cannot remove admin user from room.").into());
        }

        room.remove_user(command.user_id)?;
        let room_id = room.id;
        match self.rooms.update(room).await {
            Ok(_) => {}
            Err(err @ StoreError::Conflict { .. }) => {
                warn!(room_id, "room changed while removing a user");
                return Err(err.into());
            }
            Err(err) => {
                warn!(room_id, %err, "failed to persist user removal");
                return Err(
                    RoomError::BadRequest(vec![ValidationFailure::new("", err.to_string())]).into(),
                );
            }
        }

        info!(room_id, "user removed from room");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::repository::StoreResult;
    use async_trait::async_trait;
    use chrono::Duration;
    use room_core::{RoomDetails, RoomId, UserProfile};
    use std::sync::Mutex;

    const ADMIN_CODE: &str = "admin123";
    const USER_CODE: &str = "user123";

    /// Serves a fixed room and records updates.
    struct MockRooms {
        room: Option<Room>,
        update_error: Mutex<Option<StoreError>>,
        updated: Mutex<Vec<Room>>,
    }

    #[async_trait]
    impl RoomRepository for MockRooms {
        async fn next_room_id(&self) -> StoreResult<RoomId> {
            Ok(10)
        }

        async fn next_user_id(&self) -> StoreResult<UserId> {
            Ok(100)
        }

        async fn add(&self, room: Room) -> StoreResult<Room> {
            Ok(room)
        }

        async fn get_by_user_code(&self, user_code: &str) -> StoreResult<Option<Room>> {
            Ok(self
                .room
                .clone()
                .filter(|r| r.find_user_by_code(user_code).is_some()))
        }

        async fn get_by_invitation_code(&self, code: &str) -> StoreResult<Option<Room>> {
            Ok(self.room.clone().filter(|r| r.invitation_code == code))
        }

        async fn update(&self, room: Room) -> StoreResult<Room> {
            if let Some(err) = self.update_error.lock().unwrap().take() {
                return Err(err);
            }
            self.updated.lock().unwrap().push(room.clone());
            Ok(room)
        }
    }

    struct MockUsers {
        known: Vec<User>,
    }

    #[async_trait]
    impl UserReadRepository for MockUsers {
        async fn get_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
            Ok(self.known.iter().find(|u| u.id == id).cloned())
        }

        async fn get_by_room_id(&self, room_id: RoomId) -> StoreResult<Vec<User>> {
            Ok(self.known.iter().filter(|u| u.room_id == room_id).cloned().collect())
        }
    }

    fn user(id: UserId, room_id: RoomId, code: &str, is_admin: bool) -> User {
        User::new(
            id,
            room_id,
            code,
            is_admin,
            UserProfile {
                first_name: "John".into(),
                last_name: "Doe".into(),
                phone: "+380000000000".into(),
                email: None,
                delivery_info: "Test delivery".into(),
                want_surprise: true,
                interests: Some("Test interests".into()),
                wishes: vec![],
            },
            Utc::now(),
        )
    }

    fn room(users: Vec<User>) -> Room {
        let now = Utc::now();
        let mut room = Room::new(
            1,
            "testcode",
            RoomDetails {
                name: "Test Room".into(),
                description: "Test Description".into(),
                gift_exchange_date: (now + Duration::days(7)).date_naive(),
                gift_maximum_budget: 1000,
            },
            UsersLimits { min: 2, max: 20 },
            now,
        )
        .unwrap();
        room.users = users;
        room
    }

    fn standard_room() -> Room {
        room(vec![user(1, 1, ADMIN_CODE, true), user(2, 1, USER_CODE, false)])
    }

    struct Fixture {
        rooms: Arc<MockRooms>,
        service: RoomService,
    }

    fn fixture(room: Option<Room>, extra_users: Vec<User>, fail_update: bool) -> Fixture {
        let mut known: Vec<User> = room.iter().flat_map(|r| r.users.clone()).collect();
        known.extend(extra_users);
        let rooms = Arc::new(MockRooms {
            room,
            update_error: Mutex::new(
                fail_update.then(|| StoreError::Backend("database unavailable".into())),
            ),
            updated: Mutex::new(Vec::new()),
        });
        let service = RoomService::new(
            rooms.clone(),
            Arc::new(MockUsers { known }),
            UsersLimits::default(),
        );
        Fixture { rooms, service }
    }

    fn delete(code: &str, id: UserId) -> DeleteUserCommand {
        DeleteUserCommand {
            user_code: code.into(),
            user_id: id,
        }
    }

    fn room_error(err: AppError) -> RoomError {
        match err {
            AppError::Room(err) => err,
            other => panic!("expected room error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn admin_deletes_regular_user() {
        let fx = fixture(Some(standard_room()), vec![], false);
        fx.service.delete_user(delete(ADMIN_CODE, 2)).await.unwrap();

        let updated = fx.rooms.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].users.len(), 1);
        assert!(updated[0].find_user(2).is_none());
    }

    #[tokio::test]
    async fn unknown_user_code_is_not_found() {
        let fx = fixture(Some(standard_room()), vec![], false);
        let err = room_error(fx.service.delete_user(delete("nobody", 2)).await.unwrap_err());
        assert!(matches!(err, RoomError::NotFound(_)));
        assert!(err.has_property("userCode"));
    }

    #[tokio::test]
    async fn closed_room_is_bad_request() {
        let mut closed = standard_room();
        closed.closed_on = Some(Utc::now());
        let fx = fixture(Some(closed), vec![], false);
        let err = room_error(fx.service.delete_user(delete(ADMIN_CODE, 2)).await.unwrap_err());
        assert!(matches!(err, RoomError::BadRequest(_)));
        assert!(err.contains("room", "Cannot remove users from a closed room."));
        assert!(fx.rooms.updated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let fx = fixture(Some(standard_room()), vec![], false);
        let err = room_error(fx.service.delete_user(delete(USER_CODE, 1)).await.unwrap_err());
        assert!(matches!(err, RoomError::Forbidden(_)));
        assert!(err.contains("userCode", "Only admin can remove users from room."));
    }

    #[tokio::test]
    async fn missing_target_is_not_found() {
        let fx = fixture(Some(standard_room()), vec![], false);
        let err = room_error(fx.service.delete_user(delete(ADMIN_CODE, 999)).await.unwrap_err());
        assert!(matches!(err, RoomError::NotFound(_)));
        assert!(err.contains("id", "User with specified id not found."));
    }

    #[tokio::test]
    async fn target_in_other_room_is_forbidden() {
        let stranger = user(3, 2, "other-room", false);
        let fx = fixture(Some(standard_room()), vec![stranger], false);
        let err = room_error(fx.service.delete_user(delete(ADMIN_CODE, 3)).await.unwrap_err());
        assert!(matches!(err, RoomError::Forbidden(_)));
        assert!(err.contains("id", "Admin and target user belong to different rooms."));
    }

    #[tokio::test]
    async fn admin_cannot_be_removed() {
        let room = room(vec![
            user(1, 1, ADMIN_CODE, true),
            user(2, 1, "second-admin", true),
        ]);
        let fx = fixture(Some(room), vec![], false);
        let err = room_error(fx.service.delete_user(delete(ADMIN_CODE, 2)).await.unwrap_err());
        assert!(matches!(err, RoomError::Forbidden(_)));
        assert!(err.contains("id", "Cannot remove admin user from room."));

        let err = room_error(fx.service.delete_user(delete(ADMIN_CODE, 1)).await.unwrap_err());
        assert!(err.contains("id", "Cannot remove admin user from room."));
    }

    #[tokio::test]
    async fn update_failure_is_bad_request() {
        let fx = fixture(Some(standard_room()), vec![], true);
        let err = room_error(fx.service.delete_user(delete(ADMIN_CODE, 2)).await.unwrap_err());
        assert!(matches!(err, RoomError::BadRequest(_)));
        assert!(err.contains("", "Storage failure: database unavailable"));
    }

    #[tokio::test]
    async fn concurrent_change_is_a_conflict() {
        let fx = fixture(Some(standard_room()), vec![], false);
        *fx.rooms.update_error.lock().unwrap() = Some(StoreError::Conflict {
            id: 1,
            expected: 0,
            found: 1,
        });
        let err = fx.service.delete_user(delete(ADMIN_CODE, 2)).await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::Conflict { .. })));
        assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn draw_requires_admin_and_closes_room() {
        let mut room = standard_room();
        room.users.push(user(3, 1, "third", false));
        let fx = fixture(Some(room), vec![], false);

        let err = room_error(fx.service.draw_room(USER_CODE, Some(1)).await.unwrap_err());
        assert!(matches!(err, RoomError::Forbidden(_)));

        let drawn = fx.service.draw_room(ADMIN_CODE, Some(1)).await.unwrap();
        assert!(drawn.is_closed());
        assert!(drawn
            .users
            .iter()
            .all(|u| u.gift_recipient_user_id.is_some_and(|r| r != u.id)));
    }

    #[tokio::test]
    async fn update_room_applies_fields_for_admin_only() {
        let fx = fixture(Some(standard_room()), vec![], false);
        let update = RoomUpdate {
            name: Some("Renamed".into()),
            gift_maximum_budget: Some(250),
            ..RoomUpdate::default()
        };

        let err = room_error(fx.service.update_room(USER_CODE, update.clone()).await.unwrap_err());
        assert!(matches!(err, RoomError::Forbidden(_)));

        let room = fx.service.update_room(ADMIN_CODE, update).await.unwrap();
        assert_eq!(room.name, "Renamed");
        assert_eq!(room.gift_maximum_budget, 250);
        assert_eq!(room.description, "Test Description");
    }

    #[tokio::test]
    async fn join_room_adds_user_with_fresh_code() {
        let fx = fixture(Some(standard_room()), vec![], false);
        let profile: UserCreate = serde_json::from_value(serde_json::json!({
            "firstName": "New",
            "lastName": "Member",
            "phone": "+380222222222",
            "deliveryInfo": "Post office 1",
            "wantSurprise": true,
            "interests": "Tea"
        }))
        .unwrap();

        let (user, code) = fx.service.join_room("testcode", profile.clone()).await.unwrap();
        assert_eq!(user.id, 100);
        assert!(!user.is_admin);
        assert_eq!(user.auth_code, code);
        assert_eq!(fx.rooms.updated.lock().unwrap()[0].users.len(), 3);

        let err = room_error(fx.service.join_room("missing", profile).await.unwrap_err());
        assert!(err.has_property("roomCode"));
    }

    #[tokio::test]
    async fn get_user_only_within_callers_room() {
        let stranger = user(3, 2, "other-room", false);
        let fx = fixture(Some(standard_room()), vec![stranger], false);

        let (target, caller) = fx.service.get_user(USER_CODE, 1).await.unwrap();
        assert_eq!(target.id, 1);
        assert_eq!(caller.id, 2);

        let err = room_error(fx.service.get_user(USER_CODE, 3).await.unwrap_err());
        assert!(matches!(err, RoomError::NotFound(_)));
    }

    fn new_member() -> UserCreate {
        serde_json::from_value(serde_json::json!({
            "firstName": "Late",
            "lastName": "Comer",
            "phone": "+380333333333",
            "deliveryInfo": "Post office 2",
            "wantSurprise": true,
            "interests": "Games"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn drawn_room_rejects_join_and_update() {
        let mut closed = standard_room();
        closed.closed_on = Some(Utc::now());
        let fx = fixture(Some(closed), vec![], false);

        let err = room_error(fx.service.join_room("testcode", new_member()).await.unwrap_err());
        assert!(matches!(err, RoomError::BadRequest(_)));
        assert!(err.contains("room.closedOn", "Room is already closed."));

        let update = RoomUpdate {
            name: Some("Renamed".into()),
            ..RoomUpdate::default()
        };
        let err = room_error(fx.service.update_room(ADMIN_CODE, update).await.unwrap_err());
        assert!(err.contains("room.closedOn", "Room is already closed."));
        assert!(fx.rooms.updated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_room_rejects_join() {
        let mut full = standard_room();
        full.max_users_limit = 2;
        let fx = fixture(Some(full), vec![], false);

        let err = room_error(fx.service.join_room("testcode", new_member()).await.unwrap_err());
        assert!(matches!(err, RoomError::BadRequest(_)));
        assert!(err.has_property("room.maxUsersLimit"));
        assert!(fx.rooms.updated.lock().unwrap().is_empty());
    }
}
