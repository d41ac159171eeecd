use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use room_core::{Room, RoomId, User, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Room {0} not found.")]
    RoomNotFound(RoomId),

    #[error("Room {id} was modified concurrently (expected version {expected}, found {found}).")]
    Conflict { id: RoomId, expected: u64, found: u64 },

    #[error("Storage failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for the room aggregate. Rooms are always read and written
/// whole, users included.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn next_room_id(&self) -> StoreResult<RoomId>;

    async fn next_user_id(&self) -> StoreResult<UserId>;

    async fn add(&self, room: Room) -> StoreResult<Room>;

    async fn get_by_user_code(&self, user_code: &str) -> StoreResult<Option<Room>>;

    async fn get_by_invitation_code(&self, invitation_code: &str) -> StoreResult<Option<Room>>;

    /// Replaces the stored room. Fails with [`StoreError::Conflict`] if the
    /// stored version differs from `room.version`.
    async fn update(&self, room: Room) -> StoreResult<Room>;
}

/// Read-only lookups of users across all rooms.
#[async_trait]
pub trait UserReadRepository: Send + Sync {
    async fn get_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn get_by_room_id(&self, room_id: RoomId) -> StoreResult<Vec<User>>;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    rooms: HashMap<RoomId, Room>,
    last_room_id: RoomId,
    last_user_id: UserId,
}

/// In-memory store, optionally mirrored to a JSON file after every write.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<Snapshot>>,
    persist_path: Option<PathBuf>,
    /// Held while a snapshot is taken and written, so the file always ends
    /// up with the newest state.
    persist_lock: Arc<Mutex<()>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a previous snapshot from `path` if one exists; later writes go
    /// to the same file. An unreadable snapshot is an error rather than an
    /// empty store, so it is never overwritten.
    pub async fn with_persistence(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let mut store = Self::default();
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let saved: Snapshot = serde_json::from_slice(&bytes).map_err(|err| {
                    StoreError::Backend(format!("unreadable snapshot {}: {err}", path.display()))
                })?;
                tracing::info!(path = %path.display(), rooms = saved.rooms.len(), "loaded snapshot");
                *store.state.write().await = saved;
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no snapshot to load")
            }
            Err(err) => {
                return Err(StoreError::Backend(format!(
                    "cannot read snapshot {}: {err}",
                    path.display()
                )))
            }
        }
        store.persist_path = Some(path);
        Ok(store)
    }

    /// Writes the current state next to the snapshot and renames it into
    /// place.
    async fn persist(&self) {
        let Some(path) = &self.persist_path else {
            return;
        };
        let _guard = self.persist_lock.lock().await;
        let json = {
            let state = self.state.read().await;
            serde_json::to_vec_pretty(&*state)
        };
        let json = match json {
            Ok(json) => json,
            Err(err) => {
                tracing::error!(%err, "snapshot serialization error");
                return;
            }
        };
        let tmp = temp_path(path);
        if let Err(err) = tokio::fs::write(&tmp, json).await {
            tracing::error!(path = %tmp.display(), %err, "persist error");
            return;
        }
        if let Err(err) = tokio::fs::rename(&tmp, path).await {
            tracing::error!(path = %path.display(), %err, "persist error");
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn next_room_id(&self) -> StoreResult<RoomId> {
        let mut state = self.state.write().await;
        state.last_room_id += 1;
        Ok(state.last_room_id)
    }

    async fn next_user_id(&self) -> StoreResult<UserId> {
        let mut state = self.state.write().await;
        state.last_user_id += 1;
        Ok(state.last_user_id)
    }

    async fn add(&self, room: Room) -> StoreResult<Room> {
        {
            let mut state = self.state.write().await;
            if state.rooms.contains_key(&room.id) {
                return Err(StoreError::Backend(format!("Room {} already exists.", room.id)));
            }
            state.rooms.insert(room.id, room.clone());
        }
        self.persist().await;
        Ok(room)
    }

    async fn get_by_user_code(&self, user_code: &str) -> StoreResult<Option<Room>> {
        let state = self.state.read().await;
        Ok(state
            .rooms
            .values()
            .find(|r| r.find_user_by_code(user_code).is_some())
            .cloned())
    }

    async fn get_by_invitation_code(&self, invitation_code: &str) -> StoreResult<Option<Room>> {
        let state = self.state.read().await;
        Ok(state
            .rooms
            .values()
            .find(|r| r.invitation_code == invitation_code)
            .cloned())
    }

    async fn update(&self, mut room: Room) -> StoreResult<Room> {
        {
            let mut state = self.state.write().await;
            let stored = state
                .rooms
                .get_mut(&room.id)
                .ok_or(StoreError::RoomNotFound(room.id))?;
            if stored.version != room.version {
                return Err(StoreError::Conflict {
                    id: room.id,
                    expected: room.version,
                    found: stored.version,
                });
            }
            room.version += 1;
            *stored = room.clone();
        }
        self.persist().await;
        Ok(room)
    }
}

#[async_trait]
impl UserReadRepository for InMemoryStore {
    async fn get_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .rooms
            .values()
            .flat_map(|r| r.users.iter())
            .find(|u| u.id == id)
            .cloned())
    }

    async fn get_by_room_id(&self, room_id: RoomId) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .rooms
            .get(&room_id)
            .map(|r| r.users.clone())
            .unwrap_or_default())
    }
}
