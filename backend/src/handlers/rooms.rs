use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::dto::{CreateRoomRequest, CreateRoomResponse, DrawParams, RoomUpdate, RoomView, UserCodeQuery};
use crate::error::AppResult;
use crate::extract::{ValidatedJson, ValidatedQuery};
use crate::AppState;

/// POST /api/rooms
pub async fn create_room(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateRoomRequest>,
) -> AppResult<(StatusCode, Json<CreateRoomResponse>)> {
    let (room, user_code) = state.service.create_room(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room: RoomView::from(&room),
            user_code,
        }),
    ))
}

/// GET /api/rooms?userCode=
pub async fn get_room(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<UserCodeQuery>,
) -> AppResult<Json<RoomView>> {
    let room = state.service.get_room(&query.user_code).await?;
    Ok(Json(RoomView::from(&room)))
}

/// PATCH /api/rooms?userCode=
pub async fn update_room(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<UserCodeQuery>,
    ValidatedJson(update): ValidatedJson<RoomUpdate>,
) -> AppResult<Json<RoomView>> {
    let room = state.service.update_room(&query.user_code, update).await?;
    Ok(Json(RoomView::from(&room)))
}

/// POST /api/rooms/draw?userCode=&seed=
pub async fn draw_room(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<UserCodeQuery>,
    Query(params): Query<DrawParams>,
) -> AppResult<Json<RoomView>> {
    let room = state.service.draw_room(&query.user_code, params.seed).await?;
    Ok(Json(RoomView::from(&room)))
}
