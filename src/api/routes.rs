//! RPC handlers: request dispatch, DTO conversion, and error mapping.

use std::sync::Arc;

use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::errors::ServiceError;
use crate::protocol::{
    CreateRoomRequest, ErrorCode, JoinRoomRequest, PlayerActionRequest, StartGameRequest,
    SubmitSolutionRequest, SubmitSolutionResponse,
};
use crate::room::Room;
use crate::server::GameServer;
use crate::stats::StatsView;

use super::connection;

/// Wire form of [`ServiceError`].
pub(super) struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status = match code {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidState => StatusCode::CONFLICT,
            ErrorCode::InvalidSolution => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "code": code,
        }));
        (status, body).into_response()
    }
}

pub(super) async fn create_room(
    State(server): State<Arc<GameServer>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(server.create_room(&request.player_name).await?))
}

pub(super) async fn get_room(
    State(server): State<Arc<GameServer>>,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(server.get_room(&room_id).await?))
}

pub(super) async fn join_room(
    State(server): State<Arc<GameServer>>,
    Path(room_id): Path<String>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(server.join_room(&room_id, &request.player_name).await?))
}

pub(super) async fn start_game(
    State(server): State<Arc<GameServer>>,
    Path(room_id): Path<String>,
    Json(request): Json<StartGameRequest>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(
        server.start_game(&room_id, request.use_fixed_board).await?,
    ))
}

pub(super) async fn submit_solution(
    State(server): State<Arc<GameServer>>,
    Path(room_id): Path<String>,
    Json(request): Json<SubmitSolutionRequest>,
) -> Result<Json<SubmitSolutionResponse>, ApiError> {
    let solution = server
        .submit_solution(&room_id, request.player_id, &request.moves)
        .await?;
    Ok(Json(SubmitSolutionResponse { solution }))
}

pub(super) async fn retract_solution(
    State(server): State<Arc<GameServer>>,
    Path(room_id): Path<String>,
    Json(request): Json<PlayerActionRequest>,
) -> Result<StatusCode, ApiError> {
    server.retract_solution(&room_id, request.player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn mark_finished_solving(
    State(server): State<Arc<GameServer>>,
    Path(room_id): Path<String>,
    Json(request): Json<PlayerActionRequest>,
) -> Result<StatusCode, ApiError> {
    server
        .mark_finished_solving(&room_id, request.player_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn mark_ready_for_next(
    State(server): State<Arc<GameServer>>,
    Path(room_id): Path<String>,
    Json(request): Json<PlayerActionRequest>,
) -> Result<StatusCode, ApiError> {
    server
        .mark_ready_for_next(&room_id, request.player_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn stats(State(server): State<Arc<GameServer>>) -> Json<StatsView> {
    Json(server.stats().view())
}

pub(super) async fn ws_handler(
    State(server): State<Arc<GameServer>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| connection::handle_socket(socket, server))
}

pub(super) async fn fallback() -> &'static str {
    "Slidebot Server. RPC under /v1/rooms, push channel at /v1/ws, stats at /v1/stats."
}
