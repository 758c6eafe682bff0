//! HTTP request handlers
//!
//! Maps each route onto one ChatServer command: JSON bodies and path
//! parameters are decoded here (including `#`/`@` address sigils) and the
//! actor's reply is encoded back to JSON.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::channel::{Channel, ChatChannel};
use crate::error::AppError;
use crate::message::{ChatMessage, JoinChannel, RegisterChannel, RegisterUser, SendChat};
use crate::messages::Mailbox;
use crate::server::ServerHandle;
use crate::types::{Address, ChannelKey, Timestamp, UserKey};
use crate::user::User;

type ApiResult<T> = Result<Json<T>, AppError>;

/// Build the HTTP router around a ChatServer handle
pub fn router(server: ServerHandle) -> Router {
    Router::new()
        .route("/user", post(register_user))
        .route("/user/{key}", get(get_user))
        .route("/users", get(list_users))
        .route("/channel", post(register_channel))
        .route("/channel/{key}", get(get_channel))
        .route("/channels", get(list_channels))
        .route("/join", post(join_channel))
        .route("/chat/send", post(send_chat))
        .route("/chat/recv/{identifier}/{cursor}", get(recv_chat))
        .route("/chatchannels", get(list_chat_channels))
        .route("/chatchannel/{key}", get(get_chat_channel))
        .route("/privatemessages", get(list_private_messages))
        .route("/privatemessage/{from}/{to}", get(get_private_messages))
        .with_state(server)
}

/// Unwrap a JSON body, turning decode failures into `Malformed`
fn body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection.body_text());
            Err(AppError::Malformed(rejection.body_text()))
        }
    }
}

async fn register_user(
    State(server): State<ServerHandle>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> ApiResult<User> {
    let RegisterUser { nickname } = body(payload)?;
    info!("POST /user '{}'", nickname);
    Ok(Json(server.register_user(nickname).await?))
}

async fn get_user(
    State(server): State<ServerHandle>,
    Path(key): Path<String>,
) -> ApiResult<Option<User>> {
    Ok(Json(server.get_user(key).await?))
}

async fn list_users(State(server): State<ServerHandle>) -> ApiResult<BTreeMap<UserKey, User>> {
    Ok(Json(server.list_users().await?))
}

async fn register_channel(
    State(server): State<ServerHandle>,
    payload: Result<Json<RegisterChannel>, JsonRejection>,
) -> ApiResult<Channel> {
    let RegisterChannel {
        channelname,
        operators,
    } = body(payload)?;
    info!("POST /channel '{}'", channelname);
    Ok(Json(server.register_channel(channelname, operators).await?))
}

async fn get_channel(
    State(server): State<ServerHandle>,
    Path(key): Path<String>,
) -> ApiResult<Option<Channel>> {
    Ok(Json(server.get_channel(key).await?))
}

async fn list_channels(State(server): State<ServerHandle>) -> ApiResult<Vec<Channel>> {
    Ok(Json(server.list_channels().await?))
}

async fn join_channel(
    State(server): State<ServerHandle>,
    payload: Result<Json<JoinChannel>, JsonRejection>,
) -> ApiResult<Channel> {
    let JoinChannel { user, channel } = body(payload)?;
    info!("POST /join {} -> {}", user, channel);
    Ok(Json(server.join(user, channel).await?))
}

async fn send_chat(
    State(server): State<ServerHandle>,
    payload: Result<Json<SendChat>, JsonRejection>,
) -> ApiResult<ChatMessage> {
    let message = body(payload)?.into_message()?;
    Ok(Json(server.send(message).await?))
}

/// `identifier` is `#channel` (percent-encoded as `%23channel`) or `@user`
async fn recv_chat(
    State(server): State<ServerHandle>,
    Path((identifier, cursor)): Path<(String, String)>,
) -> ApiResult<Vec<ChatMessage>> {
    let address: Address = identifier.parse()?;
    let cursor: Timestamp = cursor
        .parse()
        .map_err(|_| AppError::Malformed(format!("Invalid cursor timestamp: {:?}", cursor)))?;

    Ok(Json(server.receive(address, cursor).await?))
}

async fn list_chat_channels(
    State(server): State<ServerHandle>,
) -> ApiResult<BTreeMap<ChannelKey, ChatChannel>> {
    Ok(Json(server.channel_logs().await?))
}

async fn get_chat_channel(
    State(server): State<ServerHandle>,
    Path(key): Path<String>,
) -> ApiResult<Option<ChatChannel>> {
    Ok(Json(server.channel_log(key).await?))
}

async fn list_private_messages(State(server): State<ServerHandle>) -> ApiResult<Mailbox> {
    Ok(Json(server.mailbox().await?))
}

async fn get_private_messages(
    State(server): State<ServerHandle>,
    Path((from, to)): Path<(String, String)>,
) -> ApiResult<Vec<ChatMessage>> {
    Ok(Json(server.conversation(from, to).await?))
}
