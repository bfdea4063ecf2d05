pub mod chat;
pub mod classify;
pub mod health;

use phyto_core::wire::ErrorResponse;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

pub(crate) fn error_reply(status: StatusCode, message: impl Into<String>) -> Response {
    warp::reply::with_status(warp::reply::json(&ErrorResponse::new(message)), status).into_response()
}
