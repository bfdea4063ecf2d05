use std::convert::Infallible;
use warp::Reply;

pub async fn health() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&serde_json::json!({ "status": "ok" })))
}
