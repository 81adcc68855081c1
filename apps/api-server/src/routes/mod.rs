mod caption;
mod page;

use crate::Ctx;
use axum::{
    routing::{get, post},
    Router,
};

pub fn get_routes(ctx: Ctx) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/api/caption", post(caption::generate))
        .with_state(ctx)
}
