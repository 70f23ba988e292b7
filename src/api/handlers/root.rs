use crate::api::pages;
use axum::response::{Html, IntoResponse};

#[utoipa::path(
    get,
    path = "/",
    responses (
        (status = 200, description = "Login form", body = String, content_type = "text/html"),
    ),
    tag = "login"
)]
// axum handler for the login form
pub async fn root() -> impl IntoResponse {
    Html(pages::LOGIN_FORM)
}
