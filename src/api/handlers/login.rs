use crate::{
    api::pages,
    store::SharedStore,
    verifier::{self, Verdict},
};
use async_trait::async_trait;
use axum::{
    extract::{Extension, Form, FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

/// Submitted login pair, read from a URL-encoded form or a JSON body.
#[derive(ToSchema, Deserialize, Debug)]
pub struct Credentials {
    username: String,
    #[schema(value_type = String)]
    password: SecretString,
}

#[async_trait]
impl<S> FromRequest<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            let Json(credentials) = Json::<Self>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(credentials)
        } else {
            let Form(credentials) = Form::<Self>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(credentials)
        }
    }
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = Credentials, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 200, description = "Verdict rendered as an HTML fragment", body = String, content_type = "text/html"),
        (status = 400, description = "Missing or unreadable payload"),
        (status = 500, description = "Credential store failure"),
    ),
    tag = "login"
)]
// axum handler for login
#[instrument(skip(store, payload))]
pub async fn login(
    Extension(store): Extension<SharedStore>,
    payload: Option<Credentials>,
) -> Response {
    let Some(credentials) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let username = credentials.username;

    match verifier::verify(store.as_ref(), &username, credentials.password).await {
        Ok(Verdict::Accepted) => {
            info!("Login accepted for '{}'", username);

            Html(pages::welcome(&username)).into_response()
        }

        Ok(Verdict::Rejected) => {
            info!("Login rejected for '{}'", username);

            Html(pages::LOGIN_FAILED).into_response()
        }

        Err(e) => {
            error!("Error verifying credentials: {:?}", e);

            (StatusCode::INTERNAL_SERVER_ERROR, pages::INTERNAL_ERROR).into_response()
        }
    }
}
