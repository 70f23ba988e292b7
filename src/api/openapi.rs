use super::handlers;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root::root,
        handlers::login::login,
        handlers::health::health,
    ),
    components(schemas(handlers::login::Credentials, handlers::health::Health)),
    tags(
        (name = "login", description = "Login form and credential verification"),
        (name = "health", description = "Service and credential store status"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = env!("CARGO_PKG_NAME").to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc
}
