//! OpenAPI document for the relay route

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Speak Relay",
        description = "Forwards text to the host text-to-speech engine"
    ),
    paths(crate::handlers::speak::speak_handler),
    tags((name = "speech", description = "Text-to-speech relay"))
)]
pub struct ApiDoc;

pub fn spec_yaml() -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&ApiDoc::openapi())
}

pub fn spec_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}
