use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::messages::list_messages,
        crate::routes::messages::create_message,
        crate::routes::stream::message_stream
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::routes::health::HealthResponse
    )),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Messages", description = "Conversation messages and live streams")
    )
)]
pub struct ApiDoc;
