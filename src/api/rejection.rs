use std::convert::Infallible;

use serde_json::json;
use warp::{
    body::BodyDeserializeError,
    http::StatusCode,
    reject::{MethodNotAllowed, PayloadTooLarge, UnsupportedMediaType},
    Rejection, Reply,
};

use crate::error::ApiError;

/// Renders every rejection as a JSON body.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if let Some(e) = err.find::<ApiError>() {
        if e.status().is_server_error() {
            log::error!("{e}");
        }
        (e.status(), e.body())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            json!({ "detail": format!("JSON parse error - {e}") }),
        )
    } else if err.find::<PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            json!({ "detail": "Request body is too large." }),
        )
    } else if err.find::<UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            json!({ "detail": "Unsupported media type in request." }),
        )
    } else if err.find::<MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "detail": "Method not allowed." }),
        )
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, json!({ "detail": "Not found." }))
    } else {
        log::error!("Unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "detail": "A server error occurred." }),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

#[cfg(test)]
mod tests {
    use warp::hyper::body::to_bytes;

    use super::*;

    async fn render(err: Rejection) -> (StatusCode, serde_json::Value) {
        let response = handle_rejection(err).await.unwrap().into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn api_errors_keep_their_shape() {
        let (status, body) = render(ApiError::conflict("You can't subscribe to yourself").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "errors": "You can't subscribe to yourself" }));
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let (status, body) = render(warp::reject::not_found()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "detail": "Not found." }));
    }
}
