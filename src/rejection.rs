//! Turns axum's extractor rejections into [Error]s so that every error
//! response has the same JSON shape.

use axum::{
    Json,
    extract::{
        Path,
        rejection::{JsonRejection, PathRejection},
    },
};

use crate::Error;

/// Unwrap a JSON body, turning any rejection into an [Error::InvalidJson].
///
/// Axum rejects bodies with the wrong shape with 422 and bodies without a
/// JSON content type with 415; this API reports both as a 400 validation error.
pub(crate) fn parse_json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {rejection}");
            Err(Error::InvalidJson(rejection.body_text()))
        }
    }
}

/// Unwrap a path parameter, turning any rejection into an [Error::InvalidPath].
pub(crate) fn parse_path_param<T>(param: Result<Path<T>, PathRejection>) -> Result<T, Error> {
    match param {
        Ok(Path(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected path parameter: {rejection}");
            Err(Error::InvalidPath(rejection.body_text()))
        }
    }
}
