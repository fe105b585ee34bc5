use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Value, json};

use staffroom_commands::{ExecutionResult, ProcessError};
use staffroom_core::EntityId;

use crate::app::errors;
use crate::constants::SUCCESS_MESSAGE;

/// Parse an id taken from the path; transient ids never name a saved row.
pub fn parse_id(what: &str, raw: &str) -> Result<EntityId, Response> {
    match raw.trim().parse::<EntityId>() {
        Ok(id) if !id.is_transient() => Ok(id),
        _ => Err(errors::invalid_id(what, raw)),
    }
}

/// Turn a pipeline outcome into a response: rejected commands answer 422 with
/// their errors, handler failures map through the error table.
pub fn command_response<R>(
    outcome: Result<ExecutionResult<R>, ProcessError>,
    status: StatusCode,
    success_message: &str,
    to_json: impl FnOnce(R) -> Value,
) -> Response {
    let result = match outcome {
        Ok(result) => result,
        Err(err) => return errors::process_error_to_response(err),
    };
    match result.into_result() {
        Ok(output) => {
            let mut body = to_json(output);
            if let Value::Object(fields) = &mut body {
                fields.insert(SUCCESS_MESSAGE.to_string(), json!(success_message));
            }
            (status, Json(body)).into_response()
        }
        Err(validation) => errors::validation_failed(&validation),
    }
}
