use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use sitecraft_core::page::FieldError;

use crate::error::ApiError;

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// `Json` with rejections rendered in the API's error format. Well-formed
/// JSON of the wrong shape is a validation error naming the offending field.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(JsonRejection::JsonDataError(err)) => {
                Err(ApiError::Validation(vec![data_error_field(&err.body_text())]))
            }
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// Split a deserialization failure (`<path>: <message> at line L column C`)
/// into the field it concerns and a readable message. Errors on the
/// document root are reported against the missing field when serde names
/// one, otherwise against `body`.
fn data_error_field(text: &str) -> FieldError {
    let detail = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(text);
    let detail = strip_position(detail);

    let (path, message) = match detail.split_once(": ") {
        Some((path, message)) if !path.is_empty() && !path.contains(char::is_whitespace) => {
            (Some(path), message)
        }
        _ => (None, detail),
    };

    let missing = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(name, _)| name);

    let field = match (path, missing) {
        (Some(path), Some(name)) => format!("{path}.{name}"),
        (None, Some(name)) => name.to_string(),
        (Some(path), None) => path.to_string(),
        (None, None) => "body".to_string(),
    };
    FieldError::new(field, message)
}

fn strip_position(detail: &str) -> &str {
    let Some(at) = detail.rfind(" at line ") else {
        return detail;
    };
    let tail = &detail[at + " at line ".len()..];
    let well_formed = tail
        .split_once(" column ")
        .is_some_and(|(line, col)| {
            line.bytes().all(|b| b.is_ascii_digit()) && col.bytes().all(|b| b.is_ascii_digit())
        });
    if well_formed {
        &detail[..at]
    } else {
        detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(detail: &str) -> FieldError {
        data_error_field(&format!("{DATA_ERROR_PREFIX}{detail}"))
    }

    #[test]
    fn wrong_type_names_the_field() {
        let err = field("title: invalid type: integer `5`, expected a string at line 1 column 11");
        assert_eq!(err.field, "title");
        assert_eq!(err.message, "invalid type: integer `5`, expected a string");
    }

    #[test]
    fn nested_paths_are_kept() {
        let err = field("blocks[0].props: invalid type: string \"x\", expected a map at line 1 column 40");
        assert_eq!(err.field, "blocks[0].props");
    }

    #[test]
    fn missing_fields_name_what_is_missing() {
        let err = field("missing field `slug` at line 1 column 17");
        assert_eq!(err.field, "slug");
        assert_eq!(err.message, "missing field `slug`");

        let err = field("seo: missing field `title` at line 1 column 30");
        assert_eq!(err.field, "seo.title");
    }

    #[test]
    fn root_errors_fall_back_to_body() {
        let err = field("invalid type: sequence, expected struct NewPage at line 1 column 0");
        assert_eq!(err.field, "body");
        assert_eq!(err.message, "invalid type: sequence, expected struct NewPage");
    }
}
