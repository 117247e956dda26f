//! POST /notes - create a record from the request body.

use crate::core::note::NoteInput;
use crate::handlers::Response;
use crate::store::WriteGrant;

/// Body returned verbatim when the request carries no usable input.
pub const INVALID_INPUT: &str = "Error, invalid input!";

/// Create a note from a JSON body, echoing the stored record back.
///
/// An empty body or one that does not parse as note input gets a 400
/// with [`INVALID_INPUT`] as the whole body. A parsed input always
/// succeeds validation: missing fields default to empty strings and a
/// missing date is filled with the current time.
pub fn handle(body: &[u8], grant: &WriteGrant) -> Response {
    if body.is_empty() {
        return Response::text(400, INVALID_INPUT.into());
    }
    let input: NoteInput = match serde_json::from_slice(body) {
        Ok(input) => input,
        Err(_) => return Response::text(400, INVALID_INPUT.into()),
    };

    match grant.create(input) {
        Ok(note) => match serde_json::to_string(&note) {
            Ok(body) => Response::json(200, body),
            Err(e) => Response::json(500, format!(r#"{{"error":"{}"}}"#, e)),
        },
        Err(e) => Response::json(500, format!(r#"{{"error":"{}"}}"#, e)),
    }
}
