use uuid::Uuid;

use crate::db::error::{DbError, DbResult};

/// Decode a TEXT-stored id column into a Uuid. A row that fails to parse
/// indicates corrupt data, surfaced as an internal error.
pub fn parse_uuid(s: &str) -> DbResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DbError::Internal(format!("malformed uuid column: {}", e)))
}
