mod activities;
mod images;
mod messages;
mod profiles;
mod push;
mod settings;
mod songs;

pub use messages::NewMessageRecord;

use anyhow::Result;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
