mod accounts;
mod common;
mod content;

pub use accounts::SqliteAccountRepo;
pub use content::SqliteContentRepo;
