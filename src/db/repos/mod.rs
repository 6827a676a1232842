mod accounts;
mod content;

pub use accounts::*;
pub use content::*;
