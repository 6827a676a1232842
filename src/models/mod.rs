mod account;
mod content;

pub use account::*;
pub use content::*;
