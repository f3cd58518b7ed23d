pub mod admin;
pub mod enums;
pub mod record;
pub mod token;

pub use admin::*;
pub use enums::*;
pub use record::*;
pub use token::*;
