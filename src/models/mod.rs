pub mod bookmark;
pub mod token;

pub use bookmark::Bookmark;
pub use token::AuthToken;
