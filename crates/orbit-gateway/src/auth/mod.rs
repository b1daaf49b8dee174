//! Authentication: bearer tokens and password hashes.

pub mod password;
pub mod token;

pub use token::{Claims, TokenIssuer, TokenPair, TokenType};
