pub mod claims;
pub mod cookies;
pub mod extractors;
pub mod jwt;
pub mod password;
pub mod tokens;

pub use extractors::CurrentUser;
pub use jwt::JwtKeys;
