//! Types stored in the server-side session.

pub mod session;

pub use session::{AccessToken, CurrentUser, RefreshToken, keys};
