//! User registration, log in and log out, and the cookie based session that
//! protects the expense routes.

mod cookie;
mod current_user;
mod log_in;
mod log_out;
mod middleware;
mod register;
mod token;

pub use current_user::get_current_user;
pub use log_in::{Credentials, post_log_in};
pub use log_out::post_log_out;
pub use middleware::{AuthState, auth_guard};
pub use register::register_user;
pub(crate) use cookie::DEFAULT_COOKIE_DURATION;
pub(crate) use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
