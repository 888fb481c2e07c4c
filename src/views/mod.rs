//! Web interface components for the fund admin dashboard
//!
//! This module contains the Dioxus components that make up the dashboard,
//! including navigation, the user list and detail pages, the operation
//! modals and the authentication pages.

/// Navigation bar component
mod navbar;
pub use navbar::Navbar;

/// Route guard for signed-in pages
mod guard;
pub use guard::Protected;

/// Home page component
mod home;
pub use home::Home;

/// Paginated user list
mod users;
pub use users::AllUsers;

/// User detail page
mod user;
pub use user::ViewUser;

/// Movements ledger of one user
mod account;

/// Operation modal components
mod actions;

/// Multi-select filter dropdown
mod multi_select;

/// Small shared building blocks
mod widgets;

/// Sign in and password recovery pages
mod auth;
pub use auth::{ForgotPassword, ResetPassword, SignIn};
