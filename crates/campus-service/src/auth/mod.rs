//! Authentication and authorization flow.
//!
//! ## Module Organization
//!
//! - `activation`: one-time activation tokens for new accounts
//! - `authenticate`: login, bearer resolution, logout, password change
//! - `authorize`: role permissions checked through Casbin
//! - `bootstrap`: first administrator account from configuration
//! - `casbin`: Casbin enforcer initialization and depot integration
//! - `depot`: the authenticated user stored per request
//! - `password`: password hashing and verification with Argon2
//! - `token`: random tokens and their stored digests

pub mod activation;
pub mod authenticate;
pub mod authorize;
pub mod bootstrap;
pub mod casbin;
pub mod depot;
pub mod password;
pub mod token;


pub use authorize::{Action, Authorizer, Resource, authorizer_from_depot};
pub use depot::{AuthenticatedUser, DepotUser, get_user_from_depot};
