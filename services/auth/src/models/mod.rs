//! Data models for the authentication service

pub mod user;

pub use user::{ChangePassword, LoginCredentials, NewUser, UpdateProfile, User, UserResponse};
