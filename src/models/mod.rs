pub mod auth_token;
pub mod feedback;
pub mod progress;
pub mod quiz;
pub mod user;
pub mod workshop;
