pub mod analysis;
pub mod job;
pub mod profile;
pub mod user;
