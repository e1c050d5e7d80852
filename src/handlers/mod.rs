pub mod auth;
pub mod contact;
pub mod pages;
pub mod posts;
