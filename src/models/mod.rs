pub mod contact;
pub mod posts;
pub mod response;
pub mod users;
