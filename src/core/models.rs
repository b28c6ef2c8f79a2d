pub mod option;
pub mod response;
pub mod survey;
pub mod user;
