pub mod form;
pub mod post;
pub mod user;
