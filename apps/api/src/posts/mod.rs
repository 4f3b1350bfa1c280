//! Form intake and post history: the intent form, the user's past posts,
//! liked posts, and reviewed drafts with feedback.

pub mod handlers;
pub mod store;
