pub mod blog;
pub mod donations;
pub mod events;
pub mod members;
pub mod prayer_requests;
pub mod resources;
pub mod root;
pub mod sermons;
pub mod testimonies;
