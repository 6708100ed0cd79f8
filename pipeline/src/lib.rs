pub mod editor;
pub mod graph;
pub mod interaction;
pub mod library;
pub mod store;
pub mod viewport;
