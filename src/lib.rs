pub mod dirty;
pub mod error;
pub mod geometry;
pub mod items;
pub mod layout;
pub mod loading;
pub mod model;
pub mod phantom;
pub mod render;
pub mod resources;
pub mod surface;
pub mod view;
pub mod viewport;
