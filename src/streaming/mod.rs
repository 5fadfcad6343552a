pub mod buildings;
pub mod window;
