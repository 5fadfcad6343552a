pub mod demos;
pub mod entity;
pub mod io;
pub mod network;
pub mod pool;
pub mod random;
pub mod scene;
pub mod settings;
pub mod streaming;
pub mod util;
