pub mod follower_system;
