pub mod camera;
pub mod home;
pub mod predict;
pub mod upload;
