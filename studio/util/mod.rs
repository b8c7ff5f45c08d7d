pub mod form;
pub mod multipart;
