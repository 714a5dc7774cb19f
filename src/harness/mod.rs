pub mod arguments;
pub mod line_frames;
