pub mod input;
pub mod lifecycle;
pub mod signal;
pub mod time;
pub mod window;
