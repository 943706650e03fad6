pub mod canvas;
pub mod input;
pub mod viewer;
