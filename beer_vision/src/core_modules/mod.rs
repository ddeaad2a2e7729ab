pub mod color_range;
pub mod frame;
pub mod mask;
pub mod pixel;
pub mod scoreboard;
