pub mod color;
pub mod points;

pub use color::{int_to_rgba, rgba, rgba_to_int};
pub use points::{parse_points, points_to_string};
