pub mod raster;
pub mod color;
pub mod table;

pub use raster::*;
pub use color::*;
pub use table::*;
