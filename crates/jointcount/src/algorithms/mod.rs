pub mod masking;
pub mod joint_count;
pub mod green_screen;

pub use masking::*;
pub use joint_count::*;
pub use green_screen::*;
