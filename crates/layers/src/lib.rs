pub mod compose;
pub mod layer;
pub mod marker;
pub mod polygons;
pub mod symbology;
pub mod trips;

pub use compose::*;
pub use layer::*;
