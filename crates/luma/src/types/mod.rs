mod position;
mod value;

pub use position::Position;
pub use value::{Mapping, Value, format_number};
