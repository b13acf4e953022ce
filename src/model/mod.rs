pub mod common;
pub mod integration;
pub mod item;
pub mod make_method;
pub mod sync_request;

pub use common::*;
pub use integration::*;
pub use item::*;
pub use make_method::*;
pub use sync_request::*;
