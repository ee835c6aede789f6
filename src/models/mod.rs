pub mod ingredient;
pub mod recipe;
pub mod tag;
pub mod user;

pub use ingredient::*;
pub use recipe::*;
pub use tag::*;
pub use user::*;
