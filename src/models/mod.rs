pub mod category;
pub mod post;
pub mod rating;
pub mod reaction;
pub mod settings;
pub mod tag;
