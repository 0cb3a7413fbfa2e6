pub mod app;
pub mod entity;
pub mod factory;

#[allow(unused_imports)]
pub use app::{ArticleRepository, NoteRepository, TagRepository, TestApp};
#[allow(unused_imports)]
pub use entity::{article, note, tag};
#[allow(unused_imports)]
pub use factory::Factory;
