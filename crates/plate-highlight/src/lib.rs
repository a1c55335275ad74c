mod command;
mod config;
mod document;
mod editor;
mod error;
mod highlight;
mod ops;
mod schema;
mod selection;

pub use crate::command::*;
pub use crate::config::*;
pub use crate::document::*;
pub use crate::editor::*;
pub use crate::error::*;
pub use crate::highlight::*;
pub use crate::ops::*;
pub use crate::schema::*;
pub use crate::selection::*;
