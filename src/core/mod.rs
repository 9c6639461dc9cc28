pub mod clean;
pub mod convert;
pub mod encoding;
pub mod etl;
pub mod extract;
pub mod pipeline;
pub mod postprocess;
pub mod script;
pub mod select;
pub mod text;

pub use crate::domain::model::{BatchReport, SourceDocument, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
