pub mod aggregate;
pub mod collector;
pub mod etl;
pub mod pipeline;
pub mod report;

pub use crate::domain::model::{Extraction, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
