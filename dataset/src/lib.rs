pub mod backend;
pub mod error;
pub mod mock;
pub mod remote;
pub mod service;
pub mod types;

pub use backend::DataBackend;
pub use error::{Error, Result};
pub use service::DatasetService;
