pub mod coerce;
pub mod config;
pub mod format;
pub mod fragment;
pub mod handler;
pub mod interpret;
pub mod ops;
pub mod output;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use coerce::coerce;
pub use config::{Config, PopulateSpec};
pub use format::format_operator;
pub use fragment::Fragment;
pub use handler::{PageSort, QueryDescriptor, QueryHandler};
pub use interpret::{Diagnostic, Interpretation, interpret};
pub use ops::{ArgShape, arg_shape, is_operator_token};
pub use value::Value;
