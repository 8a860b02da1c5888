pub mod aggregate;
pub mod config;
pub mod dialect;
pub mod error;
pub mod expr_utils;
pub mod lines;
pub mod models;
pub mod registry;
pub mod sql_ast;
pub mod validation;

pub use aggregate::{AggregateBuilder, AggregateSynthesizer, Shape};
pub use config::AggsqlConfig;
pub use dialect::{DatabaseType, Dialect};
pub use error::{AggsqlError, Result};
pub use lines::{Line, Role, Slot};
pub use models::{AggregateRequest, AxisIncrement, AxisSpec};
pub use registry::{NamedRequest, RequestRegistry};
