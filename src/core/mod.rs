pub mod error;
pub mod evaluator;
pub mod ids;
pub mod models;
pub mod record;
pub mod state;
pub mod types;

pub use error::FilterError;
pub use evaluator::{evaluate, evaluate_group, evaluate_query, sequential_fold};
pub use ids::{GroupIdGenerator, SequentialGroupIds, UuidGroupIds};
pub use models::*;
pub use record::{Record, record_value};
pub use state::FilterState;
pub use types::*;
