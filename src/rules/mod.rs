//! Engine rules and the codec that builds them from tool arguments.

pub mod codec;
pub mod model;

pub use codec::{convert_to_rule, format_parameters, EMPTY_TEMPLATE};
pub use model::RuleModel;
