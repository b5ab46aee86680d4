//! Match function logic
//!
//! Rule parsing and validation, the ticket accumulators that turn pooled
//! tickets into matches and backfill proposals, and the gRPC service that
//! drives them from the request streams.

mod backfill;
mod builder;
mod rules;
mod service;

pub use backfill::BackfillBuilder;
pub use builder::MatchBuilder;
pub use rules::{AllianceRule, GameRules};
pub use service::{MatchFunctionService, run_backfill_matches, run_make_matches};

use prost_types::value::Kind;
use prost_types::{Struct, Value};

pub(crate) fn string_value(s: impl Into<String>) -> Value {
    Value {
        kind: Some(Kind::StringValue(s.into())),
    }
}

pub(crate) fn number_value(n: f64) -> Value {
    Value {
        kind: Some(Kind::NumberValue(n)),
    }
}

pub(crate) fn struct_is_empty(s: Option<&Struct>) -> bool {
    s.is_none_or(|s| s.fields.is_empty())
}
