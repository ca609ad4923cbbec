//! Declarative Rules Engine
//!
//! Business analysts configure condition/action rules per category
//! (eligibility, code, business_rule, document) without code changes. The
//! engine evaluates every active rule against a fact context built from a
//! claim and produces `ValidationCheck` results.
//!
//! Evaluation is a pure function of (rule set, context): no hidden state,
//! no I/O. A malformed rule (bad regex, unparseable number) evaluates to a
//! non-matching condition, never an error.

pub mod rule;
pub mod context;
pub mod operators;
pub mod engine;
pub mod error;

pub use rule::{
    ActionType, BusinessRule, ConditionLogic, ConditionOperator, RuleAction, RuleCondition,
};
pub use context::RuleContext;
pub use engine::RulesEngine;
pub use error::RuleError;
