//! Business rule definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::RuleId;
use domain_claims::CheckCategory;

/// How a rule's conditions are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionLogic {
    /// Every condition must hold
    And,
    /// At least one condition must hold
    Or,
}

/// Operator applied to a resolved field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    InList,
    NotInList,
    Regex,
    IsEmpty,
    IsNotEmpty,
    IsValidNpi,
    IsValidDate,
    IsValidIcd10,
    IsValidCpt,
}

/// A single condition within a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Field reference: `_`-prefixed metadata key, a reserved context name
    /// ("Total Charges", "Date of Service", "Document Type"), or an
    /// extracted-field label matched exactly and case-insensitively
    pub field: String,
    /// Operator
    pub operator: ConditionOperator,
    /// Comparison value; an array for the list operators, ignored by the
    /// unary operators
    #[serde(default)]
    pub value: Value,
    /// String comparisons and regex match case-insensitively unless set
    #[serde(default)]
    pub case_sensitive: bool,
}

impl RuleCondition {
    pub fn new(field: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            case_sensitive: false,
        }
    }

    /// Unary condition with no comparison value
    pub fn unary(field: impl Into<String>, operator: ConditionOperator) -> Self {
        Self::new(field, operator, Value::Null)
    }
}

/// What a selected action does to the produced check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Pass,
    Fail,
    Warning,
    SetValue,
    RequireField,
}

impl ActionType {
    /// Maps the action type onto a check status: pass and fail map
    /// directly, everything else surfaces as a warning
    pub fn check_status(&self) -> domain_claims::CheckStatus {
        match self {
            ActionType::Pass => domain_claims::CheckStatus::Pass,
            ActionType::Fail => domain_claims::CheckStatus::Fail,
            _ => domain_claims::CheckStatus::Warning,
        }
    }
}

/// An action attached to a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub message: String,
}

impl RuleAction {
    pub fn new(action_type: ActionType, message: impl Into<String>) -> Self {
        Self {
            action_type,
            message: message.into(),
        }
    }
}

/// A declarative business rule
///
/// Exactly one action is selected per evaluation: the first if the
/// combined conditions pass, otherwise the second (or the first again if
/// only one is defined).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRule {
    pub id: RuleId,
    pub name: String,
    pub category: CheckCategory,
    pub conditions: Vec<RuleCondition>,
    pub condition_logic: ConditionLogic,
    pub actions: Vec<RuleAction>,
    /// Lower priority evaluates first
    pub priority: i32,
    pub is_active: bool,
}

impl BusinessRule {
    pub fn new(
        name: impl Into<String>,
        category: CheckCategory,
        conditions: Vec<RuleCondition>,
        condition_logic: ConditionLogic,
        actions: Vec<RuleAction>,
    ) -> Self {
        Self {
            id: RuleId::new_v7(),
            name: name.into(),
            category,
            conditions,
            condition_logic,
            actions,
            priority: 100,
            is_active: true,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}
