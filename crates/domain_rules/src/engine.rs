//! Rule registry and evaluator

use tracing::{debug, warn};

use core_kernel::RuleId;
use domain_claims::{CheckCategory, ValidationCheck};

use crate::context::RuleContext;
use crate::error::RuleError;
use crate::operators;
use crate::rule::{BusinessRule, ConditionLogic, RuleAction};

/// Holds a priority-ordered, mutable set of business rules
///
/// The registry is plain data; callers that share an engine across
/// concurrent workflows wrap it in a lock.
#[derive(Debug, Default)]
pub struct RulesEngine {
    rules: Vec<BusinessRule>,
}

impl RulesEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Inserts a rule and re-sorts the registry by ascending priority
    pub fn add_rule(&mut self, rule: BusinessRule) {
        self.rules.push(rule);
        self.rules.sort_by_key(|r| r.priority);
    }

    /// Removes a rule by id; returns the removed rule if it existed
    pub fn remove_rule(&mut self, id: RuleId) -> Option<BusinessRule> {
        let pos = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(pos))
    }

    /// Replaces a rule in place by id
    pub fn update_rule(&mut self, rule: BusinessRule) -> Result<(), RuleError> {
        let pos = self
            .rules
            .iter()
            .position(|r| r.id == rule.id)
            .ok_or_else(|| RuleError::RuleNotFound(rule.id.to_string()))?;
        self.rules[pos] = rule;
        self.rules.sort_by_key(|r| r.priority);
        Ok(())
    }

    /// Returns all rules, active and inactive, in priority order
    pub fn get_rules(&self) -> &[BusinessRule] {
        &self.rules
    }

    /// Evaluates every active rule against the context
    pub fn execute(&self, context: &RuleContext) -> Vec<ValidationCheck> {
        self.rules
            .iter()
            .filter(|r| r.is_active)
            .filter_map(|r| self.evaluate_rule(r, context))
            .collect()
    }

    /// Evaluates active rules of a single category
    ///
    /// This is how the orchestrator runs the declarative eligibility, code,
    /// business-rule, and document passes independently per stage.
    pub fn execute_by_category(
        &self,
        context: &RuleContext,
        category: CheckCategory,
    ) -> Vec<ValidationCheck> {
        self.rules
            .iter()
            .filter(|r| r.is_active && r.category == category)
            .filter_map(|r| self.evaluate_rule(r, context))
            .collect()
    }

    /// Evaluates a single rule to a check, or None if the rule defines no
    /// actions (a configuration error, logged and skipped)
    fn evaluate_rule(&self, rule: &BusinessRule, context: &RuleContext) -> Option<ValidationCheck> {
        let passed = self.conditions_hold(rule, context);
        let action = Self::select_action(rule, passed)?;

        debug!(rule = %rule.name, passed, action = ?action.action_type, "rule evaluated");

        Some(ValidationCheck::new(
            rule.category,
            rule.name.clone(),
            format!("Business rule: {}", rule.name),
            action.action_type.check_status(),
            Some(action.message.clone()),
        ))
    }

    fn conditions_hold(&self, rule: &BusinessRule, context: &RuleContext) -> bool {
        let mut results = rule.conditions.iter().map(|c| {
            let actual = context.resolve(&c.field);
            operators::evaluate(c.operator, actual.as_deref(), &c.value, c.case_sensitive)
        });
        match rule.condition_logic {
            ConditionLogic::And => results.all(|r| r),
            ConditionLogic::Or => results.any(|r| r),
        }
    }

    /// Selects exactly one action: the first on pass, otherwise the second
    /// (falling back to the first if only one is defined)
    fn select_action(rule: &BusinessRule, passed: bool) -> Option<&RuleAction> {
        if rule.actions.is_empty() {
            warn!(rule = %rule.name, "rule has no actions; skipping");
            return None;
        }
        if passed {
            rule.actions.first()
        } else {
            rule.actions.get(1).or_else(|| rule.actions.first())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{ActionType, ConditionOperator, RuleCondition};
    use domain_claims::CheckStatus;
    use serde_json::json;

    fn member_id_rule() -> BusinessRule {
        BusinessRule::new(
            "member_id_present",
            CheckCategory::Eligibility,
            vec![RuleCondition::unary(
                "Member ID",
                ConditionOperator::IsNotEmpty,
            )],
            ConditionLogic::And,
            vec![
                RuleAction::new(ActionType::Pass, "Member ID present"),
                RuleAction::new(ActionType::Fail, "Member ID is missing"),
            ],
        )
    }

    fn context_with_member_id() -> RuleContext {
        use domain_claims::{ExtractedField, FieldCategory, FieldIndex};
        let fields = FieldIndex::build(&[ExtractedField::new(
            FieldCategory::Patient,
            "Member ID",
            "MBR-1",
            90,
        )]);
        RuleContext::new(fields)
    }

    #[test]
    fn test_priority_ordering_after_add() {
        let mut engine = RulesEngine::new();
        engine.add_rule(member_id_rule().with_priority(50));
        engine.add_rule(member_id_rule().with_priority(10));
        engine.add_rule(member_id_rule().with_priority(30));

        let priorities: Vec<i32> = engine.get_rules().iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![10, 30, 50]);
    }

    #[test]
    fn test_first_action_on_pass_second_on_fail() {
        let mut engine = RulesEngine::new();
        engine.add_rule(member_id_rule());

        let checks = engine.execute(&context_with_member_id());
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].status, CheckStatus::Pass);

        let empty = RuleContext::new(Default::default());
        let checks = engine.execute(&empty);
        assert_eq!(checks[0].status, CheckStatus::Fail);
        assert_eq!(checks[0].details.as_deref(), Some("Member ID is missing"));
    }

    #[test]
    fn test_single_action_selected_on_fail() {
        let mut engine = RulesEngine::new();
        let mut rule = member_id_rule();
        rule.actions.truncate(1);
        engine.add_rule(rule);

        let empty = RuleContext::new(Default::default());
        let checks = engine.execute(&empty);
        // Only one action defined: selected regardless of outcome
        assert_eq!(checks[0].status, CheckStatus::Pass);
    }

    #[test]
    fn test_inactive_rules_are_skipped() {
        let mut engine = RulesEngine::new();
        engine.add_rule(member_id_rule().inactive());

        assert!(engine.execute(&context_with_member_id()).is_empty());
        assert_eq!(engine.get_rules().len(), 1);
    }

    #[test]
    fn test_execute_by_category_filters() {
        let mut engine = RulesEngine::new();
        engine.add_rule(member_id_rule());
        let mut doc_rule = member_id_rule();
        doc_rule.category = CheckCategory::Document;
        doc_rule.name = "doc_rule".to_string();
        engine.add_rule(doc_rule);

        let ctx = context_with_member_id();
        let eligibility = engine.execute_by_category(&ctx, CheckCategory::Eligibility);
        assert_eq!(eligibility.len(), 1);
        assert_eq!(eligibility[0].name, "member_id_present");

        let documents = engine.execute_by_category(&ctx, CheckCategory::Document);
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].name, "doc_rule");
    }

    #[test]
    fn test_remove_and_update() {
        let mut engine = RulesEngine::new();
        let rule = member_id_rule();
        let id = rule.id;
        engine.add_rule(rule);

        let mut updated = engine.get_rules()[0].clone();
        updated.name = "renamed".to_string();
        engine.update_rule(updated).unwrap();
        assert_eq!(engine.get_rules()[0].name, "renamed");

        assert!(engine.remove_rule(id).is_some());
        assert!(engine.get_rules().is_empty());
        assert!(engine.remove_rule(id).is_none());
    }

    #[test]
    fn test_or_logic() {
        let mut engine = RulesEngine::new();
        let rule = BusinessRule::new(
            "either_charge_band",
            CheckCategory::BusinessRule,
            vec![
                RuleCondition::new("Total Charges", ConditionOperator::GreaterThan, json!(100000)),
                RuleCondition::new("Total Charges", ConditionOperator::LessThan, json!(1)),
            ],
            ConditionLogic::Or,
            vec![
                RuleAction::new(ActionType::Warning, "Charge amount is an outlier"),
                RuleAction::new(ActionType::Pass, "Charges in normal band"),
            ],
        );
        engine.add_rule(rule);

        use core_kernel::Money;
        use rust_decimal_macros::dec;
        let ctx = RuleContext::new(Default::default()).with_total_charges(Money::usd(dec!(500)));
        let checks = engine.execute(&ctx);
        assert_eq!(checks[0].status, CheckStatus::Pass);

        let ctx = RuleContext::new(Default::default()).with_total_charges(Money::usd(dec!(0.5)));
        let checks = engine.execute(&ctx);
        assert_eq!(checks[0].status, CheckStatus::Warning);
    }
}
