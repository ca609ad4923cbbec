//! Document completeness checking
//!
//! Each procedure carries a required-document list. The checker unions the
//! requirements across all billed procedures, normalizes the labels of the
//! documents actually received, and reports what is missing in priority
//! order.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use domain_claims::{CheckCategory, Claim, ValidationCheck};

/// Priority of a required document; ordering is Low < Medium < High
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentPriority {
    Low,
    Medium,
    High,
}

/// Completeness of a claim's documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentCompleteness {
    /// Every required document is attached
    Complete,
    /// Only medium/low priority documents are missing
    Warning,
    /// At least one high-priority document is missing
    Incomplete,
}

/// A required document the claim does not carry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingDocument {
    /// Canonical document type, e.g. "operative_notes"
    pub document_type: String,
    pub priority: DocumentPriority,
    /// Why this procedure requires the document
    pub reason: String,
}

/// Result of a document completeness pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// Canonical types of the documents actually attached
    pub received: Vec<String>,
    /// Required but absent, sorted by descending priority
    pub missing: Vec<MissingDocument>,
    pub status: DocumentCompleteness,
}

impl DocumentOutcome {
    /// Renders the outcome as persistable validation checks: one per
    /// missing document plus a summary completeness check
    pub fn to_checks(&self) -> Vec<ValidationCheck> {
        let mut checks: Vec<ValidationCheck> = self
            .missing
            .iter()
            .map(|m| {
                let description = format!("Required document: {}", m.document_type);
                match m.priority {
                    DocumentPriority::High => ValidationCheck::fail(
                        CheckCategory::Document,
                        format!("missing_{}", m.document_type),
                        description,
                        m.reason.clone(),
                    ),
                    _ => ValidationCheck::warning(
                        CheckCategory::Document,
                        format!("missing_{}", m.document_type),
                        description,
                        m.reason.clone(),
                    ),
                }
            })
            .collect();

        if checks.is_empty() {
            checks.push(ValidationCheck::pass(
                CheckCategory::Document,
                "document_completeness",
                "All required documents are attached",
            ));
        }
        checks
    }
}

struct RequiredDocument {
    document_type: &'static str,
    priority: DocumentPriority,
    reason: &'static str,
}

const fn required(
    document_type: &'static str,
    priority: DocumentPriority,
    reason: &'static str,
) -> RequiredDocument {
    RequiredDocument {
        document_type,
        priority,
        reason,
    }
}

/// Procedure code to its required documents
static REQUIRED_DOCUMENTS: Lazy<HashMap<&'static str, Vec<RequiredDocument>>> = Lazy::new(|| {
    use DocumentPriority::{High, Medium};
    HashMap::from([
        (
            "27447",
            vec![
                required(
                    "prior_authorization",
                    High,
                    "Prior authorization is required for total knee arthroplasty",
                ),
                required(
                    "operative_notes",
                    High,
                    "Operative report documents the procedure performed",
                ),
                required(
                    "history_and_physical",
                    Medium,
                    "History and physical supports surgical necessity",
                ),
                required(
                    "medical_necessity",
                    Medium,
                    "Medical necessity documentation supports approval",
                ),
            ],
        ),
        (
            "29881",
            vec![
                required(
                    "operative_notes",
                    High,
                    "Operative report documents the arthroscopy performed",
                ),
                required(
                    "imaging_report",
                    Medium,
                    "Imaging supports the meniscectomy indication",
                ),
            ],
        ),
        (
            "93458",
            vec![
                required(
                    "prior_authorization",
                    High,
                    "Prior authorization is required for cardiac catheterization",
                ),
                required(
                    "procedure_report",
                    Medium,
                    "Catheterization report documents findings",
                ),
            ],
        ),
    ])
});

/// Received-label normalization: raw type labels seen in uploads to the
/// canonical names used in the requirement tables
static TYPE_NAME_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("operative report", "operative_notes"),
        ("op note", "operative_notes"),
        ("authorization letter", "prior_authorization"),
        ("auth letter", "prior_authorization"),
        ("h&p", "history_and_physical"),
        ("letter of medical necessity", "medical_necessity"),
        ("imaging", "imaging_report"),
        ("radiology report", "imaging_report"),
        ("cath report", "procedure_report"),
    ])
});

/// Normalizes a received document-type label to its canonical form
fn normalize_label(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    match TYPE_NAME_MAP.get(lowered.as_str()) {
        Some(canonical) => canonical.to_string(),
        None => lowered.replace([' ', '-'], "_"),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentChecker;

impl DocumentChecker {
    pub fn new() -> Self {
        Self
    }

    /// Checks a claim's documentation against its billed procedures
    pub fn check(&self, claim: &Claim) -> DocumentOutcome {
        self.check_labels(&claim.procedure_codes(), &claim.document_type_labels())
    }

    /// Checks explicit procedure codes against received type labels,
    /// independent of a claim snapshot
    pub fn check_labels(&self, procedure_codes: &[&str], received_labels: &[String]) -> DocumentOutcome {
        let received: Vec<String> = received_labels.iter().map(|l| normalize_label(l)).collect();

        // Union requirements across procedures, keeping the highest
        // priority seen per document type
        let mut required_by_type: HashMap<&'static str, (&RequiredDocument, DocumentPriority)> =
            HashMap::new();
        for code in procedure_codes {
            let Some(requirements) = REQUIRED_DOCUMENTS.get(code) else {
                continue;
            };
            for req in requirements {
                required_by_type
                    .entry(req.document_type)
                    .and_modify(|(existing, priority)| {
                        if req.priority > *priority {
                            *existing = req;
                            *priority = req.priority;
                        }
                    })
                    .or_insert((req, req.priority));
            }
        }

        let mut missing: Vec<MissingDocument> = required_by_type
            .values()
            .filter(|(req, _)| !received.iter().any(|r| r == req.document_type))
            .map(|(req, priority)| MissingDocument {
                document_type: req.document_type.to_string(),
                priority: *priority,
                reason: req.reason.to_string(),
            })
            .collect();
        missing.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.document_type.cmp(&b.document_type)));

        let status = if missing.iter().any(|m| m.priority == DocumentPriority::High) {
            DocumentCompleteness::Incomplete
        } else if missing.iter().any(|m| m.priority == DocumentPriority::Medium) {
            DocumentCompleteness::Warning
        } else {
            DocumentCompleteness::Complete
        };

        debug!(?status, missing = missing.len(), "documents checked");
        DocumentOutcome {
            received,
            missing,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_types(outcome: &DocumentOutcome) -> Vec<(&str, DocumentPriority)> {
        outcome
            .missing
            .iter()
            .map(|m| (m.document_type.as_str(), m.priority))
            .collect()
    }

    #[test]
    fn test_knee_replacement_with_no_documents() {
        let outcome = DocumentChecker::new().check_labels(&["27447"], &[]);

        assert_eq!(outcome.status, DocumentCompleteness::Incomplete);
        let missing = missing_types(&outcome);
        assert_eq!(
            missing,
            vec![
                ("operative_notes", DocumentPriority::High),
                ("prior_authorization", DocumentPriority::High),
                ("history_and_physical", DocumentPriority::Medium),
                ("medical_necessity", DocumentPriority::Medium),
            ]
        );
    }

    #[test]
    fn test_received_labels_are_normalized() {
        let received = vec![
            "Operative Report".to_string(),
            "Auth Letter".to_string(),
            "H&P".to_string(),
            "Letter of Medical Necessity".to_string(),
        ];
        let outcome = DocumentChecker::new().check_labels(&["27447"], &received);

        assert_eq!(outcome.status, DocumentCompleteness::Complete);
        assert!(outcome.missing.is_empty());
        assert!(outcome.received.contains(&"operative_notes".to_string()));
    }

    #[test]
    fn test_medium_only_missing_is_warning() {
        let received = vec![
            "operative_notes".to_string(),
            "prior_authorization".to_string(),
        ];
        let outcome = DocumentChecker::new().check_labels(&["27447"], &received);

        assert_eq!(outcome.status, DocumentCompleteness::Warning);
        assert!(outcome
            .missing
            .iter()
            .all(|m| m.priority == DocumentPriority::Medium));
    }

    #[test]
    fn test_union_keeps_highest_priority() {
        // 27447 wants prior_authorization HIGH; a second procedure with no
        // table entry does not disturb that
        let outcome = DocumentChecker::new().check_labels(&["27447", "29881", "99213"], &[]);

        let auth = outcome
            .missing
            .iter()
            .find(|m| m.document_type == "prior_authorization")
            .unwrap();
        assert_eq!(auth.priority, DocumentPriority::High);

        // operative_notes required by both procedures appears once
        let op_notes = outcome
            .missing
            .iter()
            .filter(|m| m.document_type == "operative_notes")
            .count();
        assert_eq!(op_notes, 1);
    }

    #[test]
    fn test_unlisted_procedure_is_complete() {
        let outcome = DocumentChecker::new().check_labels(&["99213"], &[]);
        assert_eq!(outcome.status, DocumentCompleteness::Complete);
        assert!(outcome.missing.is_empty());
    }

    #[test]
    fn test_to_checks_fail_for_high_warning_for_medium() {
        use domain_claims::CheckStatus;

        let outcome = DocumentChecker::new().check_labels(&["27447"], &[]);
        let checks = outcome.to_checks();
        assert_eq!(checks.len(), 4);
        assert_eq!(checks[0].status, CheckStatus::Fail);
        assert_eq!(checks[3].status, CheckStatus::Warning);

        let complete = DocumentChecker::new().check_labels(&["99213"], &[]);
        let checks = complete.to_checks();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].status, CheckStatus::Pass);
    }
}
