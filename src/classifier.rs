//! Input Classifier
//!
//! Classifies user input as either:
//! - Tax id (RUC): 10 to 13 digits once whitespace is removed
//! - Company name: anything else
//!
//! Also resolves quick actions, so every entry point ends up as one
//! `AnalysisTarget` for the orchestrator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedInput {
    TaxId(String),
    Name(String),
}

const TAX_ID_MIN_DIGITS: usize = 10;
const TAX_ID_MAX_DIGITS: usize = 13;

/// Input classifier
pub struct InputClassifier;

impl InputClassifier {
    /// Classify raw user input. Never fails: anything that is not a
    /// well-sized digit run is a name.
    pub fn classify(raw: &str) -> ClassifiedInput {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

        if is_tax_id(&compact) {
            ClassifiedInput::TaxId(compact)
        } else {
            ClassifiedInput::Name(raw.trim().to_string())
        }
    }
}

fn is_tax_id(compact: &str) -> bool {
    (TAX_ID_MIN_DIGITS..=TAX_ID_MAX_DIGITS).contains(&compact.len())
        && compact.chars().all(|c| c.is_ascii_digit())
}

//
// ================= Quick Actions =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickAction {
    Demo,
    TechStart,
    Comercial,
    Manufactura,
}

impl QuickAction {
    pub const ALL: [QuickAction; 4] = [
        QuickAction::Demo,
        QuickAction::TechStart,
        QuickAction::Comercial,
        QuickAction::Manufactura,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "demo" => Some(QuickAction::Demo),
            "techstart" => Some(QuickAction::TechStart),
            "comercial" => Some(QuickAction::Comercial),
            "manufactura" => Some(QuickAction::Manufactura),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            QuickAction::Demo => "demo",
            QuickAction::TechStart => "techstart",
            QuickAction::Comercial => "comercial",
            QuickAction::Manufactura => "manufactura",
        }
    }

    /// Text recorded as the user's message when the action fires
    pub fn user_text(&self) -> &'static str {
        match self {
            QuickAction::Demo => "📊 Mostrar datos de demostración",
            QuickAction::TechStart => "TechStart Ecuador S.A.",
            QuickAction::Comercial => "Comercial Los Andes",
            QuickAction::Manufactura => "Manufactura Moderna S.A.",
        }
    }

    pub fn target(&self) -> AnalysisTarget {
        let prefilled = |name: &str, tax_id: &str| AnalysisTarget::Prefilled {
            name: name.to_string(),
            tax_id: tax_id.to_string(),
        };

        match self {
            QuickAction::Demo => AnalysisTarget::DemoListing,
            QuickAction::TechStart => prefilled("TechStart Ecuador S.A.", "1791234567001"),
            QuickAction::Comercial => prefilled("Comercial Los Andes", "0987654321001"),
            QuickAction::Manufactura => prefilled("Manufactura Moderna S.A.", "1122334455001"),
        }
    }
}

//
// ================= Submission =================
//

/// What the degradation ladder runs for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisTarget {
    /// Classified tax id: search first, then analyse
    Lookup { tax_id: String },
    /// Bare company name: analyse with a synthetic tax id
    Named { name: String },
    /// Quick-action company: analyse directly
    Prefilled { name: String, tax_id: String },
    /// Demo listing only
    DemoListing,
}

/// Single entry point for free text and quick actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Text(String),
    Quick(QuickAction),
}

impl Submission {
    /// Returns the user-visible message and the ladder target, or `None`
    /// for blank input.
    pub fn resolve(&self) -> Option<(String, AnalysisTarget)> {
        match self {
            Submission::Text(raw) => {
                let text = raw.trim();
                if text.is_empty() {
                    return None;
                }
                let target = match InputClassifier::classify(text) {
                    ClassifiedInput::TaxId(tax_id) => AnalysisTarget::Lookup { tax_id },
                    ClassifiedInput::Name(name) => AnalysisTarget::Named { name },
                };
                Some((text.to_string(), target))
            }
            Submission::Quick(action) => Some((action.user_text().to_string(), action.target())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_id_lengths() {
        for digits in ["1791234567", "17912345670", "179123456700", "1791234567001"] {
            assert_eq!(
                InputClassifier::classify(digits),
                ClassifiedInput::TaxId(digits.to_string())
            );
        }
    }

    #[test]
    fn test_tax_id_with_interior_whitespace() {
        assert_eq!(
            InputClassifier::classify("  1791 2345 67001 "),
            ClassifiedInput::TaxId("1791234567001".to_string())
        );
        assert_eq!(
            InputClassifier::classify("179123\t4567"),
            ClassifiedInput::TaxId("1791234567".to_string())
        );
    }

    #[test]
    fn test_names() {
        let cases = vec![
            "TechStart Ecuador S.A.",
            "179123456",       // 9 digits
            "17912345670012",  // 14 digits
            "179-123-4567",
            "RUC 1791234567001",
            "１７９１２３４５６７", // full-width digits are not ASCII
        ];

        for c in cases {
            assert_eq!(
                InputClassifier::classify(c),
                ClassifiedInput::Name(c.trim().to_string()),
                "input {:?}",
                c
            );
        }
    }

    #[test]
    fn test_blank_submission_resolves_to_none() {
        assert!(Submission::Text(String::new()).resolve().is_none());
        assert!(Submission::Text("   \n\t".into()).resolve().is_none());
    }

    #[test]
    fn test_text_submission_targets() {
        let (text, target) = Submission::Text(" 1791234567001 ".into()).resolve().unwrap();
        assert_eq!(text, "1791234567001");
        assert_eq!(
            target,
            AnalysisTarget::Lookup { tax_id: "1791234567001".into() }
        );

        let (_, target) = Submission::Text("Comercial Los Andes".into()).resolve().unwrap();
        assert_eq!(
            target,
            AnalysisTarget::Named { name: "Comercial Los Andes".into() }
        );
    }

    #[test]
    fn test_quick_actions_skip_classification() {
        let (text, target) = Submission::Quick(QuickAction::TechStart).resolve().unwrap();
        assert_eq!(text, "TechStart Ecuador S.A.");
        assert_eq!(
            target,
            AnalysisTarget::Prefilled {
                name: "TechStart Ecuador S.A.".into(),
                tax_id: "1791234567001".into(),
            }
        );

        let (_, target) = Submission::Quick(QuickAction::Demo).resolve().unwrap();
        assert_eq!(target, AnalysisTarget::DemoListing);
    }

    #[test]
    fn test_quick_action_keys_round_trip() {
        for action in QuickAction::ALL {
            assert_eq!(QuickAction::from_key(action.key()), Some(action));
        }
        assert_eq!(QuickAction::from_key("DEMO"), Some(QuickAction::Demo));
        assert_eq!(QuickAction::from_key("unknown"), None);
    }
}
