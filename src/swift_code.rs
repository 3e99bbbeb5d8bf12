// 🔤 SWIFT/BIC Code Classifier
// Reads the headquarters/branch designation straight out of the code layout:
//
//   BPHK PL PK XXX
//   │    │  │  └── branch code (XXX = primary office)
//   │    │  └───── location code
//   │    └──────── country code
//   └───────────── institution code

/// Length of every SWIFT/BIC code this system accepts
pub const SWIFT_CODE_LEN: usize = 11;

/// Institution + country + location; shared by a headquarters and its branches
pub const HQ_PART_LEN: usize = 8;

/// Branch code that marks a headquarters
pub const HQ_SUFFIX: &str = "XXX";

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// What a code says about its own bank
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeKind {
    /// Code ends in `XXX`
    Headquarters,

    /// Any other branch code; carries the code its headquarters would have
    Branch(String),
}

impl CodeKind {
    pub fn is_headquarters(&self) -> bool {
        matches!(self, CodeKind::Headquarters)
    }

    /// Implied headquarters code, `None` for headquarters
    pub fn implied_headquarters(&self) -> Option<&str> {
        match self {
            CodeKind::Headquarters => None,
            CodeKind::Branch(hq) => Some(hq),
        }
    }
}

/// Classify a SWIFT code as headquarters or branch.
///
/// # Precondition
/// `code` must already have passed length validation (exactly
/// [`SWIFT_CODE_LEN`] ASCII characters). This function does not re-check it;
/// shorter or non-ASCII input is out of contract and may panic.
///
/// # Examples
/// ```
/// use swift_registry::swift_code::{classify, CodeKind};
///
/// assert_eq!(classify("ABCDEFGHXXX"), CodeKind::Headquarters);
/// assert_eq!(classify("ABCDEFGHIJK"), CodeKind::Branch("ABCDEFGHXXX".to_string()));
/// ```
pub fn classify(code: &str) -> CodeKind {
    debug_assert_eq!(code.len(), SWIFT_CODE_LEN, "classify called on unvalidated code");

    if &code[HQ_PART_LEN..] == HQ_SUFFIX {
        CodeKind::Headquarters
    } else {
        CodeKind::Branch(format!("{}{}", &code[..HQ_PART_LEN], HQ_SUFFIX))
    }
}

/// Check the length invariant. Non-ASCII codes are rejected too, so every
/// code that passes can be sliced by [`classify`].
pub fn has_valid_length(code: &str) -> bool {
    code.is_ascii() && code.len() == SWIFT_CODE_LEN
}
