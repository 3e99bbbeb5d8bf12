// 🏦 Bank & Country records
// One Bank per SWIFT code; the headquarters link is a plain code reference
// into the same table.

use crate::swift_code::{classify, CodeKind};
use serde::{Deserialize, Serialize};

/// One bank office, keyed by its SWIFT code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    /// 11-character SWIFT/BIC code (primary key)
    pub swift_code: String,

    /// Code of the headquarters this branch belongs to.
    /// `None` for headquarters and for branches whose headquarters is unknown.
    pub hq_swift_code: Option<String>,

    pub bank_name: String,

    /// Street address, or the town name when the source left it blank
    pub address: String,

    /// ISO 3166-1 alpha-2, uppercase
    pub country_iso2_code: String,

    /// Uppercase
    pub country_name: String,
}

impl Bank {
    /// Headquarters/branch designation derived from the code
    pub fn kind(&self) -> CodeKind {
        classify(&self.swift_code)
    }

    pub fn is_headquarter(&self) -> bool {
        self.kind().is_headquarters()
    }

    /// Copy of this record with the headquarters link replaced
    pub fn with_hq_swift_code(&self, hq_swift_code: Option<String>) -> Bank {
        Bank {
            hq_swift_code,
            ..self.clone()
        }
    }
}

/// Country reference row (ISO2 code, name, time zone)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Country {
    pub iso2_code: String,
    pub country_name: String,
    pub time_zone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(code: &str, hq: Option<&str>) -> Bank {
        Bank {
            swift_code: code.to_string(),
            hq_swift_code: hq.map(str::to_string),
            bank_name: "TEST BANK".to_string(),
            address: "1 TEST STREET".to_string(),
            country_iso2_code: "PL".to_string(),
            country_name: "POLAND".to_string(),
        }
    }

    #[test]
    fn test_is_headquarter() {
        assert!(bank("BPHKPLPKXXX", None).is_headquarter());
        assert!(!bank("BPHKPLPKCUS", Some("BPHKPLPKXXX")).is_headquarter());
        // Designation comes from the code, not the link
        assert!(!bank("ALBPPLP1BMW", None).is_headquarter());
    }

    #[test]
    fn test_with_hq_swift_code_leaves_original_untouched() {
        let original = bank("BPHKPLPKCUS", Some("BPHKPLPKXXX"));
        let cleared = original.with_hq_swift_code(None);

        assert_eq!(cleared.hq_swift_code, None);
        assert_eq!(cleared.swift_code, original.swift_code);
        assert_eq!(original.hq_swift_code.as_deref(), Some("BPHKPLPKXXX"));
    }

    #[test]
    fn test_bank_json_shape() {
        let json = serde_json::to_value(bank("BPHKPLPKXXX", None)).unwrap();

        assert_eq!(json["swift_code"], "BPHKPLPKXXX");
        assert!(json["hq_swift_code"].is_null());
    }
}
