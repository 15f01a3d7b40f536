//! Choice enumerations for constrained string columns.
//!
//! Columns store the `as_str` value; `parse` is what form validation uses to
//! reject anything outside the permitted set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored value outside a choice enum's permitted set.
#[derive(Debug, Error)]
#[error("'{0}' is not an available choice")]
pub struct UnknownChoice(pub String);

/// Declares a string-backed choice enum with its stored values.
macro_rules! choices {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $value:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $value)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|choice| choice.as_str() == value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choices! {
    pub enum Gender {
        Male => "M",
        Female => "F",
        Other => "O",
    }
}

choices! {
    pub enum Branch {
        Army => "ARMY",
        Navy => "NAVY",
        AirForce => "AIR_FORCE",
        MarineCorps => "MARINE_CORPS",
        CoastGuard => "COAST_GUARD",
        SpaceForce => "SPACE_FORCE",
        NationalGuard => "NATIONAL_GUARD",
    }
}

choices! {
    /// DoD pay grades, shared across branches.
    pub enum Rank {
        E1 => "E-1", E2 => "E-2", E3 => "E-3", E4 => "E-4", E5 => "E-5",
        E6 => "E-6", E7 => "E-7", E8 => "E-8", E9 => "E-9",
        W1 => "W-1", W2 => "W-2", W3 => "W-3", W4 => "W-4", W5 => "W-5",
        O1 => "O-1", O2 => "O-2", O3 => "O-3", O4 => "O-4", O5 => "O-5",
        O6 => "O-6", O7 => "O-7", O8 => "O-8", O9 => "O-9", O10 => "O-10",
    }
}

choices! {
    pub enum DutyFlag {
        Active => "ACTIVE",
        Reserve => "RESERVE",
        Veteran => "VETERAN",
        Retired => "RETIRED",
    }
}

choices! {
    pub enum SchoolType {
        HighSchool => "HIGH_SCHOOL",
        CommunityCollege => "COMMUNITY_COLLEGE",
        University => "UNIVERSITY",
        TradeSchool => "TRADE_SCHOOL",
        Online => "ONLINE",
    }
}

choices! {
    pub enum DegreeType {
        HighSchoolDiploma => "HIGH_SCHOOL_DIPLOMA",
        Ged => "GED",
        Associate => "ASSOCIATE",
        Bachelor => "BACHELOR",
        Master => "MASTER",
        Doctorate => "DOCTORATE",
        Certificate => "CERTIFICATE",
        NoDegree => "NONE",
    }
}

choices! {
    pub enum SalaryType {
        Hourly => "HOURLY",
        Weekly => "WEEKLY",
        Monthly => "MONTHLY",
        Yearly => "YEARLY",
    }
}

choices! {
    pub enum JobType {
        FullTime => "FULL_TIME",
        PartTime => "PART_TIME",
        Contract => "CONTRACT",
        Temporary => "TEMPORARY",
        Internship => "INTERNSHIP",
    }
}

choices! {
    pub enum Relocation {
        Yes => "YES",
        No => "NO",
        Maybe => "MAYBE",
    }
}

choices! {
    pub enum DocumentType {
        Certification => "CERTIFICATION",
        Licenses => "LICENSES",
    }
}

impl DocumentType {
    /// Rows written before the column existed carry the lowercase
    /// migration default, so stored values are read case-insensitively.
    pub fn from_stored(value: &str) -> Option<Self> {
        Self::parse(&value.to_ascii_uppercase())
    }
}

impl TryFrom<String> for DocumentType {
    type Error = UnknownChoice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_stored(&value).ok_or(UnknownChoice(value))
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Certification
    }
}

choices! {
    /// USPS codes: states, DC, territories and armed forces regions.
    pub enum UsState {
        Al => "AL", Ak => "AK", Az => "AZ", Ar => "AR", Ca => "CA", Co => "CO",
        Ct => "CT", De => "DE", Dc => "DC", Fl => "FL", Ga => "GA", Hi => "HI",
        Id => "ID", Il => "IL", In => "IN", Ia => "IA", Ks => "KS", Ky => "KY",
        La => "LA", Me => "ME", Md => "MD", Ma => "MA", Mi => "MI", Mn => "MN",
        Ms => "MS", Mo => "MO", Mt => "MT", Ne => "NE", Nv => "NV", Nh => "NH",
        Nj => "NJ", Nm => "NM", Ny => "NY", Nc => "NC", Nd => "ND", Oh => "OH",
        Ok => "OK", Or => "OR", Pa => "PA", Ri => "RI", Sc => "SC", Sd => "SD",
        Tn => "TN", Tx => "TX", Ut => "UT", Vt => "VT", Va => "VA", Wa => "WA",
        Wv => "WV", Wi => "WI", Wy => "WY",
        As => "AS", Gu => "GU", Mp => "MP", Pr => "PR", Vi => "VI",
        Aa => "AA", Ae => "AE", Ap => "AP",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_variant() {
        for branch in Branch::ALL {
            assert_eq!(Branch::parse(branch.as_str()), Some(*branch));
        }
        for state in UsState::ALL {
            assert_eq!(UsState::parse(state.as_str()), Some(*state));
        }
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(Gender::parse("M"), Some(Gender::Male));
        assert_eq!(Gender::parse("m"), None);
        assert_eq!(JobType::parse("full time"), None);
    }

    #[test]
    fn test_document_type_only_two_choices() {
        assert_eq!(DocumentType::ALL.len(), 2);
        assert_eq!(DocumentType::parse("LICENSES"), Some(DocumentType::Licenses));
        assert_eq!(DocumentType::parse("PERMIT"), None);
    }

    #[test]
    fn test_document_type_reads_lowercase_legacy_default() {
        assert_eq!(
            DocumentType::from_stored("certification"),
            Some(DocumentType::Certification)
        );
        assert_eq!(DocumentType::parse("certification"), None);
    }

    #[test]
    fn test_document_type_decodes_stored_column() {
        let legacy = DocumentType::try_from("certification".to_string()).unwrap();
        assert_eq!(legacy, DocumentType::Certification);
        assert_eq!(legacy.as_str(), "CERTIFICATION");
        let licenses = DocumentType::try_from("LICENSES".to_string()).unwrap();
        assert_eq!(licenses, DocumentType::Licenses);
        let err = DocumentType::try_from("diploma".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "'diploma' is not an available choice");
    }

    #[test]
    fn test_state_count() {
        assert_eq!(UsState::ALL.len(), 59);
    }

    #[test]
    fn test_serde_uses_stored_value() {
        let json = serde_json::to_string(&Branch::AirForce).unwrap();
        assert_eq!(json, "\"AIR_FORCE\"");
    }
}
