//! University records restriction categories and their boilerplate.
//!
//! The host works out which restriction categories apply to a collection
//! (a query over restriction notes that lives outside this crate). The
//! exporter only uses the resulting set to decide which boilerplate blocks
//! to add to the resource-level access restriction note.

use std::fmt;
use std::str::FromStr;

/// A category of restricted university records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RestrictionCategory {
    /// Personnel-related files.
    Personnel,
    /// Student educational records.
    Student,
    /// Patient/client records.
    Client,
    /// Executive records.
    Executive,
}

impl RestrictionCategory {
    /// Order in which category descriptions are listed.
    pub const ALL: [RestrictionCategory; 4] = [
        RestrictionCategory::Personnel,
        RestrictionCategory::Student,
        RestrictionCategory::Client,
        RestrictionCategory::Executive,
    ];

    pub fn code(self) -> &'static str {
        match self {
            RestrictionCategory::Personnel => "PR",
            RestrictionCategory::Student => "SR",
            RestrictionCategory::Client => "CR",
            RestrictionCategory::Executive => "ER",
        }
    }

    /// List item text (contains markup).
    pub fn description(self) -> &'static str {
        match self {
            RestrictionCategory::Personnel => PR_RESTRICTIONS,
            RestrictionCategory::Student => SR_RESTRICTIONS,
            RestrictionCategory::Client => CR_RESTRICTIONS,
            RestrictionCategory::Executive => ER_RESTRICTIONS,
        }
    }
}

impl fmt::Display for RestrictionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown restriction category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for RestrictionCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PR" => Ok(RestrictionCategory::Personnel),
            "SR" => Ok(RestrictionCategory::Student),
            "CR" => Ok(RestrictionCategory::Client),
            "ER" => Ok(RestrictionCategory::Executive),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// Parse category codes, skipping values that are not university categories.
pub fn parse_categories<'a>(
    codes: impl IntoIterator<Item = &'a str>,
) -> std::collections::BTreeSet<RestrictionCategory> {
    codes
        .into_iter()
        .filter_map(|code| match code.parse() {
            Ok(category) => Some(category),
            Err(err) => {
                tracing::debug!(%err, "ignoring restriction category");
                None
            }
        })
        .collect()
}

pub const HEADER_TEXT: &str = "Access Restrictions for University of Michigan Records";

pub const BOILERPLATE_INTRO: &str = "University records are public records and once fully processed are generally open to research use. Records that contain personally identifiable information will be restricted in order to protect individual privacy. Certain administrative records are restricted in accordance with university policy as outlined below. The restriction of university records is subject to compliance with applicable laws, including the Michigan Freedom of Information Act.";

pub const CATEGORIES_HEADING: &str = "Categories of Restricted Records";

pub const BOILERPLATE_CONTENTS_LIST: &str = "Restricted files are indicated in the contents list of the collection\u{2019}s finding aid with a restriction note indicating the restriction type and the date of expiration.";

pub const BOILERPLATE_FOIA: &str = "For further information on the restriction policy and placing Freedom of Information Act requests for restricted material, consult the reference archivist at the Bentley Historical Library (bentley.ref@umich.edu) or the University of Michigan Freedom of Information Office website (https://foia.vpcomm.umich.edu/).";

const CR_RESTRICTIONS: &str = r#"<emph render="bold">Patient/client records</emph> are restricted for one-hundred (100) years from the date of their creation. The terms of use for particular records older than 100 years may require the research to sign a Patient/Client Access Agreement."#;

const ER_RESTRICTIONS: &str = r#"<emph render="bold">Executive records</emph>: Records generated by the university's executive officers, deans, directors, department heads, and their designated support staff are restricted for twenty (20) years from the date of their creation."#;

const PR_RESTRICTIONS: &str = r#"<emph render="bold">Personnel-related files</emph>, including search, review, promotion, and tenure files, are restricted for thirty (30) years from the date of their creation."#;

const SR_RESTRICTIONS: &str = r#"<emph render="bold">Student educational records</emph>: FERPA's protection of personally identifiable information in a student's education records ends at the time of a student's death and therefore is a matter of institutional policy.  As a courtesy to the families of recently deceased students who were enrolled at the time of death, the University generally will not release information from their education records for five years without the consent of the deceased student's next of kin. Eighty-five (85) years after the date the records were first created, the University will presume that the student is deceased. Thereafter the student's education records will be open.  Student records at the Bentley Historical Library are restricted for eighty-five (85) years, but may also be made available upon proof of the death of the student."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!("pr".parse::<RestrictionCategory>(), Ok(RestrictionCategory::Personnel));
        assert_eq!(" ER ".parse::<RestrictionCategory>(), Ok(RestrictionCategory::Executive));
        assert!("XX".parse::<RestrictionCategory>().is_err());
    }

    #[test]
    fn test_parse_categories_skips_unknown() {
        let set = parse_categories(["SR", "bogus", "CR", "SR"]);
        assert_eq!(
            set.into_iter().collect::<Vec<_>>(),
            vec![RestrictionCategory::Student, RestrictionCategory::Client]
        );
    }

    #[test]
    fn test_display_order_matches_all() {
        let codes: Vec<_> = RestrictionCategory::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes, ["PR", "SR", "CR", "ER"]);
    }
}
