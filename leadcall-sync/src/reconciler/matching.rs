//! Lead lookup by normalized phone number

use leadcall_common::models::Lead;
use leadcall_common::phone::normalize;

/// Result of looking up the lead a call was placed to
#[derive(Debug, PartialEq)]
pub enum MatchOutcome<'a> {
    Unique(&'a Lead),
    NoMatch,
    /// Several leads share the number; none is updated
    Ambiguous(Vec<&'a Lead>),
}

/// Find the single lead whose contact number has the same trailing digits
/// as `phone_number`
///
/// A number with no digits never matches anything.
pub fn match_lead<'a>(phone_number: &str, leads: &'a [Lead]) -> MatchOutcome<'a> {
    let target = normalize(phone_number);
    if target.is_empty() {
        return MatchOutcome::NoMatch;
    }

    let mut candidates: Vec<&Lead> = leads
        .iter()
        .filter(|lead| normalize(&lead.contact_number) == target)
        .collect();

    match candidates.len() {
        0 => MatchOutcome::NoMatch,
        1 => MatchOutcome::Unique(candidates.remove(0)),
        _ => MatchOutcome::Ambiguous(candidates),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(id: &str, number: &str) -> Lead {
        Lead {
            id: id.to_string(),
            name: None,
            contact_number: number.to_string(),
            call_connection_status: None,
        }
    }

    #[test]
    fn test_unique_match_across_formats() {
        let leads = vec![lead("L1", "098765 43210"), lead("L2", "+91 91234 56789")];
        match match_lead("+919876543210", &leads) {
            MatchOutcome::Unique(found) => assert_eq!(found.id, "L1"),
            other => panic!("expected unique match, got {:?}", other),
        }
    }

    #[test]
    fn test_no_match() {
        let leads = vec![lead("L1", "9876543210")];
        assert_eq!(match_lead("+919999999999", &leads), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_duplicate_numbers_are_ambiguous() {
        let leads = vec![lead("L1", "9876543210"), lead("L2", "+91-98765-43210")];
        match match_lead("919876543210", &leads) {
            MatchOutcome::Ambiguous(found) => {
                let ids: Vec<&str> = found.iter().map(|l| l.id.as_str()).collect();
                assert_eq!(ids, vec!["L1", "L2"]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_number_never_matches() {
        let leads = vec![lead("L1", ""), lead("L2", "n/a")];
        assert_eq!(match_lead("", &leads), MatchOutcome::NoMatch);
        assert_eq!(match_lead("unknown", &leads), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_short_numbers_match_only_equal_short_numbers() {
        let leads = vec![lead("L1", "100"), lead("L2", "9876543100")];
        match match_lead("1-0-0", &leads) {
            MatchOutcome::Unique(found) => assert_eq!(found.id, "L1"),
            other => panic!("expected unique match, got {:?}", other),
        }
    }
}
