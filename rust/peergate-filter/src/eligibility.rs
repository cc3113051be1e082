use std::collections::HashMap;

use peergate_condition::Subject;

/// Outcome of evaluating one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityResult {
    /// The subject evaluated.
    pub subject: Subject,
    /// Whether a verified token was obtained for it.
    pub verified: bool,
}

/// Eligibility by wallet address. Addresses without an entry are not
/// eligible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibilityMap(HashMap<Subject, bool>);

impl EligibilityMap {
    /// Record a result, replacing any earlier one for the same subject.
    pub fn insert(&mut self, result: EligibilityResult) {
        self.0.insert(result.subject, result.verified);
    }

    /// Whether `address` was evaluated and verified.
    pub fn is_eligible(&self, address: &str) -> bool {
        Subject::new(address)
            .ok()
            .and_then(|subject| self.0.get(&subject).copied())
            .unwrap_or(false)
    }

    /// Number of subjects evaluated.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no subject was evaluated.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of eligible subjects.
    pub fn eligible(&self) -> usize {
        self.0.values().filter(|verified| **verified).count()
    }
}

impl Extend<EligibilityResult> for EligibilityMap {
    fn extend<T: IntoIterator<Item = EligibilityResult>>(&mut self, iter: T) {
        for result in iter {
            self.insert(result);
        }
    }
}

impl FromIterator<EligibilityResult> for EligibilityMap {
    fn from_iter<T: IntoIterator<Item = EligibilityResult>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(address: &str, verified: bool) -> EligibilityResult {
        EligibilityResult {
            subject: Subject::new(address).unwrap(),
            verified,
        }
    }

    #[test]
    fn it_keeps_one_entry_per_address() {
        let map: EligibilityMap = [result("0xA", false), result("0xA", true), result("0xB", false)]
            .into_iter()
            .collect();

        assert_eq!(map.len(), 2);
        assert_eq!(map.eligible(), 1);
        assert!(map.is_eligible("0xA"));
        assert!(!map.is_eligible("0xB"));
    }

    #[test]
    fn it_treats_unknown_addresses_as_ineligible() {
        let map = EligibilityMap::default();
        assert!(!map.is_eligible("0xC"));
        assert!(!map.is_eligible(""));
    }
}
