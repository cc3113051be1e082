use std::collections::HashMap;

use peergate_condition::{
    AccessControlCondition, BooleanOperator, Clause, ConditionEntry, USER_ADDRESS_PLACEHOLDER,
};

/// Balances the [`MemoryAuthority`](super::MemoryAuthority) judges clauses
/// against, keyed by contract and holder (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<(String, String), u128>,
}

impl Ledger {
    /// Record a balance. Native-currency balances use an empty contract.
    pub fn set(&mut self, contract: &str, holder: &str, amount: u128) {
        self.balances.insert(
            (contract.to_ascii_lowercase(), holder.to_ascii_lowercase()),
            amount,
        );
    }

    /// Balance of `holder` in `contract`, zero when unknown.
    pub fn balance(&self, contract: &str, holder: &str) -> u128 {
        self.balances
            .get(&(contract.to_ascii_lowercase(), holder.to_ascii_lowercase()))
            .copied()
            .unwrap_or_default()
    }

    /// Judge `condition` for a request signed by `requester`.
    ///
    /// Entries fold left to right; a clause not preceded by an operator is
    /// joined with `and`.
    pub fn satisfied(&self, condition: &AccessControlCondition, requester: &str) -> bool {
        let mut outcome: Option<bool> = None;
        let mut pending = BooleanOperator::And;

        for entry in condition.entries() {
            match entry {
                ConditionEntry::Operator { operator } => pending = *operator,
                ConditionEntry::Clause(clause) => {
                    let holds = self.holds(clause, requester);
                    outcome = Some(match (outcome, pending) {
                        (None, _) => holds,
                        (Some(previous), BooleanOperator::And) => previous && holds,
                        (Some(previous), BooleanOperator::Or) => previous || holds,
                    });
                    pending = BooleanOperator::And;
                }
            }
        }

        outcome.unwrap_or(false)
    }

    fn holds(&self, clause: &Clause, requester: &str) -> bool {
        let parameters: Vec<&str> = clause
            .parameters
            .iter()
            .map(|parameter| {
                if parameter == USER_ADDRESS_PLACEHOLDER {
                    requester
                } else {
                    parameter.as_str()
                }
            })
            .collect();
        let test = &clause.return_value_test;

        match clause.method.as_str() {
            "" => {
                let Some(returned) = parameters.first() else {
                    return false;
                };
                let ordering = returned
                    .to_ascii_lowercase()
                    .cmp(&test.value.to_ascii_lowercase());
                test.comparator.holds(ordering)
            }
            "balanceOf" | "eth_getBalance" => {
                let Some(holder) = parameters.first() else {
                    return false;
                };
                let Ok(expected) = test.value.parse::<u128>() else {
                    return false;
                };
                let balance = self.balance(&clause.contract_address, holder);
                test.comparator.holds(balance.cmp(&expected))
            }
            method => {
                tracing::debug!(method, "Unsupported condition method");
                false
            }
        }
    }
}
