//! Typed access-control condition model.
//!
//! The shape follows what condition pickers emit: an ordered array whose
//! items are either a [`Clause`] or a boolean [`BooleanOperator`] joining the
//! clauses on either side of it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Chain, ConditionError, Subject};

/// Placeholder a picker writes into a parameter that should be replaced by
/// the requesting wallet's address.
pub const USER_ADDRESS_PLACEHOLDER: &str = ":userAddress";

/// Comparison applied to the value a clause's method returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    /// Values are equal.
    #[serde(rename = "=")]
    Equal,
    /// Values differ.
    #[serde(rename = "!=")]
    NotEqual,
    /// Returned value is greater than the expected one.
    #[serde(rename = ">")]
    GreaterThan,
    /// Returned value is greater than or equal to the expected one.
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// Returned value is less than the expected one.
    #[serde(rename = "<")]
    LessThan,
    /// Returned value is less than or equal to the expected one.
    #[serde(rename = "<=")]
    LessOrEqual,
}

impl Comparator {
    /// Whether `returned.cmp(expected)` satisfies this comparator.
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::Equal => ordering == Ordering::Equal,
            Self::NotEqual => ordering != Ordering::Equal,
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::GreaterOrEqual => ordering != Ordering::Less,
            Self::LessThan => ordering == Ordering::Less,
            Self::LessOrEqual => ordering != Ordering::Greater,
        }
    }
}

/// Expected outcome of a clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReturnValueTest {
    /// How the returned value is compared.
    pub comparator: Comparator,
    /// Expected value, as text (numbers are decimal strings, addresses hex).
    pub value: String,
}

/// A single on-chain check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clause {
    /// Contract queried by the clause; empty for wallet-level checks.
    #[serde(default)]
    pub contract_address: String,
    /// Token standard of the contract (`ERC20`, `ERC721`, ...), if any.
    #[serde(default)]
    pub standard_contract_type: String,
    /// Chain the contract lives on.
    pub chain: Chain,
    /// Method invoked; empty means the first parameter is itself the value.
    #[serde(default)]
    pub method: String,
    /// Method parameters. Positions are significant.
    pub parameters: Vec<String>,
    /// Expected outcome.
    pub return_value_test: ReturnValueTest,
}

/// Boolean operator between two clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOperator {
    /// Both sides must hold.
    And,
    /// Either side must hold.
    Or,
}

/// One item of an [`AccessControlCondition`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionEntry {
    /// A check against the chain.
    Clause(Clause),
    /// Joins the clauses before and after it.
    Operator {
        /// The operator.
        operator: BooleanOperator,
    },
}

impl ConditionEntry {
    /// The clause, unless this entry is an operator.
    pub fn as_clause(&self) -> Option<&Clause> {
        match self {
            Self::Clause(clause) => Some(clause),
            Self::Operator { .. } => None,
        }
    }
}

/// Ordered sequence of condition entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessControlCondition(Vec<ConditionEntry>);

impl AccessControlCondition {
    /// Wrap a list of entries.
    pub fn new(entries: Vec<ConditionEntry>) -> Self {
        Self(entries)
    }

    /// All entries, in order.
    pub fn entries(&self) -> &[ConditionEntry] {
        &self.0
    }

    /// Mutable access to the entries. Only used on per-evaluation copies.
    pub(crate) fn entries_mut(&mut self) -> &mut [ConditionEntry] {
        &mut self.0
    }

    /// Whether the condition has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first entry if it is a clause.
    pub fn first_clause(&self) -> Option<&Clause> {
        self.0.first().and_then(ConditionEntry::as_clause)
    }

    /// Iterate over the clauses, skipping operators.
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.0.iter().filter_map(ConditionEntry::as_clause)
    }
}

impl From<Vec<ConditionEntry>> for AccessControlCondition {
    fn from(entries: Vec<ConditionEntry>) -> Self {
        Self(entries)
    }
}

/// Where the subject gets written when a template is bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BindingSlot {
    /// Index of the entry (must be a clause).
    pub clause: usize,
    /// Index of the parameter within that clause.
    pub parameter: usize,
}

/// A condition as authored by the picker, before any subject is bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionTemplate {
    #[serde(rename = "accessControlConditions")]
    condition: AccessControlCondition,
    #[serde(skip)]
    slot: BindingSlot,
}

impl ConditionTemplate {
    /// Create a template binding the subject at clause 0, parameter 0.
    pub fn new(condition: impl Into<AccessControlCondition>) -> Self {
        Self {
            condition: condition.into(),
            slot: BindingSlot::default(),
        }
    }

    /// Declare a different binding slot.
    pub fn with_slot(mut self, slot: BindingSlot) -> Self {
        self.slot = slot;
        self
    }

    /// The authored condition.
    pub fn condition(&self) -> &AccessControlCondition {
        &self.condition
    }

    /// The slot the subject is written to.
    pub fn slot(&self) -> BindingSlot {
        self.slot
    }

    /// Check that the template can be bound.
    pub fn validate(&self) -> Result<(), ConditionError> {
        if self.condition.is_empty() {
            return Err(ConditionError::InvalidTemplate(
                "condition has no clauses".into(),
            ));
        }

        let BindingSlot { clause, parameter } = self.slot;
        let entry = self.condition.entries().get(clause).ok_or_else(|| {
            ConditionError::InvalidTemplate(format!("no entry at binding slot {clause}"))
        })?;
        let clause_ref = entry.as_clause().ok_or_else(|| {
            ConditionError::InvalidTemplate(format!("entry {clause} is an operator, not a clause"))
        })?;
        if clause_ref.parameters.len() <= parameter {
            return Err(ConditionError::InvalidTemplate(format!(
                "clause {clause} has no parameter {parameter}"
            )));
        }

        Ok(())
    }
}

/// A condition with a concrete subject written into its binding slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundCondition {
    /// The subject that was bound.
    pub subject: Subject,
    /// The per-evaluation copy of the condition.
    pub condition: AccessControlCondition,
}

impl BoundCondition {
    pub(crate) fn new(subject: Subject, condition: AccessControlCondition) -> Self {
        Self { subject, condition }
    }
}
