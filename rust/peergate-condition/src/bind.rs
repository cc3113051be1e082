use crate::{BoundCondition, ConditionEntry, ConditionError, ConditionTemplate, Subject};

/// Bind `subject` into a copy of `template`.
///
/// Only the parameter at the template's [`BindingSlot`](crate::BindingSlot)
/// is overwritten; every other entry and parameter is copied unchanged. The
/// template itself is never modified, so it can be shared by concurrent
/// evaluations.
pub fn bind(template: &ConditionTemplate, subject: &Subject) -> Result<BoundCondition, ConditionError> {
    template.validate()?;

    let slot = template.slot();
    let mut condition = template.condition().clone();

    match condition.entries_mut().get_mut(slot.clause) {
        Some(ConditionEntry::Clause(clause)) => match clause.parameters.get_mut(slot.parameter) {
            Some(parameter) => *parameter = subject.address().to_owned(),
            None => {
                return Err(ConditionError::InvalidTemplate(format!(
                    "clause {} has no parameter {}",
                    slot.clause, slot.parameter
                )));
            }
        },
        _ => {
            return Err(ConditionError::InvalidTemplate(format!(
                "no clause at binding slot {}",
                slot.clause
            )));
        }
    }

    Ok(BoundCondition::new(subject.clone(), condition))
}
