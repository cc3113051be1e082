use crate::{ConditionError, ConditionTemplate};

impl ConditionTemplate {
    /// Read the payload a condition picker hands back once the user is done
    /// composing conditions.
    ///
    /// Only `accessControlConditions` is read; any other field the picker
    /// includes is ignored. The resulting template is validated.
    pub fn from_picker_output(payload: &str) -> Result<Self, ConditionError> {
        let template: ConditionTemplate =
            serde_json::from_str(payload).map_err(|error| ConditionError::Malformed(error.to_string()))?;
        template.validate()?;
        Ok(template)
    }

    /// Same as [`ConditionTemplate::from_picker_output`] for an already
    /// decoded JSON value.
    pub fn from_picker_value(payload: serde_json::Value) -> Result<Self, ConditionError> {
        let template: ConditionTemplate =
            serde_json::from_value(payload).map_err(|error| ConditionError::Malformed(error.to_string()))?;
        template.validate()?;
        Ok(template)
    }
}
