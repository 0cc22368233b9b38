//! Minimal `{{ path.to.value }}` placeholder substitution.
//!
//! This is not a templating language: there are no loops, filters, or
//! conditionals. It exists so the bundled renderers can produce realistic
//! configuration text from a target's render context.

use serde_json::Value;

/// Errors raised while substituting placeholders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A `{{` without a matching `}}`.
    #[error("unterminated placeholder starting at byte {0}")]
    Unterminated(usize),
    /// The placeholder path does not resolve in the context.
    #[error("unknown placeholder `{0}`")]
    Unknown(String),
    /// The placeholder resolves to an object or array.
    #[error("placeholder `{0}` is not a scalar")]
    NotScalar(String),
}

/// Replaces every `{{ path }}` in `template` with the value at `path` in
/// `context`. Paths are dot-separated object keys.
///
/// # Errors
///
/// Returns a [`TemplateError`] when a placeholder is unterminated, unknown,
/// or resolves to a non-scalar value. `null` values are unknown.
pub fn substitute(template: &str, context: &Value) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or(TemplateError::Unterminated(offset + start))?;
        let path = after[..end].trim();
        out.push_str(&lookup(context, path)?);

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}

fn lookup(context: &Value, path: &str) -> Result<String, TemplateError> {
    let value = path
        .split('.')
        .try_fold(context, |value, key| value.get(key))
        .ok_or_else(|| TemplateError::Unknown(path.to_string()))?;
    match value {
        Value::Null => Err(TemplateError::Unknown(path.to_string())),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(_) | Value::Number(_) => Ok(value.to_string()),
        Value::Array(_) | Value::Object(_) => Err(TemplateError::NotScalar(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn substitutes_nested_paths() {
        let ctx = json!({"device": {"name": "leaf1"}, "mtu": 9214, "ntp": "10.0.0.1"});
        let out = substitute("hostname {{ device.name }}\nmtu {{mtu}}\nntp {{ ntp }}", &ctx)
            .unwrap();
        assert_eq!(out, "hostname leaf1\nmtu 9214\nntp 10.0.0.1");
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        assert_eq!(substitute("ip routing\n", &json!({})).unwrap(), "ip routing\n");
    }

    #[test]
    fn rejects_unknown_and_null_placeholders() {
        let ctx = json!({"device": {"location": null}});
        assert_eq!(
            substitute("{{ device.role }}", &ctx),
            Err(TemplateError::Unknown("device.role".into()))
        );
        assert_eq!(
            substitute("{{ device.location }}", &ctx),
            Err(TemplateError::Unknown("device.location".into()))
        );
    }

    #[test]
    fn rejects_unterminated_and_non_scalar_placeholders() {
        let ctx = json!({"device": {"name": "leaf1"}});
        assert_eq!(substitute("a {{ device.name", &ctx), Err(TemplateError::Unterminated(2)));
        assert_eq!(
            substitute("{{ device }}", &ctx),
            Err(TemplateError::NotScalar("device".into()))
        );
    }
}
