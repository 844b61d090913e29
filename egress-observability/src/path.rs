use crate::redactor::{self, REDACTED, Redactor};
use egress_core::route::{PathPiece, RouteParameter, RouteTemplate};
use egress_core::{DataClassification, RedactionMode};
use std::collections::HashMap;

/// Route parameter classifications, keyed by parameter name.
pub type ParameterClasses = HashMap<String, DataClassification>;

/// Write the redacted form of `path` (matched against `template`) into `out`.
///
/// `None` copies the path verbatim. `Loose` and `Strict` rebuild it from the
/// template without the leading `/`, redacting parameter values:
///
/// | Parameter class     | Loose        | Strict          |
/// |---------------------|--------------|-----------------|
/// | not classified      | value        | `REDACTED`      |
/// | `none`              | value        | value           |
/// | anything else       | redactor     | redactor        |
pub fn format_path(
    template: &RouteTemplate,
    path: &str,
    mode: RedactionMode,
    classes: &ParameterClasses,
    redactor: &dyn Redactor,
    out: &mut String,
) {
    if mode == RedactionMode::None {
        out.push_str(path);
        return;
    }
    template.walk(path, |piece| match piece {
        PathPiece::Literal(text) => out.push_str(text),
        PathPiece::Parameter(param, value) => {
            redact_parameter(param, value, mode, classes, redactor, out)
        }
    });
}

/// Collect `(name, redacted value)` for every template parameter.
pub fn collect_parameters(
    template: &RouteTemplate,
    path: &str,
    mode: RedactionMode,
    classes: &ParameterClasses,
    redactor: &dyn Redactor,
    out: &mut Vec<(String, String)>,
) {
    template.walk(path, |piece| {
        if let PathPiece::Parameter(param, value) = piece {
            let mut redacted = String::with_capacity(value.len());
            redact_parameter(param, value, mode, classes, redactor, &mut redacted);
            out.push((param.name.clone(), redacted));
        }
    });
}

fn redact_parameter(
    param: &RouteParameter,
    value: &str,
    mode: RedactionMode,
    classes: &ParameterClasses,
    redactor: &dyn Redactor,
    out: &mut String,
) {
    match (mode, classes.get(&param.name)) {
        (RedactionMode::None, _) => out.push_str(value),
        (_, Some(class)) => redactor::apply(redactor, value, class, out),
        (RedactionMode::Loose, None) => out.push_str(value),
        (RedactionMode::Strict, None) => out.push_str(REDACTED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redactor::FormatRedactor;

    const TEMPLATE: &str = "/v1/unit/{unitId}/users/{userId}";
    const PATH: &str = "/v1/unit/999/users/123";

    fn classes() -> ParameterClasses {
        HashMap::from([("userId".to_string(), DataClassification::new("private"))])
    }

    fn format(mode: RedactionMode, classes: &ParameterClasses) -> String {
        let template = RouteTemplate::parse(TEMPLATE).unwrap();
        let redactor = FormatRedactor::new("REDACTED:{0}");
        let mut out = String::new();
        format_path(&template, PATH, mode, classes, &redactor, &mut out);
        out
    }

    #[test]
    fn none_mode_keeps_path() {
        assert_eq!(format(RedactionMode::None, &classes()), "/v1/unit/999/users/123");
    }

    #[test]
    fn loose_mode_redacts_only_classified() {
        assert_eq!(
            format(RedactionMode::Loose, &classes()),
            "v1/unit/999/users/REDACTED:123"
        );
    }

    #[test]
    fn strict_mode_redacts_everything() {
        assert_eq!(
            format(RedactionMode::Strict, &classes()),
            "v1/unit/REDACTED/users/REDACTED:123"
        );
    }

    #[test]
    fn strict_mode_honours_unclassified_safe_marker() {
        let mut classes = classes();
        classes.insert("unitId".into(), DataClassification::NONE);
        assert_eq!(
            format(RedactionMode::Strict, &classes),
            "v1/unit/999/users/REDACTED:123"
        );
    }

    #[test]
    fn formatting_is_deterministic() {
        let a = format(RedactionMode::Strict, &classes());
        let b = format(RedactionMode::Strict, &classes());
        assert_eq!(a, b);
    }

    #[test]
    fn collect_parameters_redacts_values() {
        let template = RouteTemplate::parse(TEMPLATE).unwrap();
        let redactor = FormatRedactor::new("REDACTED:{0}");
        let mut out = Vec::new();
        collect_parameters(
            &template,
            PATH,
            RedactionMode::Strict,
            &classes(),
            &redactor,
            &mut out,
        );
        assert_eq!(
            out,
            vec![
                ("unitId".to_string(), "REDACTED".to_string()),
                ("userId".to_string(), "REDACTED:123".to_string()),
            ]
        );
    }
}
