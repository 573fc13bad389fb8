//! Field status checks called from `#[derive(Config)]` generated code.
//!
//! A field marked `#[config(status = experimental)]` is reported only when
//! the user moved it off its default.

use super::FieldPath;
use crate::config::ConfigDiagnostics;

/// Field status for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    Experimental,
}

/// Report a field with special status that differs from its default.
pub fn check_field_status(field_path: &str, status: FieldStatus, diag: &mut ConfigDiagnostics) {
    match status {
        FieldStatus::Experimental if diag.allow_experimental => {}
        FieldStatus::Experimental => {
            let path: &'static str = Box::leak(field_path.to_string().into_boxed_str());
            diag.experimental_hint(FieldPath::new(path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experimental_is_hint_only() {
        let mut diag = ConfigDiagnostics::default();
        check_field_status("split.minify_loader", FieldStatus::Experimental, &mut diag);
        assert!(!diag.has_errors());
        assert_eq!(diag.hints().len(), 1);

        let mut allowed = ConfigDiagnostics::with_allow_experimental(true);
        check_field_status("split.minify_loader", FieldStatus::Experimental, &mut allowed);
        assert!(allowed.hints().is_empty());
    }
}
