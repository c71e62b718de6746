//! Severity overrides and deduplication (§4.6), applied as the last
//! post-processing step before a run's findings are returned.

use crate::finding::Finding;
use crate::rules::profile::Profile;

/// Apply the profile's severity overrides, then drop duplicate findings
/// (same `(rule_id, file_path, start_byte, end_byte, message)`), keeping the
/// first occurrence, then sort by `(file_path, start_byte, rule_id)`.
pub fn finalize(mut findings: Vec<Finding>, profile: &Profile) -> Vec<Finding> {
    for finding in &mut findings {
        finding.severity = profile.severity_for(&finding.rule_id, finding.severity);
    }

    let mut seen = std::collections::HashSet::new();
    findings.retain(|f| seen.insert(f.dedup_key()));

    findings.sort_by(|a, b| {
        (&a.file_path, a.span.start_byte, &a.rule_id).cmp(&(&b.file_path, b.span.start_byte, &b.rule_id))
    });

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;
    use crate::span::Span;

    #[test]
    fn drops_exact_duplicates_keeping_first() {
        let findings = vec![
            Finding::new("r", "m", "a.py", Span::new(0, 1), Severity::Warning),
            Finding::new("r", "m", "a.py", Span::new(0, 1), Severity::Warning),
        ];
        let profile = Profile::default_profile();
        let result = finalize(findings, &profile);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn sorts_by_file_then_span_then_rule() {
        let findings = vec![
            Finding::new("z.rule", "m", "b.py", Span::new(5, 6), Severity::Info),
            Finding::new("a.rule", "m", "a.py", Span::new(10, 11), Severity::Info),
            Finding::new("a.rule", "m", "a.py", Span::new(0, 1), Severity::Info),
        ];
        let profile = Profile::default_profile();
        let result = finalize(findings, &profile);
        assert_eq!(result[0].file_path, "a.py");
        assert_eq!(result[0].span.start_byte, 0);
        assert_eq!(result[1].span.start_byte, 10);
        assert_eq!(result[2].file_path, "b.py");
    }

    #[test]
    fn severity_override_applies_before_dedup_key_is_read() {
        let findings = vec![Finding::new(
            "complexity.long_parameter_list",
            "m",
            "a.py",
            Span::new(0, 1),
            Severity::Warning,
        )];
        let profile = Profile::alpha_default();
        let result = finalize(findings, &profile);
        assert_eq!(result[0].severity, Severity::Info);
    }
}
