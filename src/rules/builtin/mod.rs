//! Built-in rule catalogue (§5), grounded one-for-one on
//! `examples/original_source/server/rules/*.py`.

mod complexity_long_parameter_list;
mod ident_duplicate_definition;
mod imports_missing_file_target;
mod imports_unused;
mod naming_project_term_inconsistency;

pub use complexity_long_parameter_list::ComplexityLongParameterListRule;
pub use ident_duplicate_definition::IdentDuplicateDefinitionRule;
pub use imports_missing_file_target::ImportsMissingFileTargetRule;
pub use imports_unused::ImportsUnusedRule;
pub use naming_project_term_inconsistency::NamingProjectTermInconsistencyRule;

use std::sync::Arc;

use crate::rules::{Rule, RuleProvider};

/// The five reference rules this crate ships, in lieu of the teacher's
/// module-import-side-effect registration (§6 "Rule discovery contract").
pub struct BuiltinRuleProvider;

impl RuleProvider for BuiltinRuleProvider {
    fn rules(&self) -> Vec<Arc<dyn Rule>> {
        vec![
            Arc::new(ImportsUnusedRule::new()),
            Arc::new(IdentDuplicateDefinitionRule::new()),
            Arc::new(ImportsMissingFileTargetRule::new()),
            Arc::new(ComplexityLongParameterListRule::new()),
            Arc::new(NamingProjectTermInconsistencyRule::new()),
        ]
    }
}
