//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

pub const SPECIFY_SYSTEM: &str = include_str!("../../prompts/specify-system.pmt");
pub const SPECIFY: &str = include_str!("../../prompts/specify.pmt");
pub const PLAN_SYSTEM: &str = include_str!("../../prompts/plan-system.pmt");
pub const PLAN: &str = include_str!("../../prompts/plan.pmt");
pub const TASKS_SYSTEM: &str = include_str!("../../prompts/tasks-system.pmt");
pub const TASKS: &str = include_str!("../../prompts/tasks.pmt");
pub const CLARIFY_SYSTEM: &str = include_str!("../../prompts/clarify-system.pmt");
pub const CLARIFY: &str = include_str!("../../prompts/clarify.pmt");
pub const CLARIFY_UPDATE_SYSTEM: &str = include_str!("../../prompts/clarify-update-system.pmt");
pub const CLARIFY_UPDATE: &str = include_str!("../../prompts/clarify-update.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let found = match name {
        "specify-system" => SPECIFY_SYSTEM,
        "specify" => SPECIFY,
        "plan-system" => PLAN_SYSTEM,
        "plan" => PLAN,
        "tasks-system" => TASKS_SYSTEM,
        "tasks" => TASKS,
        "clarify-system" => CLARIFY_SYSTEM,
        "clarify" => CLARIFY,
        "clarify-update-system" => CLARIFY_UPDATE_SYSTEM,
        "clarify-update" => CLARIFY_UPDATE,
        _ => {
            debug!("get_embedded: no match found");
            return None;
        }
    };
    Some(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_specify() {
        let system = get_embedded("specify-system").unwrap();
        assert!(system.contains("WHAT to build"));
        assert!(get_embedded("specify").unwrap().contains("{{feature_description}}"));
    }

    #[test]
    fn test_get_embedded_clarify_lists_focus_areas() {
        let system = get_embedded("clarify-system").unwrap();
        for area in [
            "User Experience Edge Cases",
            "Data Handling & Validation",
            "Error States & Failure Modes",
            "Cross-Feature Interactions",
            "Performance & Scale",
            "Security & Privacy",
        ] {
            assert!(system.contains(area), "missing focus area {area}");
        }
        assert!(system.contains("At most 5 questions"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
