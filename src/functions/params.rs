use crate::types::ParameterSet;

/// Merge the parameters for one generator call.
///
/// Precedence, lowest first: the generator's built-in defaults, plan-wide
/// defaults scoped to `head` (`"<head>.<key>"`), then the parameters written
/// at this particular substitution point.
pub fn resolve(
    head: &str,
    defaults: &ParameterSet,
    site: &ParameterSet,
    plan: &ParameterSet,
) -> ParameterSet {
    let mut merged = ParameterSet::owned_by(head);
    merged.extend_from(defaults);
    merged.extend_from(&plan.scoped(head));
    merged.extend_from(site);
    merged
}
