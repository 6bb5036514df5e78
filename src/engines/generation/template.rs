use crate::engines::generation::substitution::SubstitutionPoint;
use crate::error::{FuzzplanError, Result};
use crate::plan::Plan;
use crate::types::{ParamValue, ParameterSet};
use once_cell::sync::Lazy;
use rand::{Rng, RngCore};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Matches `@{head}` and `@{head key=value ...}`.
static SUBSTITUTION_POINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\{([^}]+)\}").expect("substitution point pattern is valid"));

/// Split a point label such as `numeric min=0 max="1 000"` into its head and
/// site parameters. Values follow shell quoting rules.
pub fn parse_label(label: &str) -> Result<(String, ParameterSet)> {
    let label = label.trim();
    let (head, rest) = match label.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest),
        None => (label, ""),
    };

    let mut params = ParameterSet::owned_by(head);
    let tokens = shlex::split(rest).ok_or_else(|| {
        FuzzplanError::Configuration(format!("unbalanced quoting in '@{{{}}}'", label))
    })?;
    for token in tokens {
        let (key, value) = token.split_once('=').ok_or_else(|| {
            FuzzplanError::Configuration(format!(
                "expected key=value in '@{{{}}}', found '{}'",
                label, token
            ))
        })?;
        params.insert(key, ParamValue::String(value.to_string()));
    }
    Ok((head.to_string(), params))
}

/// A literal string with its substitution points, bound lazily by ordinal.
///
/// Ordinals are the order in which markers occur in the text. Once an
/// ordinal is bound its point is kept until the template is dropped; later
/// renders reuse its last output.
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
    points: BTreeMap<usize, SubstitutionPoint>,
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            points: BTreeMap::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of markers in the text, bound or not.
    pub fn marker_count(&self) -> usize {
        SUBSTITUTION_POINT.find_iter(&self.text).count()
    }

    /// Create a point for every marker that does not have one yet. A fresh
    /// point generates its first value here.
    pub fn bind(&mut self, plan: &Plan, rng: &mut dyn RngCore) -> Result<()> {
        for (ordinal, captures) in SUBSTITUTION_POINT.captures_iter(&self.text).enumerate() {
            if self.points.contains_key(&ordinal) {
                continue;
            }
            let (head, site) = parse_label(&captures[1])?;
            let point = SubstitutionPoint::new(head, site, plan, rng)?;
            self.points.insert(ordinal, point);
        }
        Ok(())
    }

    /// Literal spans joined with each point's current output. Unbound
    /// markers are left as written.
    pub fn output(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut last = 0;
        for (ordinal, found) in SUBSTITUTION_POINT.find_iter(&self.text).enumerate() {
            out.push_str(&self.text[last..found.start()]);
            match self.points.get(&ordinal) {
                Some(point) => out.push_str(point.output()),
                None => out.push_str(found.as_str()),
            }
            last = found.end();
        }
        out.push_str(&self.text[last..]);
        out
    }

    pub fn render(&mut self, plan: &Plan, rng: &mut dyn RngCore) -> Result<String> {
        self.bind(plan, rng)?;
        Ok(self.output())
    }

    /// Bound points, by ordinal.
    pub fn points(&self) -> &BTreeMap<usize, SubstitutionPoint> {
        &self.points
    }

    pub fn point_mut(&mut self, ordinal: usize) -> Option<&mut SubstitutionPoint> {
        self.points.get_mut(&ordinal)
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

/// One command line of a block, bound to the shared plan.
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    plan: Arc<Plan>,
    template: Template,
}

impl CommandTemplate {
    pub fn new(plan: Arc<Plan>, text: impl Into<String>) -> Self {
        Self {
            plan,
            template: Template::new(text),
        }
    }

    pub fn text(&self) -> &str {
        self.template.text()
    }

    pub fn render(&mut self, rng: &mut dyn RngCore) -> Result<String> {
        self.template.render(&self.plan, rng)
    }

    /// Last rendered form, without binding anything new.
    pub fn output(&self) -> String {
        self.template.output()
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn substitution_count(&self) -> usize {
        self.template.point_count()
    }

    /// Regenerate one bound point chosen uniformly; returns its ordinal.
    pub fn mutate(&mut self, rng: &mut dyn RngCore) -> Result<usize> {
        let ordinals: Vec<usize> = self.template.points().keys().copied().collect();
        if ordinals.is_empty() {
            return Err(FuzzplanError::Generation(format!(
                "command has no substitution point to mutate: {}",
                self.text()
            )));
        }
        let ordinal = ordinals[rng.gen_range(0..ordinals.len())];
        if let Some(point) = self.template.point_mut(ordinal) {
            point.generate(&self.plan, rng)?;
        }
        Ok(ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_label_without_params() {
        let (head, params) = parse_label("alphanumeric").unwrap();
        assert_eq!(head, "alphanumeric");
        assert!(params.is_empty());
    }

    #[test]
    fn test_parse_label_with_quoted_values() {
        let (head, params) = parse_label("numeric min=1 max='20' note=\"a b\"").unwrap();
        assert_eq!(head, "numeric");
        assert_eq!(params.int("min").unwrap(), 1);
        assert_eq!(params.int("max").unwrap(), 20);
        assert_eq!(params.string("note").unwrap(), "a b");
    }

    #[test]
    fn test_parse_label_rejects_bare_token() {
        assert!(matches!(
            parse_label("numeric min"),
            Err(FuzzplanError::Configuration(_))
        ));
        assert!(matches!(
            parse_label("numeric note=\"open"),
            Err(FuzzplanError::Configuration(_))
        ));
    }

    #[test]
    fn test_literal_template_renders_verbatim() {
        let plan = Arc::new(Plan::empty());
        let mut rng = StdRng::seed_from_u64(0);
        let mut command = CommandTemplate::new(plan, "echo hello {not a point}");
        for _ in 0..3 {
            assert_eq!(command.render(&mut rng).unwrap(), "echo hello {not a point}");
        }
        assert_eq!(command.substitution_count(), 0);
    }

    #[test]
    fn test_points_are_bound_once_and_reused() {
        let plan = Arc::new(Plan::empty());
        let mut rng = StdRng::seed_from_u64(5);
        let mut command = CommandTemplate::new(plan, "x=@{alphanumeric len=12} y=@{numeric}");
        let first = command.render(&mut rng).unwrap();
        assert_eq!(command.substitution_count(), 2);
        for _ in 0..5 {
            assert_eq!(command.render(&mut rng).unwrap(), first);
        }
        assert!(first.starts_with("x="));
        assert_eq!(first.split(' ').next().unwrap().len(), 14);
    }

    #[test]
    fn test_unknown_head_surfaces_at_render() {
        let plan = Arc::new(Plan::empty());
        let mut rng = StdRng::seed_from_u64(5);
        let mut command = CommandTemplate::new(plan, "run @{bogus}");
        assert!(matches!(
            command.render(&mut rng),
            Err(FuzzplanError::UnknownSubstitutionType(head)) if head == "bogus"
        ));
    }

    #[test]
    fn test_clone_does_not_share_points() {
        let plan = Arc::new(Plan::empty());
        let mut rng = StdRng::seed_from_u64(9);
        let mut original = CommandTemplate::new(plan, "@{alphanumeric len=30}");
        let before = original.render(&mut rng).unwrap();
        let mut copy = original.clone();
        copy.mutate(&mut rng).unwrap();
        assert_ne!(copy.output(), before);
        assert_eq!(original.output(), before);
    }
}
