use crate::error::{FuzzplanError, Result};
use crate::types::{ParamValue, ParameterSet};

/// Raw contents of a plan file before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPlan {
    pub parameters: ParameterSet,
    pub header: Vec<String>,
    pub footer: Vec<String>,
    pub body_blocks: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Body,
    Footer,
}

#[derive(Debug, Clone, Copy)]
enum ParamKind {
    Int,
    String,
    Float,
}

impl ParamKind {
    fn from_directive(token: &str) -> Option<Self> {
        match token {
            "##intparam" => Some(ParamKind::Int),
            "##stringparam" => Some(ParamKind::String),
            "##floatparam" => Some(ParamKind::Float),
            _ => None,
        }
    }
}

struct PlanParser {
    plan: ParsedPlan,
    section: Section,
    block: Vec<String>,
}

impl PlanParser {
    fn close_block(&mut self) {
        if !self.block.is_empty() {
            self.plan.body_blocks.push(std::mem::take(&mut self.block));
        }
    }

    fn parameter(&mut self, kind: ParamKind, trimmed: &str, line_no: usize) -> Result<()> {
        let (directive, rest) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));
        let rest = rest.trim_start();
        let (key, raw) = match rest.split_once(char::is_whitespace) {
            Some((key, raw)) => (Some(key), Some(raw.trim()).filter(|r| !r.is_empty())),
            None => (Some(rest).filter(|k| !k.is_empty()), None),
        };

        let malformed = |why: &str| {
            FuzzplanError::Configuration(format!(
                "malformed {} on line {}: {} ({})",
                directive, line_no, trimmed, why
            ))
        };

        let key = key.ok_or_else(|| malformed("missing key"))?;
        let value = match (kind, raw) {
            (ParamKind::String, None) => ParamValue::String(String::new()),
            (ParamKind::String, Some(raw)) => ParamValue::String(raw.to_string()),
            (_, None) => return Err(malformed("missing value")),
            (ParamKind::Int, Some(raw)) => raw
                .parse::<i64>()
                .map(ParamValue::Integer)
                .map_err(|_| malformed("value is not an integer"))?,
            (ParamKind::Float, Some(raw)) => raw
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|_| malformed("value is not a number"))?,
        };
        self.plan.parameters.insert(key, value);
        Ok(())
    }

    fn line(&mut self, line: &str, line_no: usize) -> Result<()> {
        let trimmed = line.trim();
        match trimmed {
            "##header" | "##body" | "##footer" => {
                self.section = match trimmed {
                    "##header" => Section::Header,
                    "##footer" => Section::Footer,
                    _ => Section::Body,
                };
                self.close_block();
                return Ok(());
            }
            _ => {}
        }

        let first = trimmed.split_whitespace().next().unwrap_or_default();
        if let Some(kind) = ParamKind::from_directive(first) {
            return self.parameter(kind, trimmed, line_no);
        }

        match self.section {
            Section::Header | Section::Footer if trimmed.is_empty() => {}
            Section::Header => self.plan.header.push(line.to_string()),
            Section::Footer => self.plan.footer.push(line.to_string()),
            Section::Body if trimmed.is_empty() => self.close_block(),
            Section::Body => self.block.push(line.to_string()),
        }
        Ok(())
    }
}

/// Parse the line-oriented plan format.
///
/// `##header`, `##body` and `##footer` switch the collection section (body
/// is the default); inside the body a blank line closes the current block.
/// `##intparam`, `##stringparam` and `##floatparam` set global parameters.
/// Everything else is kept verbatim as command text.
pub fn parse_plan(text: &str) -> Result<ParsedPlan> {
    let mut parser = PlanParser {
        plan: ParsedPlan::default(),
        section: Section::Body,
        block: Vec::new(),
    };
    for (index, line) in text.lines().enumerate() {
        parser.line(line, index + 1)?;
    }
    parser.close_block();
    Ok(parser.plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = "\
##intparam nCommands 3
##stringparam mode guided
##floatparam fuzzProbMutateSubstitution 0.25
##header
#!/bin/sh
echo START
##body
echo one @{numeric}
echo two

echo three
##footer
echo END
";

    #[test]
    fn test_sections_and_blocks() {
        let plan = parse_plan(PLAN).unwrap();
        assert_eq!(plan.header, vec!["#!/bin/sh", "echo START"]);
        assert_eq!(plan.footer, vec!["echo END"]);
        assert_eq!(
            plan.body_blocks,
            vec![
                vec!["echo one @{numeric}".to_string(), "echo two".to_string()],
                vec!["echo three".to_string()],
            ]
        );
    }

    #[test]
    fn test_typed_parameters() {
        let plan = parse_plan(PLAN).unwrap();
        assert_eq!(plan.parameters.get("nCommands"), Some(&ParamValue::Integer(3)));
        assert_eq!(plan.parameters.get("mode"), Some(&ParamValue::from("guided")));
        assert_eq!(
            plan.parameters.get("fuzzProbMutateSubstitution"),
            Some(&ParamValue::Float(0.25))
        );
    }

    #[test]
    fn test_string_values_keep_inner_spaces() {
        let plan = parse_plan("##stringparam expr.leaves @{numeric max=9} ; @{float}\n").unwrap();
        assert_eq!(
            plan.parameters.string("expr.leaves").unwrap(),
            "@{numeric max=9} ; @{float}"
        );
        let plan = parse_plan("##stringparam empty\n").unwrap();
        assert_eq!(plan.parameters.string("empty").unwrap(), "");
    }

    #[test]
    fn test_default_section_is_body() {
        let plan = parse_plan("a\nb\n\n\nc\n").unwrap();
        assert_eq!(plan.body_blocks.len(), 2);
        assert!(plan.header.is_empty());
    }

    #[test]
    fn test_malformed_parameter_lines_name_the_line() {
        for bad in ["##intparam", "##intparam nCommands", "##intparam nCommands x", "##floatparam p one"] {
            let text = format!("echo hi\n{}\n", bad);
            match parse_plan(&text) {
                Err(FuzzplanError::Configuration(msg)) => assert!(msg.contains("line 2"), "{}", msg),
                other => panic!("expected configuration error for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_directive_switch_closes_body_block() {
        let plan = parse_plan("a\n##footer\nz\n##body\nb\n").unwrap();
        assert_eq!(plan.body_blocks, vec![vec!["a".to_string()], vec!["b".to_string()]]);
        assert_eq!(plan.footer, vec!["z"]);
    }

    #[test]
    fn test_blank_lines_outside_body_are_dropped() {
        let plan = parse_plan("##header\necho a\n\necho b\n##footer\n\necho z\n").unwrap();
        assert_eq!(plan.header, vec!["echo a", "echo b"]);
        assert_eq!(plan.footer, vec!["echo z"]);
    }
}
