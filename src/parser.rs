//! This module provides the reader for machine specification documents, utilizing the `pest`
//! crate. Documents are written in a reduced YAML dialect: block mappings and sequences nested
//! by indentation, flow lists, quoted and plain scalars, and `#` comments.
//!
//! The reader produces a [`serde_json::Value`] tree which the loader deserializes into the
//! machine specification.

use crate::types::{SimulatorError, MAX_SPEC_SIZE};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use serde_json::{Map, Number, Value};

/// Derives a `PestParser` for the document grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct DocumentParser;

/// Nested blocks must be indented at least this much deeper than their parent.
const INDENT_STEP: usize = 2;

/// Parses a specification document into a generic value tree.
///
/// An empty document yields `Value::Null`.
///
/// # Returns
///
/// * `Ok(Value)` if the document is well formed.
/// * `Err(SimulatorError::ParseError)` on syntax or indentation errors.
/// * `Err(SimulatorError::ValidationError)` if the document exceeds the size limit.
pub fn parse(input: &str) -> Result<Value, SimulatorError> {
    if input.len() > MAX_SPEC_SIZE {
        return Err(SimulatorError::ValidationError(format!(
            "Specification is {} bytes, the limit is {MAX_SPEC_SIZE}",
            input.len()
        )));
    }

    let root = DocumentParser::parse(Rule::document, input)
        .map_err(|e| SimulatorError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| SimulatorError::ValidationError("Empty parse tree".into()))?;

    let lines = root
        .into_inner()
        .filter(|p| p.as_rule() == Rule::content_line)
        .map(parse_line)
        .collect::<Result<Vec<_>, _>>()?;

    BlockReader { lines, pos: 0 }.read_document()
}

/// A non-blank line with its indentation resolved.
#[derive(Debug, Clone)]
struct Line<'i> {
    indent: usize,
    item: bool,
    body: Body,
    span: Span<'i>,
}

/// What a line carries after its indentation and optional `- ` marker.
#[derive(Debug, Clone)]
enum Body {
    /// A bare `-`; the item's value is the nested block below it.
    Empty,
    Scalar(Value),
    /// `key: value`, or `key:` when the value is the nested block below it.
    Entry(String, Option<Value>),
}

/// Folds a flat list of lines into nested mappings and sequences.
struct BlockReader<'i> {
    lines: Vec<Line<'i>>,
    pos: usize,
}

impl<'i> BlockReader<'i> {
    fn read_document(mut self) -> Result<Value, SimulatorError> {
        let value = match self.lines.first().map(|line| line.indent) {
            Some(indent) => self.read_block(indent)?,
            None => Value::Null,
        };

        // Anything left over sits to the left of the first line.
        if let Some(line) = self.lines.get(self.pos) {
            return Err(parse_error("Inconsistent indentation", line.span));
        }

        Ok(value)
    }

    fn peek(&self) -> Option<&Line<'i>> {
        self.lines.get(self.pos)
    }

    fn read_block(&mut self, indent: usize) -> Result<Value, SimulatorError> {
        match self.peek() {
            Some(line) if line.item => self.read_sequence(indent),
            _ => self.read_mapping(indent, None),
        }
    }

    /// Reads the value of a `key:` or `-` line whose value continues on the following lines.
    ///
    /// Returns `Null` when no line is indented at least `min_indent`.
    fn read_nested(&mut self, min_indent: usize) -> Result<Value, SimulatorError> {
        match self.peek().map(|line| line.indent) {
            Some(indent) if indent >= min_indent => self.read_block(indent),
            _ => Ok(Value::Null),
        }
    }

    fn read_mapping(
        &mut self,
        indent: usize,
        first: Option<(String, Option<Value>)>,
    ) -> Result<Value, SimulatorError> {
        let mut map = Map::new();

        if let Some((key, value)) = first {
            let value = self.resolve_value(value, indent)?;
            map.insert(key, value);
        }

        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(parse_error("Unexpected indentation", line.span));
            }

            let span = line.span;
            let (key, value) = match &line.body {
                Body::Entry(key, value) if !line.item => (key.clone(), value.clone()),
                _ => {
                    return Err(parse_error(
                        "Expected a mapping entry but found a list item",
                        span,
                    ))
                }
            };

            self.pos += 1;
            let value = self.resolve_value(value, indent)?;
            map.insert(key, value);
        }

        Ok(Value::Object(map))
    }

    fn read_sequence(&mut self, indent: usize) -> Result<Value, SimulatorError> {
        let mut items = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent < indent || !line.item {
                break;
            }
            if line.indent > indent {
                return Err(parse_error("Unexpected indentation inside a list", line.span));
            }

            let body = line.body.clone();
            self.pos += 1;

            let item = match body {
                Body::Empty => self.read_nested(indent + INDENT_STEP)?,
                Body::Scalar(value) => value,
                // `- key: value` opens a mapping whose remaining keys line up with `key`.
                Body::Entry(key, value) => {
                    self.read_mapping(indent + INDENT_STEP, Some((key, value)))?
                }
            };
            items.push(item);
        }

        Ok(Value::Array(items))
    }

    fn resolve_value(
        &mut self,
        value: Option<Value>,
        indent: usize,
    ) -> Result<Value, SimulatorError> {
        if let Some(value) = value {
            return Ok(value);
        }

        // A sequence may start at the key's own column, as in `key:` followed by `- item`.
        match self.peek() {
            Some(line) if line.item && line.indent == indent => self.read_sequence(indent),
            _ => self.read_nested(indent + INDENT_STEP),
        }
    }
}

/// Converts a `Pair<Rule::content_line>` into a `Line`.
fn parse_line(pair: Pair<Rule>) -> Result<Line, SimulatorError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();

    let indent = pairs.next().map(|p| p.as_str().len()).unwrap_or(0);
    let Some(content) = pairs.next() else {
        return Err(parse_error("Empty line content", span));
    };

    match content.as_rule() {
        Rule::sequence_item => {
            let body = match content.into_inner().next() {
                None => Body::Empty,
                Some(inner) if inner.as_rule() == Rule::mapping_entry => parse_entry(inner)?,
                Some(inner) => Body::Scalar(parse_value(inner)?),
            };
            Ok(Line {
                indent,
                item: true,
                body,
                span,
            })
        }
        Rule::mapping_entry => Ok(Line {
            indent,
            item: false,
            body: parse_entry(content)?,
            span,
        }),
        _ => Err(parse_error("Expected a mapping entry or a list item", span)),
    }
}

/// Parses `key: value` from a `Pair<Rule::mapping_entry>`.
fn parse_entry(pair: Pair<Rule>) -> Result<Body, SimulatorError> {
    let mut pairs = pair.into_inner();
    let key = pairs
        .next()
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default();
    let value = pairs.next().map(parse_value).transpose()?;

    Ok(Body::Entry(key, value))
}

/// Parses a flow list or a scalar.
fn parse_value(pair: Pair<Rule>) -> Result<Value, SimulatorError> {
    match pair.as_rule() {
        Rule::flow_list => parse_flow_list(pair),
        _ => Ok(parse_scalar(pair)),
    }
}

/// Parses `[a, b, c]`. Each element is read as a scalar on its own.
fn parse_flow_list(pair: Pair<Rule>) -> Result<Value, SimulatorError> {
    let items: Vec<Pair<Rule>> = pair.into_inner().collect();

    if let [only] = items.as_slice() {
        if only.as_str().trim().is_empty() {
            return Ok(Value::Array(Vec::new()));
        }
    }

    items
        .into_iter()
        .map(|item| {
            let span = item.as_span();
            let text = DocumentParser::parse(Rule::scalar_text, item.as_str())
                .map_err(|_| parse_error("Invalid list element", span))?
                .next()
                .ok_or_else(|| parse_error("Invalid list element", span))?;

            Ok(text
                .into_inner()
                .find(|p| p.as_rule() != Rule::EOI)
                .map(parse_scalar)
                .unwrap_or_else(|| Value::String(String::new())))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Converts a scalar pair into a JSON value.
fn parse_scalar(pair: Pair<Rule>) -> Value {
    let text = pair.as_str();
    match pair.as_rule() {
        Rule::null => Value::Null,
        Rule::boolean => Value::Bool(text.starts_with(['t', 'T'])),
        Rule::single_quoted | Rule::double_quoted => Value::String(
            pair.into_inner()
                .next()
                .map(|inner| inner.as_str().to_string())
                .unwrap_or_default(),
        ),
        Rule::integer => parse_integer(text),
        Rule::float => parse_float(text),
        _ => Value::String(text.to_string()),
    }
}

fn parse_integer(text: &str) -> Value {
    let digits = text.strip_prefix('+').unwrap_or(text);
    if let Ok(n) = digits.parse::<i64>() {
        Value::Number(n.into())
    } else if let Ok(n) = digits.parse::<u64>() {
        Value::Number(n.into())
    } else {
        parse_float(text)
    }
}

fn parse_float(text: &str) -> Value {
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}

/// Creates a `SimulatorError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> SimulatorError {
    SimulatorError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_mappings() {
        let input = r#"
q_states:
  q_list: [q0, q1]
  initial: q0
blank: _
"#;

        let value = parse(input).unwrap();
        assert_eq!(
            value,
            json!({
                "q_states": { "q_list": ["q0", "q1"], "initial": "q0" },
                "blank": "_"
            })
        );
    }

    #[test]
    fn test_parse_scalars() {
        let input = r#"
a: null
b: ~
c: true
d: False
e: 42
f: -7
g: 1.5
h: '0'
i: "x y"
j: plain text
"#;

        let value = parse(input).unwrap();
        assert_eq!(value["a"], Value::Null);
        assert_eq!(value["b"], Value::Null);
        assert_eq!(value["c"], json!(true));
        assert_eq!(value["d"], json!(false));
        assert_eq!(value["e"], json!(42));
        assert_eq!(value["f"], json!(-7));
        assert_eq!(value["g"], json!(1.5));
        assert_eq!(value["h"], json!("0"));
        assert_eq!(value["i"], json!("x y"));
        assert_eq!(value["j"], json!("plain text"));
    }

    #[test]
    fn test_parse_scalar_lookalikes_stay_strings() {
        let value = parse("a: nullable\nb: 12abc\nc: truex\n").unwrap();

        assert_eq!(value["a"], json!("nullable"));
        assert_eq!(value["b"], json!("12abc"));
        assert_eq!(value["c"], json!("truex"));
    }

    #[test]
    fn test_parse_flow_lists() {
        let value = parse("a: [1, 'x', \"_\", null]\nb: []\nc: [ ]\n").unwrap();

        assert_eq!(value["a"], json!([1, "x", "_", null]));
        assert_eq!(value["b"], json!([]));
        assert_eq!(value["c"], json!([]));
    }

    #[test]
    fn test_parse_comments() {
        let input = r#"
# leading comment
---
name: demo # trailing comment
symbol: '#'
list: [a, b] # after a list
"#;

        let value = parse(input).unwrap();
        assert_eq!(
            value,
            json!({ "name": "demo", "symbol": "#", "list": ["a", "b"] })
        );
    }

    #[test]
    fn test_parse_block_sequence_of_mappings() {
        let input = r#"
delta:
  - params:
      initial_state: q0
      tape_input: '1'
    output:
      final_state: qf
      tape_displacement: S
  - params:
      initial_state: q1
    output:
      final_state: q0
"#;

        let value = parse(input).unwrap();
        assert_eq!(
            value,
            json!({
                "delta": [
                    {
                        "params": { "initial_state": "q0", "tape_input": "1" },
                        "output": { "final_state": "qf", "tape_displacement": "S" }
                    },
                    {
                        "params": { "initial_state": "q1" },
                        "output": { "final_state": "q0" }
                    }
                ]
            })
        );
    }

    #[test]
    fn test_parse_scalar_sequence() {
        let input = "strings:\n  - '0'\n  - 011\n  - ''\n";

        let value = parse(input).unwrap();
        assert_eq!(value["strings"], json!(["0", 11, ""]));
    }

    #[test]
    fn test_parse_sequence_at_key_indent() {
        let input = "strings:\n- ab\n- ba\nblank: _\n";

        let value = parse(input).unwrap();
        assert_eq!(value, json!({ "strings": ["ab", "ba"], "blank": "_" }));
    }

    #[test]
    fn test_parse_bare_dash_item() {
        let input = "items:\n  -\n    a: 1\n  - b\n";

        let value = parse(input).unwrap();
        assert_eq!(value["items"], json!([{ "a": 1 }, "b"]));
    }

    #[test]
    fn test_parse_empty_block_is_null() {
        let value = parse("memory:\nblank: _\n").unwrap();

        assert_eq!(value, json!({ "memory": null, "blank": "_" }));
    }

    #[test]
    fn test_parse_empty_document() {
        assert_eq!(parse("").unwrap(), Value::Null);
        assert_eq!(parse("# only a comment\n\n").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_unexpected_indentation() {
        let result = parse("a: 1\n    b: 2\n");

        let error = result.unwrap_err();
        assert!(matches!(error, SimulatorError::ParseError(_)));
        assert!(error.to_string().contains("Unexpected indentation"));
    }

    #[test]
    fn test_parse_list_where_mapping_expected() {
        let result = parse("a: 1\n- b\n");

        let error = result.unwrap_err();
        assert!(error
            .to_string()
            .contains("Expected a mapping entry but found a list item"));
    }

    #[test]
    fn test_parse_entry_without_colon() {
        let result = parse("just words\n");

        assert!(matches!(result, Err(SimulatorError::ParseError(_))));
    }

    #[test]
    fn test_parse_rejects_oversized_input() {
        let input = format!("a: {}", "x".repeat(MAX_SPEC_SIZE));

        assert!(matches!(
            parse(&input),
            Err(SimulatorError::ValidationError(_))
        ));
    }
}
