//! Calculator tool: arithmetic over `+ - * /`, parentheses and `sqrt`

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::tool::{ParameterType, Tool, ToolError, ToolParameter};

const DEFAULT_PRECISION: usize = 6;
const MAX_DEPTH: usize = 128;

/// Evaluates arithmetic expressions
#[derive(Debug, Default, Clone, Copy)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Deserialize)]
struct CalculatorArgs {
    input: String,
    precision: Option<usize>,
}

impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Supports + - * /, parentheses and sqrt()."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::new("input", ParameterType::String, "Expression such as 2 + 3 * 4"),
            ToolParameter::new(
                "precision",
                ParameterType::Integer,
                "Maximum number of decimal places in the result",
            )
            .optional()
            .with_default(DEFAULT_PRECISION),
        ]
    }

    fn run(&self, args: Value) -> Result<String, ToolError> {
        let args: CalculatorArgs = serde_json::from_value(args)?;
        debug!("Calculating: {}", args.input);

        let value = evaluate(&args.input)?;
        Ok(format_number(value, args.precision.unwrap_or(DEFAULT_PRECISION)))
    }
}

/// Evaluate an expression to a finite number
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let mut parser = Parser {
        chars: expression.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
        depth: 0,
    };
    if parser.chars.is_empty() {
        return Err("empty expression".to_string());
    }

    let value = parser.expr()?;
    if let Some(c) = parser.peek() {
        return Err(format!("unexpected '{}' at position {}", c, parser.pos));
    }
    if !value.is_finite() {
        return Err("result is not a finite number".to_string());
    }
    Ok(value)
}

fn format_number(value: f64, precision: usize) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let text = format!("{:.*}", precision, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        loop {
            if self.eat('*') {
                value *= self.factor()?;
            } else if self.eat('/') {
                let divisor = self.factor()?;
                if divisor == 0.0 {
                    return Err("division by zero".to_string());
                }
                value /= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    /// Every recursive path passes through here, so bounding it bounds the stack.
    fn factor(&mut self) -> Result<f64, String> {
        if self.depth >= MAX_DEPTH {
            return Err("expression nested too deeply".to_string());
        }
        self.depth += 1;
        let value = self.unary();
        self.depth -= 1;
        value
    }

    fn unary(&mut self) -> Result<f64, String> {
        if self.eat('-') {
            return Ok(-self.factor()?);
        }
        if self.eat('+') {
            return self.factor();
        }
        if self.eat('(') {
            let value = self.expr()?;
            if !self.eat(')') {
                return Err("missing ')'".to_string());
            }
            return Ok(value);
        }
        match self.peek() {
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.function(),
            Some(c) => Err(format!("unexpected '{}' at position {}", c, self.pos)),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>().map_err(|_| format!("invalid number '{}'", text))
    }

    fn function(&mut self) -> Result<f64, String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        if name != "sqrt" {
            return Err(format!("unknown function '{}'", name));
        }
        if !self.eat('(') {
            return Err("expected '(' after sqrt".to_string());
        }
        let arg = self.expr()?;
        if !self.eat(')') {
            return Err("missing ')'".to_string());
        }
        if arg < 0.0 {
            return Err("sqrt of a negative number".to_string());
        }
        Ok(arg.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 2 * 3").unwrap(), 8.0);
        assert_eq!(evaluate("(2 + 2) * 3").unwrap(), 12.0);
        assert_eq!(evaluate("-3 + 5").unwrap(), 2.0);
        assert_eq!(evaluate("sqrt(16) / 2").unwrap(), 2.0);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(evaluate("").is_err());
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("cbrt(8)").is_err());
        assert!(evaluate("1.2.3").is_err());
    }

    #[test]
    fn bounds_nesting_depth() {
        let nested = format!("{}1{}", "(".repeat(MAX_DEPTH - 1), ")".repeat(MAX_DEPTH - 1));
        assert_eq!(evaluate(&nested).unwrap(), 1.0);

        let deep = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(evaluate(&deep).unwrap_err(), "expression nested too deeply");

        let negations = format!("{}1", "-".repeat(200_000));
        assert_eq!(evaluate(&negations).unwrap_err(), "expression nested too deeply");
    }

    #[test]
    fn formats_results() {
        assert_eq!(format_number(4.0, 6), "4");
        assert_eq!(format_number(2.5, 6), "2.5");
        assert_eq!(format_number(1.0 / 3.0, 6), "0.333333");
        assert_eq!(format_number(1.0 / 3.0, 2), "0.33");
    }
}
