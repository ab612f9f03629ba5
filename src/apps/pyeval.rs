//! Line-at-a-time evaluator for the terminal's `python` mode.
//!
//! Understands assignment, `print(...)` with string literals, f-strings,
//! variables and arithmetic. Anything block-structured is rejected.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("UnsupportedOperation: '{0}' statements require full interpreter")]
    Unsupported(String),
    #[error("SyntaxError: invalid print statement")]
    InvalidPrint,
    #[error("SyntaxError: {0}")]
    Syntax(String),
    #[error("NameError: name '{0}' is not defined")]
    UndefinedName(String),
    #[error("TypeError: '{0}' is not a number")]
    NotANumber(String),
    #[error("ZeroDivisionError: division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

const BLOCK_KEYWORDS: [&str; 7] = ["for", "while", "if", "def", "class", "import", "from"];

/// Variables live as long as the interpreter, i.e. one python session.
#[derive(Debug, Default)]
pub struct Interpreter {
    vars: HashMap<String, Value>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Run one line. `Ok(None)` means the line produced no output.
    pub fn run_line(&mut self, line: &str) -> Result<Option<String>, EvalError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let first_word = line.split_whitespace().next().unwrap_or_default();
        if BLOCK_KEYWORDS.contains(&first_word) && line.len() > first_word.len() {
            return Err(EvalError::Unsupported(first_word.to_string()));
        }

        if let Some((name, expr)) = split_assignment(line) {
            let value = self.eval_value(expr)?;
            tracing::trace!(name, %value, "python assignment");
            self.vars.insert(name.to_string(), value);
            return Ok(None);
        }

        if line.starts_with("print(") || line.starts_with("print (") {
            return self.print(line).map(Some);
        }

        // Bare expressions echo their value like the interactive prompt does.
        if let Some(value) = self.vars.get(line) {
            return Ok(Some(value.to_string()));
        }
        self.arith(line).map(|n| Some(format_number(n)))
    }

    fn print(&self, line: &str) -> Result<String, EvalError> {
        let open = line.find('(').ok_or(EvalError::InvalidPrint)?;
        let inner = line[open + 1..]
            .trim_end()
            .strip_suffix(')')
            .ok_or(EvalError::InvalidPrint)?
            .trim();

        if inner.is_empty() {
            return Ok(String::new());
        }
        if let Some(body) = inner
            .strip_prefix("f\"")
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| inner.strip_prefix("f'").and_then(|s| s.strip_suffix('\'')))
        {
            return self.interpolate(body);
        }
        if let Some(text) = string_literal(inner) {
            return Ok(text.to_string());
        }
        if let Some(value) = self.vars.get(inner) {
            return Ok(value.to_string());
        }
        self.arith(inner).map(format_number)
    }

    fn interpolate(&self, body: &str) -> Result<String, EvalError> {
        let mut out = String::with_capacity(body.len());
        let mut rest = body;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let expr = &after[..end];
            let name = expr.trim();
            if let Some(value) = self.vars.get(name) {
                out.push_str(&value.to_string());
            } else if expr.chars().any(|c| c.is_ascii_digit() || "+-*/".contains(c)) {
                out.push_str(&format_number(self.arith(expr)?));
            } else {
                out.push('{');
                out.push_str(expr);
                out.push('}');
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn eval_value(&self, expr: &str) -> Result<Value, EvalError> {
        let expr = expr.trim();
        if let Some(text) = string_literal(expr) {
            return Ok(Value::Str(text.to_string()));
        }
        match expr {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            _ => match self.vars.get(expr) {
                Some(v) => Ok(v.clone()),
                None => self.arith(expr).map(Value::Num),
            },
        }
    }

    fn arith(&self, expr: &str) -> Result<f64, EvalError> {
        let tokens = tokenize(expr)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            depth: 0,
            vars: &self.vars,
        };
        let value = parser.expression()?;
        if parser.pos < tokens.len() {
            return Err(EvalError::Syntax(format!("unexpected '{}'", tokens[parser.pos])));
        }
        Ok(value)
    }
}

fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let eq = line.find('=')?;
    let (name, rest) = (line[..eq].trim(), &line[eq + 1..]);
    if rest.starts_with('=') || rest.trim().is_empty() {
        return None;
    }
    let mut chars = name.chars();
    let head_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some((name, rest.trim()))
    } else {
        None
    }
}

fn string_literal(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && (last == b'"' || last == b'\'') {
            return Some(&s[1..s.len() - 1]);
        }
    }
    None
}

// ── Arithmetic ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Op(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{}", format_number(*n)),
            Token::Ident(s) => f.write_str(s),
            Token::Op(c) => write!(f, "{c}"),
        }
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let n = text
                .parse::<f64>()
                .map_err(|_| EvalError::Syntax(format!("invalid number '{text}'")))?;
            tokens.push(Token::Num(n));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else if c == '*' && chars.get(i + 1) == Some(&'*') {
            tokens.push(Token::Op('^'));
            i += 2;
        } else if "+-*/^()".contains(c) {
            tokens.push(Token::Op(c));
            i += 1;
        } else {
            return Err(EvalError::Syntax(format!("invalid character '{c}'")));
        }
    }
    Ok(tokens)
}

/// Deepest run of nested parentheses and unary minus an expression may have.
const MAX_DEPTH: usize = 256;

/// Precedence, loosest first: `+ -`, `* /`, `^`, unary minus and parentheses.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    vars: &'a HashMap<String, Value>,
}

impl Parser<'_> {
    fn peek_op(&self) -> Option<char> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(c)) => Some(*c),
            _ => None,
        }
    }

    fn expression(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek_op() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = if op == '+' { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek_op() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == '*' {
                acc *= rhs;
            } else if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            } else {
                acc /= rhs;
            }
        }
        Ok(acc)
    }

    fn factor(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.atom()?;
        while self.peek_op() == Some('^') {
            self.pos += 1;
            acc = acc.powf(self.atom()?);
        }
        Ok(acc)
    }

    fn atom(&mut self) -> Result<f64, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::Syntax("expression too deeply nested".into()));
        }
        self.depth += 1;
        let value = self.atom_inner();
        self.depth -= 1;
        value
    }

    fn atom_inner(&mut self) -> Result<f64, EvalError> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| EvalError::Syntax("unexpected end of expression".into()))?;
        self.pos += 1;
        match token {
            Token::Num(n) => Ok(*n),
            Token::Op('-') => Ok(-self.atom()?),
            Token::Op('(') => {
                let inner = self.expression()?;
                if self.peek_op() != Some(')') {
                    return Err(EvalError::Syntax("'(' was never closed".into()));
                }
                self.pos += 1;
                Ok(inner)
            }
            Token::Op(c) => Err(EvalError::Syntax(format!("unexpected '{c}'"))),
            Token::Ident(name) => match self.vars.get(name) {
                Some(Value::Num(n)) => Ok(*n),
                Some(_) => Err(EvalError::NotANumber(name.clone())),
                None => Err(EvalError::UndefinedName(name.clone())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(interp: &mut Interpreter, line: &str) -> Option<String> {
        interp.run_line(line).unwrap()
    }

    #[test]
    fn precedence_and_power() {
        let mut py = Interpreter::new();
        assert_eq!(run(&mut py, "print(2 + 3 * 4)").as_deref(), Some("14"));
        assert_eq!(run(&mut py, "print((2 + 3) * 4)").as_deref(), Some("20"));
        assert_eq!(run(&mut py, "print(2 ** 3 ^ 2)").as_deref(), Some("64"));
        assert_eq!(run(&mut py, "print(-3 + 5)").as_deref(), Some("2"));
        assert_eq!(run(&mut py, "print(7 / 2)").as_deref(), Some("3.5"));
    }

    #[test]
    fn assignment_and_lookup() {
        let mut py = Interpreter::new();
        assert_eq!(run(&mut py, "x = 4"), None);
        assert_eq!(run(&mut py, "name = 'Ada'"), None);
        assert_eq!(run(&mut py, "ok = True"), None);
        assert_eq!(py.get("x"), Some(&Value::Num(4.0)));
        assert_eq!(run(&mut py, "print(x * 2 + 1)").as_deref(), Some("9"));
        assert_eq!(run(&mut py, "print(name)").as_deref(), Some("Ada"));
        assert_eq!(run(&mut py, "print(ok)").as_deref(), Some("True"));
        assert_eq!(run(&mut py, "y = x ** 2"), None);
        assert_eq!(run(&mut py, "y").as_deref(), Some("16"));
    }

    #[test]
    fn fstrings_interpolate_names_and_math() {
        let mut py = Interpreter::new();
        run(&mut py, "n = 3");
        assert_eq!(
            run(&mut py, r#"print(f"n={n}, twice={n * 2}, {missing}")"#).as_deref(),
            Some("n=3, twice=6, {missing}")
        );
    }

    #[test]
    fn string_literals_print_verbatim() {
        let mut py = Interpreter::new();
        assert_eq!(run(&mut py, "print('hello world')").as_deref(), Some("hello world"));
        assert_eq!(run(&mut py, "# comment"), None);
        assert_eq!(run(&mut py, ""), None);
    }

    #[test]
    fn block_statements_are_rejected() {
        let mut py = Interpreter::new();
        for line in ["for i in range(3):", "def f():", "import os", "while True:"] {
            let err = py.run_line(line).unwrap_err();
            assert!(matches!(err, EvalError::Unsupported(_)), "{line}");
        }
        assert_eq!(
            py.run_line("class A:").unwrap_err().to_string(),
            "UnsupportedOperation: 'class' statements require full interpreter"
        );
    }

    #[test]
    fn errors_are_reported() {
        let mut py = Interpreter::new();
        assert_eq!(py.run_line("print(1 / 0)"), Err(EvalError::DivisionByZero));
        assert_eq!(
            py.run_line("print(z + 1)"),
            Err(EvalError::UndefinedName("z".into()))
        );
        assert_eq!(py.run_line("print(1"), Err(EvalError::InvalidPrint));
        assert!(matches!(py.run_line("print((1 + 2)"), Err(EvalError::Syntax(_))));
        run(&mut py, "s = 'txt'");
        assert_eq!(py.run_line("print(s + 1)"), Err(EvalError::NotANumber("s".into())));
    }

    #[test]
    fn runaway_nesting_is_a_syntax_error() {
        let mut py = Interpreter::new();
        let too_deep = Err(EvalError::Syntax("expression too deeply nested".into()));
        assert_eq!(py.run_line(&format!("print({}1)", "-".repeat(100_000))), too_deep);
        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(py.run_line(&parens), too_deep);
        assert_eq!(run(&mut py, &format!("print({}7)", "-".repeat(200))).as_deref(), Some("7"));
    }

    #[test]
    fn equality_is_not_assignment() {
        assert_eq!(split_assignment("x == 1"), None);
        assert_eq!(split_assignment("total = 1 + 2"), Some(("total", "1 + 2")));
        assert_eq!(split_assignment("2x = 1"), None);
    }
}
