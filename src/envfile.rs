//! Evaluation of environment files.
//!
//! Environment files are written as shell scripts made only of variable assignments.
//! They are evaluated here, starting from an empty environment, by a small interpreter
//! for the subset of POSIX shell that makes sense in such a file: assignments, quoting,
//! parameter and arithmetic expansion, `export` and `unset`. Nothing is ever executed.

use std::collections::BTreeMap;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct EnvFileError {
    pub line: usize,
    pub kind: EnvFileErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum EnvFileErrorKind {
    #[error("unterminated {0}")]
    Unterminated(&'static str),
    #[error("bad substitution")]
    BadSubstitution,
    #[error("`{0}`: not a valid identifier")]
    InvalidName(String),
    #[error("`{0}`: only assignments, export and unset are allowed")]
    UnsupportedCommand(String),
    #[error("{0} is not allowed")]
    Unsupported(&'static str),
    #[error("syntax error in arithmetic expression `{0}`")]
    Arithmetic(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("expansions nested too deeply")]
    TooDeep,
}

/// Deepest nesting of expansions, and of operators and parentheses inside an arithmetic
/// expression.
const MAX_DEPTH: usize = 128;

/// Evaluate an environment file and return every variable it leaves set.
pub fn evaluate(content: &str) -> Result<BTreeMap<String, String>, EnvFileError> {
    Evaluator::new(content).run()
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn check_name(word: &str) -> Result<(), EnvFileErrorKind> {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if is_name_start(c) && chars.all(is_name_char) => Ok(()),
        _ => Err(EnvFileErrorKind::InvalidName(word.to_owned())),
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Command {
    Export,
    Unset,
    NoOp,
}

impl Command {
    fn parse(word: &str) -> Result<Self, EnvFileErrorKind> {
        match word {
            "export" => Ok(Command::Export),
            "unset" => Ok(Command::Unset),
            ":" | "true" => Ok(Command::NoOp),
            _ => Err(EnvFileErrorKind::UnsupportedCommand(word.to_owned())),
        }
    }
}

struct Evaluator {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    // Depth of expansion words whose value is discarded; side effects are suppressed there.
    skipping: usize,
    depth: usize,
    vars: BTreeMap<String, String>,
}

impl Evaluator {
    fn new(content: &str) -> Self {
        Self {
            chars: content.chars().collect(),
            pos: 0,
            line: 1,
            skipping: 0,
            depth: 0,
            vars: BTreeMap::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn lookup(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or_default()
    }

    fn assign(&mut self, name: String, value: String) {
        if self.skipping == 0 {
            self.vars.insert(name, value);
        }
    }

    fn run(mut self) -> Result<BTreeMap<String, String>, EnvFileError> {
        loop {
            self.skip_blanks();
            match self.peek() {
                None => return Ok(self.vars),
                Some('\n' | ';') => {
                    self.bump();
                }
                Some('#') => self.skip_comment(),
                Some(_) => {
                    let line = self.line;
                    self.statement()
                        .map_err(|kind| EnvFileError { line, kind })?;
                }
            }
        }
    }

    fn skip_blanks(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t') => self.pos += 1,
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                _ => return,
            }
        }
    }

    fn skip_comment(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.pos += 1;
        }
    }

    fn statement(&mut self) -> Result<(), EnvFileErrorKind> {
        let mut command = None;
        loop {
            self.skip_blanks();
            match self.peek() {
                None | Some('\n' | ';') => return Ok(()),
                Some('#') => {
                    self.skip_comment();
                    return Ok(());
                }
                Some(_) => {}
            }

            if matches!(command, None | Some(Command::Export)) {
                if let Some(name) = self.assignment_prefix() {
                    let value = self.word()?;
                    self.assign(name, value);
                    continue;
                }
            }

            let word = self.word()?;
            match command {
                None => command = Some(Command::parse(&word)?),
                Some(Command::Export) => check_name(&word)?,
                Some(Command::Unset) if word == "-v" => {}
                Some(Command::Unset) => {
                    check_name(&word)?;
                    self.vars.remove(&word);
                }
                Some(Command::NoOp) => {}
            }
        }
    }

    /// Consume `NAME=` if the next word is an assignment.
    fn assignment_prefix(&mut self) -> Option<String> {
        if !self.peek().is_some_and(is_name_start) {
            return None;
        }
        let mut end = self.pos;
        while self.chars.get(end).is_some_and(|&c| is_name_char(c)) {
            end += 1;
        }
        if self.chars.get(end) != Some(&'=') {
            return None;
        }
        let name = self.chars[self.pos..end].iter().collect();
        self.pos = end + 1;
        Some(name)
    }

    fn name(&mut self) -> String {
        let mut name = String::new();
        if self.peek().is_some_and(is_name_start) {
            while let Some(c) = self.peek().filter(|&c| is_name_char(c)) {
                name.push(c);
                self.pos += 1;
            }
        }
        name
    }

    fn word(&mut self) -> Result<String, EnvFileErrorKind> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\n' | ';' => break,
                '|' | '&' | '<' | '>' | '(' | ')' => {
                    return Err(EnvFileErrorKind::Unsupported(
                        "control operators and redirections",
                    ));
                }
                '`' => return Err(EnvFileErrorKind::Unsupported("command substitution")),
                '\\' => {
                    self.bump();
                    match self.bump() {
                        Some('\n') => {}
                        Some(c) => out.push(c),
                        None => out.push('\\'),
                    }
                }
                '\'' => {
                    self.bump();
                    self.single_quoted(&mut out)?;
                }
                '"' => {
                    self.bump();
                    self.double_quoted(&mut out)?;
                }
                '$' => {
                    self.bump();
                    self.expansion(&mut out)?;
                }
                _ => {
                    self.bump();
                    out.push(c);
                }
            }
        }
        Ok(out)
    }

    fn single_quoted(&mut self, out: &mut String) -> Result<(), EnvFileErrorKind> {
        loop {
            match self.bump() {
                None => return Err(EnvFileErrorKind::Unterminated("single quote")),
                Some('\'') => return Ok(()),
                Some(c) => out.push(c),
            }
        }
    }

    fn double_quoted(&mut self, out: &mut String) -> Result<(), EnvFileErrorKind> {
        loop {
            match self.bump() {
                None => return Err(EnvFileErrorKind::Unterminated("double quote")),
                Some('"') => return Ok(()),
                Some('\\') => match self.peek() {
                    Some(c @ ('$' | '"' | '\\' | '`')) => {
                        self.bump();
                        out.push(c);
                    }
                    Some('\n') => {
                        self.bump();
                    }
                    _ => out.push('\\'),
                },
                Some('$') => self.expansion(out)?,
                Some('`') => return Err(EnvFileErrorKind::Unsupported("command substitution")),
                Some(c) => out.push(c),
            }
        }
    }

    /// Expand what follows a `$` into `out`.
    fn expansion(&mut self, out: &mut String) -> Result<(), EnvFileErrorKind> {
        if self.depth == MAX_DEPTH {
            return Err(EnvFileErrorKind::TooDeep);
        }
        self.depth += 1;
        let res = self.expand(out);
        self.depth -= 1;
        res
    }

    fn expand(&mut self, out: &mut String) -> Result<(), EnvFileErrorKind> {
        match self.peek() {
            Some('{') => {
                self.bump();
                self.braced(out)
            }
            Some('(') if self.peek_at(1) == Some('(') => {
                self.pos += 2;
                let value = self.arithmetic()?;
                out.push_str(&value.to_string());
                Ok(())
            }
            Some('(') => Err(EnvFileErrorKind::Unsupported("command substitution")),
            Some(c) if is_name_start(c) => {
                let name = self.name();
                out.push_str(self.lookup(&name));
                Ok(())
            }
            // No positional parameters in an environment file.
            Some(c) if c.is_ascii_digit() || c == '@' || c == '*' => {
                self.bump();
                Ok(())
            }
            Some('#' | '?') => {
                self.bump();
                out.push('0');
                Ok(())
            }
            _ => {
                out.push('$');
                Ok(())
            }
        }
    }

    fn braced(&mut self, out: &mut String) -> Result<(), EnvFileErrorKind> {
        if self.peek() == Some('#') && self.peek_at(1).is_some_and(is_name_start) {
            self.bump();
            let name = self.name();
            if !self.eat('}') {
                return Err(EnvFileErrorKind::BadSubstitution);
            }
            out.push_str(&self.lookup(&name).chars().count().to_string());
            return Ok(());
        }

        let name = self.name();
        if name.is_empty() {
            return Err(match self.peek() {
                None => EnvFileErrorKind::Unterminated("parameter expansion"),
                Some(_) => EnvFileErrorKind::BadSubstitution,
            });
        }
        let colon = self.eat(':');
        let op = match self.bump() {
            Some('}') if !colon => {
                out.push_str(self.lookup(&name));
                return Ok(());
            }
            Some(op @ ('-' | '=' | '+')) => op,
            None => return Err(EnvFileErrorKind::Unterminated("parameter expansion")),
            Some(_) => return Err(EnvFileErrorKind::BadSubstitution),
        };

        // With a colon, an empty value counts as unset.
        let current = self
            .vars
            .get(&name)
            .filter(|v| !colon || !v.is_empty())
            .cloned();
        let word_used = (op == '+') == current.is_some();
        if !word_used {
            self.skipping += 1;
        }
        let word = self.braced_word();
        if !word_used {
            self.skipping -= 1;
        }
        let word = word?;

        match (op, current) {
            ('+', Some(_)) => out.push_str(&word),
            ('+', None) => {}
            (_, Some(value)) => out.push_str(&value),
            ('=', None) => {
                out.push_str(&word);
                self.assign(name, word);
            }
            (_, None) => out.push_str(&word),
        }
        Ok(())
    }

    fn braced_word(&mut self) -> Result<String, EnvFileErrorKind> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(EnvFileErrorKind::Unterminated("parameter expansion")),
                Some('}') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('\n') => {}
                    Some(c) => out.push(c),
                    None => return Err(EnvFileErrorKind::Unterminated("parameter expansion")),
                },
                Some('\'') => self.single_quoted(&mut out)?,
                Some('"') => self.double_quoted(&mut out)?,
                Some('$') => self.expansion(&mut out)?,
                Some('`') => return Err(EnvFileErrorKind::Unsupported("command substitution")),
                Some(c) => out.push(c),
            }
        }
    }

    /// Evaluate `$((...))`, the opening parentheses being already consumed.
    fn arithmetic(&mut self) -> Result<i64, EnvFileErrorKind> {
        let mut expr = String::new();
        let mut depth = 0usize;
        loop {
            match self.bump() {
                None => return Err(EnvFileErrorKind::Unterminated("arithmetic expansion")),
                Some('(') => {
                    depth += 1;
                    expr.push('(');
                }
                Some(')') if depth > 0 => {
                    depth -= 1;
                    expr.push(')');
                }
                Some(')') if self.eat(')') => break,
                Some(')') => return Err(EnvFileErrorKind::Arithmetic(expr)),
                Some('$') => self.expansion(&mut expr)?,
                Some(c) => expr.push(c),
            }
        }
        match Arith::eval(&expr, &self.vars) {
            Err(_) if self.skipping > 0 => Ok(0),
            res => res,
        }
    }
}

/// Integer constant in C notation: `0x` prefix for hexadecimal, leading `0` for octal.
fn parse_number(text: &str) -> Option<i64> {
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None if text.len() > 1 && text.starts_with('0') => (&text[1..], 8),
        None => (text, 10),
    };
    if radix != 10 && !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    i64::from_str_radix(digits, radix).ok()
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(i64),
    Name(String),
    Op(char),
}

struct Arith<'a> {
    expr: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    vars: &'a BTreeMap<String, String>,
}

impl<'a> Arith<'a> {
    fn eval(expr: &'a str, vars: &'a BTreeMap<String, String>) -> Result<i64, EnvFileErrorKind> {
        let tokens = Self::tokenize(expr)?;
        if tokens.is_empty() {
            return Ok(0);
        }
        let mut arith = Arith {
            expr,
            tokens,
            pos: 0,
            depth: 0,
            vars,
        };
        let value = arith.sum()?;
        if arith.pos != arith.tokens.len() {
            return Err(arith.syntax_error());
        }
        Ok(value)
    }

    fn tokenize(expr: &str) -> Result<Vec<Token>, EnvFileErrorKind> {
        let syntax_error = || EnvFileErrorKind::Arithmetic(expr.to_owned());
        let mut tokens = Vec::new();
        let mut chars = expr.chars().peekable();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
            } else if c.is_ascii_digit() {
                let mut digits = String::new();
                while let Some(d) = chars.next_if(char::is_ascii_alphanumeric) {
                    digits.push(d);
                }
                tokens.push(Token::Num(parse_number(&digits).ok_or_else(syntax_error)?));
            } else if is_name_start(c) {
                let mut name = String::new();
                while let Some(n) = chars.next_if(|&n| is_name_char(n)) {
                    name.push(n);
                }
                tokens.push(Token::Name(name));
            } else if "+-*/%()".contains(c) {
                chars.next();
                tokens.push(Token::Op(c));
            } else {
                return Err(syntax_error());
            }
        }
        Ok(tokens)
    }

    fn syntax_error(&self) -> EnvFileErrorKind {
        EnvFileErrorKind::Arithmetic(self.expr.to_owned())
    }

    fn next_op(&mut self, ops: &str) -> Option<char> {
        match self.tokens.get(self.pos) {
            Some(&Token::Op(op)) if ops.contains(op) => {
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn sum(&mut self) -> Result<i64, EnvFileErrorKind> {
        let mut value = self.product()?;
        while let Some(op) = self.next_op("+-") {
            let rhs = self.product()?;
            value = match op {
                '+' => value.wrapping_add(rhs),
                _ => value.wrapping_sub(rhs),
            };
        }
        Ok(value)
    }

    fn product(&mut self) -> Result<i64, EnvFileErrorKind> {
        let mut value = self.unary()?;
        while let Some(op) = self.next_op("*/%") {
            let rhs = self.unary()?;
            value = match op {
                '*' => value.wrapping_mul(rhs),
                _ if rhs == 0 => return Err(EnvFileErrorKind::DivisionByZero),
                '/' => value.wrapping_div(rhs),
                _ => value.wrapping_rem(rhs),
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<i64, EnvFileErrorKind> {
        if self.depth == MAX_DEPTH {
            return Err(EnvFileErrorKind::TooDeep);
        }
        self.depth += 1;
        let value = match self.next_op("+-") {
            Some('-') => self.unary().map(i64::wrapping_neg),
            Some(_) => self.unary(),
            None => self.primary(),
        };
        self.depth -= 1;
        value
    }

    fn primary(&mut self) -> Result<i64, EnvFileErrorKind> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        match token {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Name(name)) => {
                let value = self.vars.get(&name).map(|v| v.trim()).unwrap_or_default();
                if value.is_empty() {
                    return Ok(0);
                }
                parse_number(value).ok_or_else(|| EnvFileErrorKind::Arithmetic(value.to_owned()))
            }
            Some(Token::Op('(')) => {
                let value = self.sum()?;
                if self.next_op(")").is_none() {
                    return Err(self.syntax_error());
                }
                Ok(value)
            }
            _ => Err(self.syntax_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(content: &str) -> BTreeMap<String, String> {
        evaluate(content).unwrap()
    }

    fn var<'a>(vars: &'a BTreeMap<String, String>, name: &str) -> &'a str {
        vars.get(name).map(String::as_str).unwrap_or("<unset>")
    }

    #[test]
    fn assignments_and_export() {
        let vars = eval("FOO=bar\nexport BAZ=qux; A=1 B=$A\n");
        assert_eq!(var(&vars, "FOO"), "bar");
        assert_eq!(var(&vars, "BAZ"), "qux");
        assert_eq!(var(&vars, "A"), "1");
        assert_eq!(var(&vars, "B"), "1");
        assert_eq!(vars.len(), 4);
    }

    #[test]
    fn quoting() {
        let vars = eval(
            r#"A='x $y'
B="v=$A \"q\" \$z"
C=a\ b
D="multi
line"
"#,
        );
        assert_eq!(var(&vars, "A"), "x $y");
        assert_eq!(var(&vars, "B"), r#"v=x $y "q" $z"#);
        assert_eq!(var(&vars, "C"), "a b");
        assert_eq!(var(&vars, "D"), "multi\nline");
    }

    #[test]
    fn comments() {
        let vars = eval("# header\nA=1 # trailing\nB=a#b\n   # indented\n");
        assert_eq!(var(&vars, "A"), "1");
        assert_eq!(var(&vars, "B"), "a#b");
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn parameter_expansion() {
        let vars = eval(
            "E=\n\
             X=${UNSET:-def}\n\
             Y=${UNSET-d2}\n\
             Z=${E-keep}\n\
             W=${E:-alt}\n\
             V=${N:=set}\n\
             P=${X:+plus}${UNSET+never}\n\
             S=hello; L=${#S}; M=${S}world\n",
        );
        assert_eq!(var(&vars, "X"), "def");
        assert_eq!(var(&vars, "Y"), "d2");
        assert_eq!(var(&vars, "Z"), "");
        assert_eq!(var(&vars, "W"), "alt");
        assert_eq!(var(&vars, "V"), "set");
        assert_eq!(var(&vars, "N"), "set");
        assert_eq!(var(&vars, "P"), "plus");
        assert_eq!(var(&vars, "L"), "5");
        assert_eq!(var(&vars, "M"), "helloworld");
    }

    #[test]
    fn nested_default_words() {
        let vars = eval("B=inner\nA=${UNSET:-\"${B} word\"}\n");
        assert_eq!(var(&vars, "A"), "inner word");
    }

    #[test]
    fn arithmetic() {
        let vars = eval(
            "N=3\nM=$((N * (2 + 4) - 10 % 4))\nK=$(( -$N + ${M} ))\nZ=$((UNSET + 1))\n",
        );
        assert_eq!(var(&vars, "M"), "16");
        assert_eq!(var(&vars, "K"), "13");
        assert_eq!(var(&vars, "Z"), "1");
    }

    #[test]
    fn octal_and_hex_constants() {
        let vars = eval("A=$((010))\nB=$((0x10 + 0X1f))\nC=$((0))\nN=017\nD=$((N + 1))\n");
        assert_eq!(var(&vars, "A"), "8");
        assert_eq!(var(&vars, "B"), "47");
        assert_eq!(var(&vars, "C"), "0");
        assert_eq!(var(&vars, "D"), "16");

        let err = evaluate("A=$((09))\n").unwrap_err();
        assert_eq!(err.kind, EnvFileErrorKind::Arithmetic("09".to_owned()));
        let err = evaluate("A=$((0x))\n").unwrap_err();
        assert_eq!(err.kind, EnvFileErrorKind::Arithmetic("0x".to_owned()));
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let depth = 20_000;
        let inputs = [
            format!("A=1\nB=$(({}1))\n", "-".repeat(depth)),
            format!("A=1\nB=$(({}1{}))\n", "(".repeat(depth), ")".repeat(depth)),
            format!("A=1\nB={}x{}\n", "${U:-".repeat(depth), "}".repeat(depth)),
        ];
        for input in &inputs {
            let err = evaluate(input).unwrap_err();
            assert_eq!(
                err,
                EnvFileError {
                    line: 2,
                    kind: EnvFileErrorKind::TooDeep
                }
            );
        }
    }

    #[test]
    fn moderate_nesting_is_fine() {
        let vars = eval(&format!("A={}x{}\n", "${U:-".repeat(50), "}".repeat(50)));
        assert_eq!(var(&vars, "A"), "x");
        let vars = eval(&format!("A=$(({}2{} * 3))\n", "(".repeat(50), ")".repeat(50)));
        assert_eq!(var(&vars, "A"), "6");
        let vars = eval(&format!("A=$(({}1))\n", "-".repeat(50)));
        assert_eq!(var(&vars, "A"), "1");
    }

    #[test]
    fn division_by_zero_reports_line() {
        let err = evaluate("A=1\nB=$((A / 0))\n").unwrap_err();
        assert_eq!(
            err,
            EnvFileError {
                line: 2,
                kind: EnvFileErrorKind::DivisionByZero
            }
        );
        assert_eq!(err.to_string(), "line 2: division by zero");
    }

    #[test]
    fn unused_default_is_not_evaluated() {
        let vars = eval("A=1\nB=${A:-$((1/0))}${A:-${C:=x}}\n");
        assert_eq!(var(&vars, "B"), "11");
        assert!(!vars.contains_key("C"));
    }

    #[test]
    fn unset_and_noops() {
        let vars = eval("A=1; B=2\nunset A\n:\ntrue\nexport B C\n");
        assert!(!vars.contains_key("A"));
        assert_eq!(var(&vars, "B"), "2");
        assert!(!vars.contains_key("C"));
    }

    #[test]
    fn commands_are_rejected() {
        let err = evaluate("A=1\n\necho hi\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(
            err.kind,
            EnvFileErrorKind::UnsupportedCommand("echo".to_owned())
        );

        let err = evaluate("A=$(id -u)").unwrap_err();
        assert_eq!(
            err.kind,
            EnvFileErrorKind::Unsupported("command substitution")
        );

        let err = evaluate("A=1 && B=2").unwrap_err();
        assert!(matches!(err.kind, EnvFileErrorKind::Unsupported(_)));
    }

    #[test]
    fn malformed_input() {
        let err = evaluate("A='abc\n").unwrap_err();
        assert_eq!(err.kind, EnvFileErrorKind::Unterminated("single quote"));

        let err = evaluate("A=${B").unwrap_err();
        assert_eq!(
            err.kind,
            EnvFileErrorKind::Unterminated("parameter expansion")
        );

        let err = evaluate("A=${B?oops}").unwrap_err();
        assert_eq!(err.kind, EnvFileErrorKind::BadSubstitution);

        let err = evaluate("export 1A").unwrap_err();
        assert_eq!(err.kind, EnvFileErrorKind::InvalidName("1A".to_owned()));

        let err = evaluate("A=$((1 +))").unwrap_err();
        assert_eq!(err.kind, EnvFileErrorKind::Arithmetic("1 +".to_owned()));
    }

    #[test]
    fn empty_file() {
        assert!(eval("").is_empty());
        assert!(eval("\n\n# nothing\n;\n").is_empty());
    }
}
