// ABOUTME: Recursive-descent parser for "$..." expressions embedded in metadata strings.
// ABOUTME: Desugars field access, method calls and slicing into apply nodes.

use super::error::ParseError;
use super::script::Script;
use super::stdlib::{builtin_name, env_lookup};
use super::env::GLOBALS_KEY;

/// Deepest script tree the parser will build. Nested calls, indexes and
/// field chains all count towards it.
pub const MAX_NESTING: usize = 256;

/// Parse a metadata string into a script.
///
/// Strings that start with neither `$` nor `"` and contain no `{{` are plain
/// literals. A leading `$$` escapes the rest of the string as a literal that
/// starts with a single `$`. Everything else must parse completely.
pub fn parse_script(input: &str) -> Result<Script, ParseError> {
    if let Some(rest) = input.strip_prefix("$$") {
        return Ok(Script::String(format!("${rest}")));
    }
    if !input.starts_with('$') && !input.starts_with('"') && !input.contains("{{") {
        return Ok(Script::String(input.to_string()));
    }

    let mut parser = Parser::new(input);
    let script = parser.expression()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(script)
}

/// `$` itself: the globals dict.
fn globals() -> Script {
    Script::apply(env_lookup(), vec![Script::string(GLOBALS_KEY)])
}

/// `$name`: a lookup in the globals dict.
fn global(name: &str) -> Script {
    Script::apply(globals(), vec![Script::string(name)])
}

/// `recv.name(args)`: calls builtin `__name` with the receiver prepended.
fn method_call(name: &str, receiver: Script, args: Vec<Script>) -> Script {
    let mut all = Vec::with_capacity(args.len() + 1);
    all.push(receiver);
    all.extend(args);
    Script::apply(global(&builtin_name(name)), all)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError {
            input: self.input.to_string(),
            position: self.pos,
            message: message.to_string(),
        }
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<Script, ParseError> {
        let outer = self.depth;
        let result = self.nested_expression();
        self.depth = outer;
        result
    }

    fn nested_expression(&mut self) -> Result<Script, ParseError> {
        self.descend()?;
        self.skip_whitespace();
        let mut expr = match self.peek() {
            Some('"') => self.string_literal()?,
            Some('$') => self.dollar()?,
            Some(c) if c == '-' || c.is_ascii_digit() => self.integer()?,
            Some(_) => return Err(self.error("expected an expression")),
            None => return Err(self.error("unexpected end of input")),
        };

        loop {
            if self.eat('.') {
                self.descend()?;
                let name = self.identifier()?;
                expr = if self.peek() == Some('(') {
                    let args = self.arguments()?;
                    method_call(&name, expr, args)
                } else {
                    Script::apply(expr, vec![Script::string(name)])
                };
            } else if self.peek() == Some('[') {
                self.descend()?;
                expr = self.index(expr)?;
            } else {
                return Ok(expr);
            }
        }
    }

    fn dollar(&mut self) -> Result<Script, ParseError> {
        self.expect('$')?;
        let name = self.identifier()?;
        if self.peek() == Some('(') {
            let args = self.arguments()?;
            return Ok(Script::apply(global(&name), args));
        }
        Ok(global(&name))
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                self.bump();
            }
            _ => return Err(self.error("expected an identifier")),
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            self.bump();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn arguments(&mut self) -> Result<Vec<Script>, ParseError> {
        self.expect('(')?;
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.eat(')') {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            self.skip_whitespace();
            if self.eat(')') {
                return Ok(args);
            }
            self.expect(',')?;
        }
    }

    /// `[n]`, `[n:m]`, `[n:]` and `[:m]`.
    fn index(&mut self, target: Script) -> Result<Script, ParseError> {
        self.expect('[')?;
        self.skip_whitespace();

        let start = if self.peek() == Some(':') {
            None
        } else {
            Some(self.expression()?)
        };
        self.skip_whitespace();

        if self.eat(']') {
            let index = start.ok_or_else(|| self.error("empty index"))?;
            return Ok(Script::apply(
                global(&builtin_name("list_index")),
                vec![target, index],
            ));
        }

        self.expect(':')?;
        self.skip_whitespace();
        let end = if self.peek() == Some(']') {
            None
        } else {
            Some(self.expression()?)
        };
        self.skip_whitespace();
        self.expect(']')?;

        let mut args = vec![target, start.unwrap_or(Script::Integer(0))];
        args.extend(end);
        Ok(Script::apply(global(&builtin_name("list_slice")), args))
    }

    fn integer(&mut self) -> Result<Script, ParseError> {
        let start = self.pos;
        self.eat('-');
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        self.input[start..self.pos]
            .parse::<i64>()
            .map(Script::Integer)
            .map_err(|e| ParseError {
                input: self.input.to_string(),
                position: start,
                message: format!("invalid integer: {e}"),
            })
    }

    fn string_literal(&mut self) -> Result<Script, ParseError> {
        self.expect('"')?;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Script::String(value)),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(other) => {
                        return Err(self.error(&format!("unknown escape sequence '\\{other}'")));
                    }
                    None => return Err(self.error("unterminated escape sequence")),
                },
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }
    }
}
