//! Accessor text: a restricted expression language and its decomposition.
//!
//! An accessor reads like a Rust closure body, optionally with its header:
//!
//! ```text
//! o => o.customer.address.city
//! |o| o.lines[0].quantity
//! tags["priority"]
//! o => (o.customer as Vip).tier
//! ```
//!
//! The parser accepts a general expression grammar on purpose, so that
//! [`decompose`] can point at the node that is not a member or indexer
//! access instead of failing with a bare syntax error.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::{IndexArg, PathError, Segment};

/// A parsed accessor body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    /// The closure parameter, i.e. the root being built.
    Param,
    /// An identifier that is not the parameter.
    Name(String),
    Member {
        target: Box<Expr>,
        name: String,
    },
    Index {
        target: Box<Expr>,
        args: Vec<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Cast {
        operand: Box<Expr>,
        ty: String,
    },
    Literal(Literal),
    Unary {
        op: &'static str,
        operand: Box<Expr>,
    },
    Binary {
        op: &'static str,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
    Int(i128),
    Str(String),
    Char(char),
    Bool(bool),
}

impl Literal {
    fn to_arg(&self) -> IndexArg {
        match self {
            Literal::Int(n) => IndexArg::int(*n),
            Literal::Str(s) => IndexArg::str(s.clone()),
            Literal::Char(c) => IndexArg::char(*c),
            Literal::Bool(b) => IndexArg::bool(*b),
        }
    }
}

impl core::fmt::Display for Literal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Str(s) => write!(f, "{s:?}"),
            Literal::Char(c) => write!(f, "{c:?}"),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl Expr {
    /// Human description of the node, used in error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Expr::Param => "the root parameter".to_string(),
            Expr::Name(name) => format!("variable `{name}`"),
            Expr::Member { name, .. } => format!("member access `{name}`"),
            Expr::Index { .. } => "indexer access".to_string(),
            Expr::Call { callee, .. } => match &**callee {
                Expr::Member { name, .. } => format!("method call `{name}`"),
                Expr::Name(name) => format!("function call `{name}`"),
                _ => "call".to_string(),
            },
            Expr::Cast { ty, .. } => format!("cast to `{ty}`"),
            Expr::Literal(lit) => format!("literal `{lit}`"),
            Expr::Unary { op, .. } => format!("unary operator `{op}`"),
            Expr::Binary { op, .. } => format!("binary operator `{op}`"),
        }
    }
}

/// Turn a parsed accessor into segments, outermost first.
///
/// Member and indexer accesses become segments, casts are looked through,
/// and anything else is rejected. Indexer arguments are evaluated here.
pub(crate) fn decompose(expr: &Expr, text: &str) -> Result<Vec<Segment>, PathError> {
    let mut segments = Vec::new();
    let mut current = expr;
    loop {
        match current {
            Expr::Param => break,
            Expr::Member { target, name } => {
                segments.push(Segment::member(name.clone()));
                current = target;
            }
            Expr::Index { target, args } => {
                let args = args
                    .iter()
                    .map(|arg| evaluate(arg, text))
                    .collect::<Result<Vec<_>, _>>()?;
                segments.push(Segment::index(args));
                current = target;
            }
            Expr::Cast { operand, .. } => current = operand,
            other => return Err(unsupported(other.describe(), text)),
        }
    }
    segments.reverse();
    if segments.is_empty() {
        return Err(PathError::Empty {
            expression: text.to_string(),
        });
    }
    Ok(segments)
}

fn evaluate(arg: &Expr, text: &str) -> Result<IndexArg, PathError> {
    match arg {
        Expr::Literal(lit) => Ok(lit.to_arg()),
        Expr::Cast { operand, .. } => evaluate(operand, text),
        Expr::Unary { op: "-", operand } => match &**operand {
            Expr::Literal(Literal::Int(n)) => Ok(IndexArg::int(-n)),
            _ => Err(unsupported(
                format!("{} as an index argument", arg.describe()),
                text,
            )),
        },
        other => Err(unsupported(
            format!("{} as an index argument", other.describe()),
            text,
        )),
    }
}

fn unsupported(node: String, text: &str) -> PathError {
    PathError::UnsupportedPathExpression {
        node,
        expression: text.to_string(),
    }
}

/// Parse accessor text into an expression rooted at [`Expr::Param`].
pub(crate) fn parse(text: &str) -> Result<Expr, PathError> {
    let tokens = lex(text)?;
    if let Some(extra) = tokens.get(MAX_TOKENS) {
        return Err(PathError::Syntax {
            expression: text.to_string(),
            position: extra.pos,
            message: format!("accessor is longer than {MAX_TOKENS} tokens"),
        });
    }
    let mut parser = Parser {
        text,
        tokens,
        pos: 0,
        depth: 0,
        param: None,
    };
    parser.header();
    let body = parser.expression()?;
    match parser.peek() {
        Tok::End => Ok(body),
        tok => Err(parser.error(format!("unexpected {}", tok.describe()))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Int(i128),
    Str(String),
    Char(char),
    Punct(&'static str),
    End,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Ident(name) => format!("`{name}`"),
            Tok::Int(n) => format!("`{n}`"),
            Tok::Str(s) => format!("`{s:?}`"),
            Tok::Char(c) => format!("`{c:?}`"),
            Tok::Punct(p) => format!("`{p}`"),
            Tok::End => "end of path".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    pos: usize,
}

const PUNCTS_2: &[&str] = &["=>", "==", "!=", "<=", ">=", "&&", "||", "::"];
const PUNCTS_1: &[&str] = &[
    ".", ",", "[", "]", "(", ")", "|", "&", "+", "-", "*", "/", "%", "<", ">", "!", "=", "?",
];
const INT_SUFFIXES: &[&str] = &[
    "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64", "i128", "isize",
];

fn lex(text: &str) -> Result<Vec<Token>, PathError> {
    let syntax = |position: usize, message: String| PathError::Syntax {
        expression: text.to_string(),
        position,
        message,
    };

    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !(c.is_alphanumeric() || c == '_') {
                    break;
                }
                ident.push(c);
                chars.next();
            }
            tokens.push(Token {
                tok: Tok::Ident(ident),
                pos,
            });
            continue;
        }

        if c.is_ascii_digit() {
            let mut digits = String::new();
            let mut suffix = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !suffix.is_empty() && (c.is_alphanumeric() || c == '_') {
                    suffix.push(c);
                } else if c.is_ascii_digit() || c == '_' {
                    if c != '_' {
                        digits.push(c);
                    }
                } else if c.is_alphanumeric() {
                    suffix.push(c);
                } else {
                    break;
                }
                chars.next();
            }
            if !suffix.is_empty() && !INT_SUFFIXES.contains(&suffix.as_str()) {
                return Err(syntax(pos, format!("invalid integer suffix `{suffix}`")));
            }
            let n = digits
                .parse::<i128>()
                .map_err(|_| syntax(pos, format!("integer `{digits}` is out of range")))?;
            tokens.push(Token {
                tok: Tok::Int(n),
                pos,
            });
            continue;
        }

        if c == '"' {
            chars.next();
            let mut s = String::new();
            loop {
                match chars.next() {
                    Some((_, '"')) => break,
                    Some((at, '\\')) => s.push(escape(chars.next().map(|(_, c)| c), at, text)?),
                    Some((_, c)) => s.push(c),
                    None => return Err(syntax(pos, "unterminated string literal".to_string())),
                }
            }
            tokens.push(Token {
                tok: Tok::Str(s),
                pos,
            });
            continue;
        }

        if c == '\'' {
            chars.next();
            let value = match chars.next() {
                Some((at, '\\')) => escape(chars.next().map(|(_, c)| c), at, text)?,
                Some((_, c)) if c != '\'' => c,
                _ => return Err(syntax(pos, "empty character literal".to_string())),
            };
            match chars.next() {
                Some((_, '\'')) => {}
                _ => return Err(syntax(pos, "unterminated character literal".to_string())),
            }
            tokens.push(Token {
                tok: Tok::Char(value),
                pos,
            });
            continue;
        }

        let rest = &text[pos..];
        let punct = PUNCTS_2
            .iter()
            .chain(PUNCTS_1.iter())
            .find(|p| rest.starts_with(**p));
        match punct {
            Some(p) => {
                for _ in 0..p.len() {
                    chars.next();
                }
                tokens.push(Token {
                    tok: Tok::Punct(*p),
                    pos,
                });
            }
            None => return Err(syntax(pos, format!("unexpected character `{c}`"))),
        }
    }

    tokens.push(Token {
        tok: Tok::End,
        pos: text.len(),
    });
    Ok(tokens)
}

fn escape(c: Option<char>, at: usize, text: &str) -> Result<char, PathError> {
    match c {
        Some('n') => Ok('\n'),
        Some('t') => Ok('\t'),
        Some('r') => Ok('\r'),
        Some('0') => Ok('\0'),
        Some(c @ ('\\' | '"' | '\'')) => Ok(c),
        other => Err(PathError::Syntax {
            expression: text.to_string(),
            position: at,
            message: match other {
                Some(c) => format!("unknown escape `\\{c}`"),
                None => "unterminated escape".to_string(),
            },
        }),
    }
}

struct Parser<'t> {
    text: &'t str,
    tokens: Vec<Token>,
    pos: usize,
    /// Open parentheses, argument lists and prefix operators around `pos`.
    depth: usize,
    /// Name of the closure parameter, when the accessor has a header.
    param: Option<String>,
}

const MAX_TOKENS: usize = 4096;
const MAX_NESTING: usize = 64;

const BINARY_LEVELS: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &["==", "!=", "<", ">", "<=", ">="],
    &["|", "&"],
    &["+", "-"],
    &["*", "/", "%"],
];

impl Parser<'_> {
    fn peek(&self) -> &Tok {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Tok {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.tok)
            .unwrap_or(&Tok::End)
    }

    fn bump(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, punct: &str) -> bool {
        if matches!(self.peek(), Tok::Punct(p) if *p == punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), PathError> {
        if self.eat(punct) {
            Ok(())
        } else {
            let found = self.peek().describe();
            Err(self.error(format!("expected `{punct}`, found {found}")))
        }
    }

    /// A syntax error at the next token.
    fn error(&self, message: String) -> PathError {
        self.error_at(self.pos, message)
    }

    /// A syntax error at the token just consumed.
    fn error_before(&self, message: String) -> PathError {
        self.error_at(self.pos.saturating_sub(1), message)
    }

    fn error_at(&self, index: usize, message: String) -> PathError {
        let position = self
            .tokens
            .get(index)
            .map(|t| t.pos)
            .unwrap_or(self.text.len());
        PathError::Syntax {
            expression: self.text.to_string(),
            position,
            message,
        }
    }

    /// Consume `o =>` or `|o|` if present.
    fn header(&mut self) {
        let param = match (self.peek_at(0), self.peek_at(1), self.peek_at(2)) {
            (Tok::Ident(name), Tok::Punct("=>"), _) => Some((name.clone(), 2)),
            (Tok::Punct("|"), Tok::Ident(name), Tok::Punct("|")) => Some((name.clone(), 3)),
            _ => None,
        };
        if let Some((name, len)) = param {
            self.param = Some(name);
            self.pos += len;
        }
    }

    fn expression(&mut self) -> Result<Expr, PathError> {
        self.nested(|p| p.binary(0))
    }

    fn nested(
        &mut self,
        inner: impl FnOnce(&mut Self) -> Result<Expr, PathError>,
    ) -> Result<Expr, PathError> {
        if self.depth == MAX_NESTING {
            return Err(self.error(format!("accessor nests deeper than {MAX_NESTING} levels")));
        }
        self.depth += 1;
        let expr = inner(self);
        self.depth -= 1;
        expr
    }

    fn binary(&mut self, level: usize) -> Result<Expr, PathError> {
        let Some(ops) = BINARY_LEVELS.get(level) else {
            return self.cast();
        };
        let mut lhs = self.binary(level + 1)?;
        loop {
            let op = match self.peek() {
                Tok::Punct(p) if ops.contains(p) => *p,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.binary(level + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn cast(&mut self) -> Result<Expr, PathError> {
        let mut operand = self.unary()?;
        while matches!(self.peek(), Tok::Ident(kw) if kw == "as") {
            self.pos += 1;
            let ty = self.type_name()?;
            operand = Expr::Cast {
                operand: Box::new(operand),
                ty,
            };
        }
        Ok(operand)
    }

    fn unary(&mut self) -> Result<Expr, PathError> {
        for op in ["-", "!", "&", "*"] {
            if self.eat(op) {
                let operand = self.nested(Self::unary)?;
                return Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                });
            }
        }
        self.postfix()
    }

    /// `Name`, `path::Name`, `Name<Args>`.
    fn type_name(&mut self) -> Result<String, PathError> {
        let mut ty = match self.bump() {
            Tok::Ident(name) => name,
            tok => {
                return Err(self.error_before(format!("expected a type, found {}", tok.describe())));
            }
        };
        loop {
            if self.eat("::") {
                match self.bump() {
                    Tok::Ident(name) => {
                        ty.push_str("::");
                        ty.push_str(&name);
                    }
                    tok => {
                        return Err(self
                            .error_before(format!("expected a type, found {}", tok.describe())));
                    }
                }
            } else if self.eat("<") {
                ty.push('<');
                let mut depth = 1usize;
                while depth > 0 {
                    match self.bump() {
                        Tok::Punct("<") => {
                            depth += 1;
                            ty.push('<');
                        }
                        Tok::Punct(">") => {
                            depth -= 1;
                            ty.push('>');
                        }
                        Tok::Punct(",") => ty.push_str(", "),
                        Tok::Punct("::") => ty.push_str("::"),
                        Tok::Ident(name) => ty.push_str(&name),
                        tok => {
                            return Err(self.error_before(format!(
                                "unexpected {} in type arguments",
                                tok.describe()
                            )));
                        }
                    }
                }
            } else {
                return Ok(ty);
            }
        }
    }

    fn postfix(&mut self) -> Result<Expr, PathError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                let name = match self.bump() {
                    Tok::Ident(name) => name,
                    Tok::Int(n) if n >= 0 => n.to_string(),
                    tok => {
                        return Err(self.error_before(format!(
                            "expected a member name after `.`, found {}",
                            tok.describe()
                        )));
                    }
                };
                expr = Expr::Member {
                    target: Box::new(expr),
                    name,
                };
            } else if self.eat("[") {
                let args = self.arguments("]")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    args,
                };
            } else if self.eat("(") {
                let args = self.arguments(")")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn arguments(&mut self, close: &str) -> Result<Vec<Expr>, PathError> {
        let mut args = Vec::new();
        if self.eat(close) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(close) {
                return Ok(args);
            }
            self.expect(",")?;
        }
    }

    fn primary(&mut self) -> Result<Expr, PathError> {
        match self.bump() {
            Tok::Ident(name) if name == "true" => Ok(Expr::Literal(Literal::Bool(true))),
            Tok::Ident(name) if name == "false" => Ok(Expr::Literal(Literal::Bool(false))),
            Tok::Ident(name) => {
                let mut name = name;
                while self.eat("::") {
                    match self.bump() {
                        Tok::Ident(next) => {
                            name.push_str("::");
                            name.push_str(&next);
                        }
                        tok => {
                            return Err(self.error_before(format!(
                                "expected an identifier after `::`, found {}",
                                tok.describe()
                            )));
                        }
                    }
                }
                Ok(match &self.param {
                    Some(param) if *param == name => Expr::Param,
                    Some(_) => Expr::Name(name),
                    // without a header, a leading identifier is a member of the root
                    None if !name.contains("::") => Expr::Member {
                        target: Box::new(Expr::Param),
                        name,
                    },
                    None => Expr::Name(name),
                })
            }
            Tok::Int(n) => Ok(Expr::Literal(Literal::Int(n))),
            Tok::Str(s) => Ok(Expr::Literal(Literal::Str(s))),
            Tok::Char(c) => Ok(Expr::Literal(Literal::Char(c))),
            Tok::Punct("(") => {
                let inner = self.expression()?;
                self.expect(")")?;
                Ok(inner)
            }
            Tok::Punct("[") if self.param.is_none() => {
                let args = self.arguments("]")?;
                Ok(Expr::Index {
                    target: Box::new(Expr::Param),
                    args,
                })
            }
            tok => Err(self.error_before(format!(
                "expected an expression, found {}",
                tok.describe()
            ))),
        }
    }
}
