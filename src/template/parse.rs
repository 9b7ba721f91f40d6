// src/template/parse.rs

//! Template lexing and parsing
//!
//! Turns template text into a node tree. Actions are delimited by `{{` and
//! `}}`; `{{- ` and ` -}}` trim the whitespace of the adjacent text, and
//! `{{/* ... */}}` is a comment.

use super::error::{TemplateError, TemplateResult};

/// A parsed template node
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Action(Pipeline),
    If {
        cond: Pipeline,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Range {
        over: Pipeline,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// Commands chained with `|`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    pub commands: Vec<Command>,
}

/// One command: a function call or a single operand
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Command {
    pub operands: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    /// `.`
    Dot,
    /// `.a.b.c`
    Field(Vec<String>),
    Str(String),
    Int(i64),
    Bool(bool),
    /// Function name
    Ident(String),
    /// `( pipeline )`
    Sub(Pipeline),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Pipe,
    Dot,
    Field(Vec<String>),
    Ident(String),
    Str(String),
    Int(i64),
}

/// Lexed template item, before tree building
#[derive(Debug)]
enum Item {
    Text(String),
    Action { tokens: Vec<Token>, line: usize },
}

/// Parse template text into nodes
pub(crate) fn parse(text: &str) -> TemplateResult<Vec<Node>> {
    let items = Lexer::new(text).items()?;
    let mut builder = TreeBuilder { items, pos: 0 };
    let (nodes, end) = builder.list()?;
    match end {
        ListEnd::Eof => Ok(nodes),
        ListEnd::Else(line) => Err(TemplateError::syntax(line, "unexpected {{else}}")),
        ListEnd::End(line) => Err(TemplateError::syntax(line, "unexpected {{end}}")),
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek_str(&self, s: &str) -> bool {
        let mut i = self.pos;
        for c in s.chars() {
            if self.chars.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn items(mut self) -> TemplateResult<Vec<Item>> {
        let mut items = Vec::new();
        let mut text = String::new();
        let mut trim_next = false;

        while self.pos < self.chars.len() {
            if !self.peek_str("{{") {
                if let Some(c) = self.bump() {
                    text.push(c);
                }
                continue;
            }

            let line = self.line;
            self.advance(2);

            // `{{- ` trims the text before the action
            let next_is_space = self
                .chars
                .get(self.pos + 1)
                .is_some_and(|c| c.is_whitespace());
            if self.peek_str("-") && next_is_space {
                text.truncate(text.trim_end().len());
                self.advance(1);
            }

            if trim_next {
                text = text.trim_start().to_string();
            }
            if !text.is_empty() {
                items.push(Item::Text(std::mem::take(&mut text)));
            }

            self.skip_space();
            if self.peek_str("/*") {
                trim_next = self.comment(line)?;
                continue;
            }

            let (tokens, trim_right) = self.action(line)?;
            trim_next = trim_right;
            items.push(Item::Action { tokens, line });
        }

        if trim_next {
            text = text.trim_start().to_string();
        }
        if !text.is_empty() {
            items.push(Item::Text(text));
        }
        Ok(items)
    }

    fn skip_space(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
    }

    /// Consume `/* ... */` and the closing delimiter; returns the right-trim flag
    fn comment(&mut self, line: usize) -> TemplateResult<bool> {
        self.advance(2);
        while !self.peek_str("*/") {
            if self.bump().is_none() {
                return Err(TemplateError::syntax(line, "unclosed comment"));
            }
        }
        self.advance(2);
        self.skip_space();
        if self.peek_str("-}}") {
            self.advance(3);
            Ok(true)
        } else if self.peek_str("}}") {
            self.advance(2);
            Ok(false)
        } else {
            Err(TemplateError::syntax(line, "comment must end the action"))
        }
    }

    /// Lex the inside of an action up to and including `}}`
    fn action(&mut self, line: usize) -> TemplateResult<(Vec<Token>, bool)> {
        let mut tokens = Vec::new();

        loop {
            self.skip_space();
            let Some(&c) = self.chars.get(self.pos) else {
                return Err(TemplateError::syntax(line, "unclosed action"));
            };

            if self.peek_str("}}") {
                self.advance(2);
                return Ok((tokens, false));
            }
            if self.peek_str("-}}") {
                let preceded_by_space = self
                    .pos
                    .checked_sub(1)
                    .and_then(|i| self.chars.get(i))
                    .is_some_and(|c| c.is_whitespace());
                if preceded_by_space {
                    self.advance(3);
                    return Ok((tokens, true));
                }
            }

            match c {
                '(' => {
                    self.bump();
                    tokens.push(Token::LParen);
                }
                ')' => {
                    self.bump();
                    tokens.push(Token::RParen);
                }
                '|' => {
                    self.bump();
                    tokens.push(Token::Pipe);
                }
                '.' => tokens.push(self.field(line)?),
                '"' => tokens.push(Token::Str(self.quoted(line)?)),
                '`' => tokens.push(Token::Str(self.raw_string(line)?)),
                '-' | '0'..='9' => tokens.push(Token::Int(self.number(line)?)),
                c if is_ident_start(c) => {
                    let ident = self.ident();
                    tokens.push(Token::Ident(ident));
                }
                other => {
                    return Err(TemplateError::syntax(
                        line,
                        format!("unexpected character {other:?} in action"),
                    ));
                }
            }
        }
    }

    fn ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(&c) = self.chars.get(self.pos) {
            if is_ident_char(c) {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        ident
    }

    fn field(&mut self, line: usize) -> TemplateResult<Token> {
        let mut path = Vec::new();
        while self.peek_str(".") {
            let starts_ident = self
                .chars
                .get(self.pos + 1)
                .is_some_and(|&c| is_ident_start(c));
            if !starts_ident {
                break;
            }
            self.bump();
            path.push(self.ident());
        }

        if path.is_empty() {
            self.bump();
            if self.chars.get(self.pos).is_some_and(|&c| c == '.') {
                return Err(TemplateError::syntax(line, "unexpected '.' after '.'"));
            }
            return Ok(Token::Dot);
        }
        Ok(Token::Field(path))
    }

    fn quoted(&mut self, line: usize) -> TemplateResult<String> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(TemplateError::syntax(line, "unterminated quoted string"));
                }
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    other => {
                        return Err(TemplateError::syntax(
                            line,
                            format!("unknown escape sequence {other:?}"),
                        ));
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn raw_string(&mut self, line: usize) -> TemplateResult<String> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(TemplateError::syntax(line, "unterminated raw string")),
                Some('`') => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self, line: usize) -> TemplateResult<i64> {
        let mut digits = String::new();
        if self.peek_str("-") {
            digits.push('-');
            self.bump();
        }
        while let Some(&c) = self.chars.get(self.pos) {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        digits
            .parse()
            .map_err(|_| TemplateError::syntax(line, format!("bad number {digits:?}")))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

enum ListEnd {
    Eof,
    Else(usize),
    End(usize),
}

struct TreeBuilder {
    items: Vec<Item>,
    pos: usize,
}

impl TreeBuilder {
    /// Parse nodes until `{{else}}`, `{{end}}` or end of input
    fn list(&mut self) -> TemplateResult<(Vec<Node>, ListEnd)> {
        let mut nodes = Vec::new();

        while self.pos < self.items.len() {
            let idx = self.pos;
            self.pos += 1;

            let (tokens, line) = match &self.items[idx] {
                Item::Text(text) => {
                    nodes.push(Node::Text(text.clone()));
                    continue;
                }
                Item::Action { tokens, line } => (tokens.clone(), *line),
            };

            match tokens.first() {
                Some(Token::Ident(kw)) if kw == "end" => {
                    expect_bare(&tokens, line, "end")?;
                    return Ok((nodes, ListEnd::End(line)));
                }
                Some(Token::Ident(kw)) if kw == "else" => {
                    expect_bare(&tokens, line, "else")?;
                    return Ok((nodes, ListEnd::Else(line)));
                }
                Some(Token::Ident(kw)) if kw == "if" || kw == "range" => {
                    let is_if = kw == "if";
                    let pipeline = parse_pipeline(&tokens[1..], line)?;
                    let (body, otherwise) = self.block(line, kw)?;
                    nodes.push(if is_if {
                        Node::If {
                            cond: pipeline,
                            then: body,
                            otherwise,
                        }
                    } else {
                        Node::Range {
                            over: pipeline,
                            body,
                            otherwise,
                        }
                    });
                }
                _ => nodes.push(Node::Action(parse_pipeline(&tokens, line)?)),
            }
        }

        Ok((nodes, ListEnd::Eof))
    }

    /// Body of an `if`/`range` plus its optional `else` branch
    fn block(&mut self, line: usize, keyword: &str) -> TemplateResult<(Vec<Node>, Vec<Node>)> {
        let (body, end) = self.list()?;
        match end {
            ListEnd::End(_) => Ok((body, Vec::new())),
            ListEnd::Else(else_line) => {
                let (otherwise, end) = self.list()?;
                match end {
                    ListEnd::End(_) => Ok((body, otherwise)),
                    ListEnd::Else(l) => Err(TemplateError::syntax(l, "{{else}} after {{else}}")),
                    ListEnd::Eof => Err(TemplateError::syntax(
                        else_line,
                        format!("missing {{{{end}}}} for {{{{{keyword}}}}}"),
                    )),
                }
            }
            ListEnd::Eof => Err(TemplateError::syntax(
                line,
                format!("missing {{{{end}}}} for {{{{{keyword}}}}}"),
            )),
        }
    }
}

fn expect_bare(tokens: &[Token], line: usize, keyword: &str) -> TemplateResult<()> {
    if tokens.len() != 1 {
        return Err(TemplateError::syntax(
            line,
            format!("unexpected arguments to {{{{{keyword}}}}}"),
        ));
    }
    Ok(())
}

fn parse_pipeline(tokens: &[Token], line: usize) -> TemplateResult<Pipeline> {
    let mut parser = TokenParser {
        tokens,
        pos: 0,
        line,
    };
    let pipeline = parser.pipeline()?;
    if parser.pos != tokens.len() {
        return Err(TemplateError::syntax(line, "unexpected ')'"));
    }
    Ok(pipeline)
}

struct TokenParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    line: usize,
}

impl TokenParser<'_> {
    /// Parse commands separated by `|`, stopping before `)` or end of tokens
    fn pipeline(&mut self) -> TemplateResult<Pipeline> {
        let mut commands = vec![self.command()?];
        while self.tokens.get(self.pos) == Some(&Token::Pipe) {
            self.pos += 1;
            commands.push(self.command()?);
        }
        Ok(Pipeline { commands })
    }

    fn command(&mut self) -> TemplateResult<Command> {
        let mut operands = Vec::new();
        while let Some(token) = self.tokens.get(self.pos).cloned() {
            if matches!(token, Token::Pipe | Token::RParen) {
                break;
            }
            self.pos += 1;
            operands.push(self.operand(token)?);
        }
        if operands.is_empty() {
            return Err(TemplateError::syntax(self.line, "missing value for command"));
        }
        Ok(Command { operands })
    }

    fn operand(&mut self, token: Token) -> TemplateResult<Operand> {
        Ok(match token {
            Token::Dot => Operand::Dot,
            Token::Field(path) => Operand::Field(path),
            Token::Str(s) => Operand::Str(s),
            Token::Int(i) => Operand::Int(i),
            Token::Ident(name) if name == "true" => Operand::Bool(true),
            Token::Ident(name) if name == "false" => Operand::Bool(false),
            Token::Ident(name) => {
                if matches!(name.as_str(), "if" | "range" | "else" | "end") {
                    return Err(TemplateError::syntax(
                        self.line,
                        format!("unexpected keyword {name:?}"),
                    ));
                }
                Operand::Ident(name)
            }
            Token::LParen => {
                let inner = self.pipeline()?;
                if self.tokens.get(self.pos) != Some(&Token::RParen) {
                    return Err(TemplateError::syntax(self.line, "unclosed '('"));
                }
                self.pos += 1;
                Operand::Sub(inner)
            }
            Token::RParen | Token::Pipe => {
                return Err(TemplateError::syntax(self.line, "unexpected token"));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_action(text: &str) -> Pipeline {
        match parse(text).unwrap().as_slice() {
            [Node::Action(p)] => p.clone(),
            other => panic!("expected one action, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            parse("make install").unwrap(),
            vec![Node::Text("make install".to_string())]
        );
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_field_chain_and_call() {
        let p = single_action("{{ extract \"foo\" .Version .data.ext }}");
        assert_eq!(
            p.commands[0].operands,
            vec![
                Operand::Ident("extract".to_string()),
                Operand::Str("foo".to_string()),
                Operand::Field(vec!["Version".to_string()]),
                Operand::Field(vec!["data".to_string(), "ext".to_string()]),
            ]
        );
    }

    #[test]
    fn test_pipeline_and_parens() {
        let p = single_action("{{ (join .sources \",\") | upper }}");
        assert_eq!(p.commands.len(), 2);
        assert!(matches!(p.commands[0].operands[0], Operand::Sub(_)));
    }

    #[test]
    fn test_trim_markers_and_comments() {
        let nodes = parse("a  {{- .x -}}  b{{/* note */}}c").unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Text("a".to_string()),
                Node::Action(Pipeline {
                    commands: vec![Command {
                        operands: vec![Operand::Field(vec!["x".to_string()])]
                    }]
                }),
                Node::Text("b".to_string()),
                Node::Text("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_if_else_range() {
        let nodes = parse("{{if .a}}x{{else}}y{{end}}{{range .l}}{{.}}{{end}}").unwrap();
        assert!(matches!(&nodes[0], Node::If { then, otherwise, .. } if then.len() == 1 && otherwise.len() == 1));
        assert!(matches!(&nodes[1], Node::Range { body, .. } if body.len() == 1));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in [
            "{{ .x",
            "{{ \"open }}",
            "{{ end }}",
            "{{ if .x }}never closed",
            "{{ ( .x }}",
            "{{ }}",
            "{{ .x ) }}",
            "{{ # }}",
            "{{ else }}",
        ] {
            assert!(
                matches!(parse(bad), Err(TemplateError::Syntax { .. })),
                "expected syntax error for {bad:?}"
            );
        }
    }

    #[test]
    fn test_syntax_error_line_numbers() {
        match parse("line one\nline two {{ .x") {
            Err(TemplateError::Syntax { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
