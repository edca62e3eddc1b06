use sable_core::{Node, SableError, Span, Value};

use crate::lexer::{tokenize, SpannedToken, Token};

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or(Span::new(0, 0))
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn parse_expr(&mut self) -> Result<Node, SableError> {
        let span = self.span();
        match self.peek() {
            None => Err(SableError::reader("unexpected end of input", span)),
            Some(Token::LParen) => self.parse_list(),
            Some(Token::RParen) => Err(SableError::reader("unexpected ')'", span)),
            Some(Token::Quote) => {
                self.advance();
                let inner = self.parse_expr()?;
                Ok(Node::form(Value::id("quote"), vec![inner]))
            }
            Some(_) => self.parse_atom(),
        }
    }

    /// `(head a b)` keeps `head` as the node value. A head that is itself a
    /// form is read as `(apply head a b)`.
    fn parse_list(&mut self) -> Result<Node, SableError> {
        let open_span = self.span();
        self.advance(); // (
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RParen) => break,
                None => return Err(SableError::reader("unterminated list", open_span)),
                _ => items.push(self.parse_expr()?),
            }
        }
        self.advance(); // )

        let mut items = items.into_iter();
        let node = match items.next() {
            None => Node::form(Value::Nil, Vec::new()),
            Some(head) if head.is_atom() => Node::form(head.value().clone(), items.collect()),
            Some(head) => {
                let mut children = vec![head];
                children.extend(items);
                Node::form(Value::id("apply"), children)
            }
        };
        Ok(node)
    }

    fn parse_atom(&mut self) -> Result<Node, SableError> {
        let span = self.span();
        let Some(tok) = self.advance() else {
            return Err(SableError::reader("unexpected end of input", span));
        };
        let value = match &tok.token {
            Token::Int(n) => Value::Int(n.clone()),
            Token::Real(d) => Value::Real(d.clone()),
            Token::Byte(b) => Value::Byte(*b),
            Token::String(s) => Value::string(s),
            Token::Symbol(s) => Value::id(s),
            Token::Bool(b) => Value::Bool(*b),
            Token::Nil => Value::Nil,
            Token::Dot => Value::id("."),
            other => {
                return Err(SableError::reader(
                    format!("unexpected token: {other:?}"),
                    span,
                ))
            }
        };
        Ok(Node::atom(value))
    }
}

/// Read exactly one expression.
pub fn read(input: &str) -> Result<Node, SableError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens);
    let node = parser.parse_expr()?;
    if !parser.at_end() {
        return Err(SableError::reader(
            "unexpected input after expression",
            parser.span(),
        ));
    }
    Ok(node)
}

/// Read every top-level expression in `input`.
pub fn read_many(input: &str) -> Result<Vec<Node>, SableError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens);
    let mut nodes = Vec::new();
    while !parser.at_end() {
        nodes.push(parser.parse_expr()?);
    }
    tracing::trace!(forms = nodes.len(), "read");
    Ok(nodes)
}
