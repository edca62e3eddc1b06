use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use sable_core::{SableError, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    Quote,
    Int(BigInt),
    Real(BigDecimal),
    Byte(u8),
    String(String),
    Symbol(String),
    Bool(bool),
    Nil,
    Dot,
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, SableError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    let mut line = 1;
    let mut col = 1;

    while i < chars.len() {
        let ch = chars[i];
        let span = Span::new(line, col);

        match ch {
            // Whitespace
            ' ' | '\t' | '\r' => {
                col += 1;
                i += 1;
            }
            '\n' => {
                line += 1;
                col = 1;
                i += 1;
            }

            // Comments
            ';' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }

            '(' | ')' | '\'' => {
                let token = match ch {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    _ => Token::Quote,
                };
                tokens.push(SpannedToken { token, span });
                col += 1;
                i += 1;
            }

            // Strings
            '"' => {
                let mut s = String::new();
                i += 1;
                col += 1;
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        i += 1;
                        col += 1;
                        match chars[i] {
                            'n' => s.push('\n'),
                            't' => s.push('\t'),
                            'r' => s.push('\r'),
                            '\\' => s.push('\\'),
                            '"' => s.push('"'),
                            '0' => s.push('\0'),
                            other => {
                                return Err(SableError::reader(
                                    format!("unknown string escape '\\{other}'"),
                                    span,
                                ));
                            }
                        }
                    } else {
                        if chars[i] == '\n' {
                            line += 1;
                            col = 0;
                        }
                        s.push(chars[i]);
                    }
                    i += 1;
                    col += 1;
                }
                if i >= chars.len() {
                    return Err(SableError::reader("unterminated string", span));
                }
                i += 1; // closing quote
                col += 1;
                tokens.push(SpannedToken {
                    token: Token::String(s),
                    span,
                });
            }

            // #t, #f, #x2a
            '#' => {
                let (token, len) = read_hash(&chars[i..], span)?;
                tokens.push(SpannedToken { token, span });
                i += len;
                col += len;
            }

            // Numbers and symbols
            _ => {
                let signed = matches!(ch, '-' | '+')
                    && i + 1 < chars.len()
                    && chars[i + 1].is_ascii_digit();
                if signed || ch.is_ascii_digit() {
                    let (token, len) = read_number(&chars[i..], span)?;
                    tokens.push(SpannedToken { token, span });
                    i += len;
                    col += len;
                } else if is_symbol_start(ch) {
                    let start = i;
                    while i < chars.len() && is_symbol_char(chars[i]) {
                        i += 1;
                        col += 1;
                    }
                    let name: String = chars[start..i].iter().collect();
                    let token = match name.as_str() {
                        "true" => Token::Bool(true),
                        "false" => Token::Bool(false),
                        "nil" => Token::Nil,
                        "." => Token::Dot,
                        _ => Token::Symbol(name),
                    };
                    tokens.push(SpannedToken { token, span });
                } else {
                    return Err(SableError::reader(
                        format!("unexpected character: '{ch}'"),
                        span,
                    ));
                }
            }
        }
    }

    Ok(tokens)
}

fn read_hash(chars: &[char], span: Span) -> Result<(Token, usize), SableError> {
    match chars.get(1) {
        Some('t') => Ok((Token::Bool(true), 2)),
        Some('f') => Ok((Token::Bool(false), 2)),
        Some('x') => {
            let digits: String = chars[2..]
                .iter()
                .take_while(|c| c.is_ascii_hexdigit())
                .collect();
            let byte = u8::from_str_radix(&digits, 16).map_err(|_| {
                SableError::reader(format!("invalid byte literal: #x{digits}"), span)
            })?;
            Ok((Token::Byte(byte), 2 + digits.len()))
        }
        Some(other) => Err(SableError::reader(
            format!("unexpected character after #: '{other}'"),
            span,
        )),
        None => Err(SableError::reader("unexpected end of input after #", span)),
    }
}

fn read_number(chars: &[char], span: Span) -> Result<(Token, usize), SableError> {
    let mut i = 0;
    if matches!(chars[i], '-' | '+') {
        i += 1;
    }
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    let is_real =
        i < chars.len() && chars[i] == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit();
    if is_real {
        i += 1; // skip dot
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < chars.len() && is_symbol_char(chars[i]) && chars[i] != '.' {
        let s: String = chars[..=i].iter().collect();
        return Err(SableError::reader(format!("invalid number: {s}"), span));
    }
    let s: String = chars[..i].iter().collect();
    let digits = s.strip_prefix('+').unwrap_or(&s);
    if is_real {
        let d: BigDecimal = digits
            .parse()
            .map_err(|_| SableError::reader(format!("invalid decimal: {s}"), span))?;
        Ok((Token::Real(d), i))
    } else {
        let n: BigInt = digits
            .parse()
            .map_err(|_| SableError::reader(format!("invalid integer: {s}"), span))?;
        Ok((Token::Int(n), i))
    }
}

fn is_symbol_start(ch: char) -> bool {
    ch.is_alphabetic()
        || matches!(
            ch,
            '+' | '-' | '*' | '/' | '!' | '?' | '<' | '>' | '=' | '_' | '&' | '%' | '^' | '~' | '.'
        )
}

fn is_symbol_char(ch: char) -> bool {
    is_symbol_start(ch) || ch.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_delimiters_and_quote() {
        assert_eq!(
            kinds("'(a)"),
            vec![
                Token::Quote,
                Token::LParen,
                Token::Symbol("a".into()),
                Token::RParen
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42"), vec![Token::Int(BigInt::from(42))]);
        assert_eq!(kinds("-7"), vec![Token::Int(BigInt::from(-7))]);
        assert_eq!(kinds("+3"), vec![Token::Int(BigInt::from(3))]);
        assert_eq!(
            kinds("2.50"),
            vec![Token::Real("2.50".parse::<BigDecimal>().unwrap())]
        );
        assert_eq!(
            kinds("123456789012345678901234567890"),
            vec![Token::Int(
                "123456789012345678901234567890".parse::<BigInt>().unwrap()
            )]
        );
    }

    #[test]
    fn test_sign_alone_is_symbol() {
        assert_eq!(
            kinds("- +"),
            vec![Token::Symbol("-".into()), Token::Symbol("+".into())]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds("#t #f true false nil #x2a ."),
            vec![
                Token::Bool(true),
                Token::Bool(false),
                Token::Bool(true),
                Token::Bool(false),
                Token::Nil,
                Token::Byte(42),
                Token::Dot,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\n\\""#),
            vec![Token::String("a\"b\n\\".into())]
        );
    }

    #[test]
    fn test_comments_and_spans() {
        let tokens = tokenize("; header\n  (x)").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].span, Span::new(2, 3));
        assert_eq!(tokens[1].span, Span::new(2, 4));
    }

    #[test]
    fn test_errors() {
        assert!(tokenize("\"open").is_err());
        assert!(tokenize("#q").is_err());
        assert!(tokenize("12abc").is_err());
        assert!(tokenize("#x").is_err());
        assert!(tokenize("\"bad \\q\"").is_err());
    }
}
