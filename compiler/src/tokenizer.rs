use regex::Regex;
use lazy_static::lazy_static;
use crate::utils::{quote, error};
use crate::error::MsgWireError;

lazy_static! {
    pub static ref TOKEN_REGEX:   Regex = Regex::new(r"(\n|#[^\n]*|[ \t\r]+|=|(?:<=|[^\s=#])+)").unwrap();
    pub static ref WHITESPACE_RX: Regex = Regex::new(r"^(#.*|[ \t\r]+)$").unwrap();
}

/// Text of the token that ends every line.
pub const NEWLINE: &str = "\n";

#[derive(Debug, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

/// Splits `.msg` text into words, `=` and line breaks. Comments and blanks
/// are dropped; an empty token marks the end of input.
pub fn tokenize_msg(text: &str) -> Result<Vec<Token>, MsgWireError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let end   = mat.end();
        let part  = mat.as_str();

        if start > last_end {
            // Unexpected text between last_end and start
            let unexpected = &text[last_end..start];
            return Err(error(
                &format!("Syntax error: {}", quote(unexpected)),
                line,
                column,
            ));
        }

        if !WHITESPACE_RX.is_match(part) {
            tokens.push(Token {
                text:   part.to_string(),
                line,
                column,
            });
        }

        if part == NEWLINE {
            line += 1;
            column = 1;
        } else {
            column += part.chars().count();
        }

        last_end = end;
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        return Err(error(
            &format!("Syntax error: {}", quote(unexpected)),
            line,
            column,
        ));
    }

    // Append EOF token
    tokens.push(Token {
        text:   "".to_string(),
        line,
        column,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_field_line() {
        let input = "float64[36] covariance";
        let expected = vec![
            Token { text: "float64[36]".into(), line: 1, column: 1 },
            Token { text: "covariance".into(),  line: 1, column: 13 },
            Token { text: "".into(),            line: 1, column: 23 },
        ];
        let got = tokenize_msg(input).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_tokenize_constant_and_comment() {
        let input = "# header\nint32 MAX=10  # trailing\n";
        let expected = vec![
            Token { text: "\n".into(),    line: 1, column: 9 },
            Token { text: "int32".into(), line: 2, column: 1 },
            Token { text: "MAX".into(),   line: 2, column: 7 },
            Token { text: "=".into(),     line: 2, column: 10 },
            Token { text: "10".into(),    line: 2, column: 11 },
            Token { text: "\n".into(),    line: 2, column: 25 },
            Token { text: "".into(),      line: 3, column: 1 },
        ];
        let got = tokenize_msg(input).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_tokenize_bounded_types() {
        let got = tokenize_msg("string<=10 name\nint32[<=5] values").unwrap();
        let texts: Vec<&str> = got.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["string<=10", "name", "\n", "int32[<=5]", "values", ""]);
    }

    #[test]
    fn test_tokenize_unexpected_text() {
        let input = "int32 x\u{000B}";
        let err = tokenize_msg(input).unwrap_err();
        assert!(
            matches!(err, MsgWireError::ParseError { line: 1, column: 8, .. }),
            "expected a ParseError but got {:?}",
            err
        );
    }
}
