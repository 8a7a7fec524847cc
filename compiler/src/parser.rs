use crate::{
    tokenizer::{tokenize_msg, Token, NEWLINE},
    types::{MsgConstant, MsgField, MsgFile},
    utils::{error, quote},
    error::MsgWireError,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref TYPE_TOKEN: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_/<=>\[\],]*$").unwrap();
    static ref EQUALS:     Regex = Regex::new(r"^=$").unwrap();
    static ref EOF:        Regex = Regex::new(r"^$").unwrap();
}

/// Tokenizes and parses the text of `<package>/msg/<name>.msg`.
pub fn compile_msg(package: &str, name: &str, text: &str) -> Result<MsgFile, MsgWireError> {
    let tokens = tokenize_msg(text)?;
    parse_msg(package, name, &tokens)
}

/// Each non-empty line is either a field, `type name [default]`, or a
/// constant, `type NAME=value`.
pub fn parse_msg(package: &str, name: &str, tokens: &[Token]) -> Result<MsgFile, MsgWireError> {
    let mut fields    = Vec::new();
    let mut constants = Vec::new();
    let mut index     = 0;

    fn current_token<'a>(tokens: &'a [Token], index: usize) -> Result<&'a Token, MsgWireError> {
        tokens
            .get(index)
            .or_else(|| tokens.last())
            .ok_or_else(|| error("Unexpected end of input", 0, 0))
    }

    fn at_line_end(tokens: &[Token], index: usize) -> bool {
        match tokens.get(index) {
            Some(tok) => tok.text == NEWLINE || EOF.is_match(&tok.text),
            None => true,
        }
    }

    fn expect<'a>(tokens: &'a [Token], index: &mut usize, test: &Regex, expected: &str) -> Result<&'a Token, MsgWireError> {
        let tok = current_token(tokens, *index)?;
        if *index >= tokens.len() || !test.is_match(&tok.text) {
            let found = if tok.text == NEWLINE { "end of line" } else { tok.text.as_str() };
            return Err(error(
                &format!("Expected {} but found {}", expected, quote(found)),
                tok.line,
                tok.column,
            ));
        }
        *index += 1;
        Ok(tok)
    }

    // Rest of the line, joined back with single spaces
    fn rest_of_line(tokens: &[Token], index: &mut usize) -> String {
        let mut parts = Vec::new();
        while !at_line_end(tokens, *index) {
            parts.push(tokens[*index].text.as_str());
            *index += 1;
        }
        parts.join(" ")
    }

    while index < tokens.len() && !EOF.is_match(&tokens[index].text) {
        if tokens[index].text == NEWLINE {
            index += 1;
            continue;
        }

        let type_tok = expect(tokens, &mut index, &TYPE_TOKEN, "type")?;
        let name_tok = expect(tokens, &mut index, &IDENTIFIER, "identifier")?;

        if index < tokens.len() && EQUALS.is_match(&tokens[index].text) {
            index += 1;
            let value = rest_of_line(tokens, &mut index);
            if value.is_empty() {
                let tok = current_token(tokens, index)?;
                return Err(error(
                    &format!("Missing value for constant {}", quote(&name_tok.text)),
                    tok.line,
                    tok.column,
                ));
            }
            constants.push(MsgConstant {
                name:  name_tok.text.clone(),
                type_: type_tok.text.clone(),
                value,
            });
        } else {
            if fields.iter().any(|f: &MsgField| f.name == name_tok.text) {
                return Err(error(
                    &format!("The field {} is defined twice", quote(&name_tok.text)),
                    name_tok.line,
                    name_tok.column,
                ));
            }
            let default = rest_of_line(tokens, &mut index);
            fields.push(MsgField {
                name:    name_tok.text.clone(),
                line:    name_tok.line,
                column:  name_tok.column,
                type_:   type_tok.text.clone(),
                default: if default.is_empty() { None } else { Some(default) },
            });
        }

        if !at_line_end(tokens, index) {
            let tok = current_token(tokens, index)?;
            return Err(error(
                &format!("Unexpected token {}", quote(&tok.text)),
                tok.line,
                tok.column,
            ));
        }
    }

    Ok(MsgFile {
        package: package.to_string(),
        name:    name.to_string(),
        fields,
        constants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields_and_constants() {
        let text = "\
# A stamped pose
Header header
geometry_msgs/Pose pose
int32 LIMIT=10
string label \"none\"
";
        let msg = compile_msg("nav_msgs", "Stamped", text).unwrap();
        assert_eq!(msg.package, "nav_msgs");
        assert_eq!(msg.name, "Stamped");
        assert_eq!(
            msg.fields,
            vec![
                MsgField { name: "header".into(), line: 2, column: 8, type_: "Header".into(), default: None },
                MsgField { name: "pose".into(), line: 3, column: 20, type_: "geometry_msgs/Pose".into(), default: None },
                MsgField { name: "label".into(), line: 5, column: 8, type_: "string".into(), default: Some("\"none\"".into()) },
            ]
        );
        assert_eq!(
            msg.constants,
            vec![MsgConstant { name: "LIMIT".into(), type_: "int32".into(), value: "10".into() }]
        );
    }

    #[test]
    fn test_parse_array_types() {
        let msg = compile_msg("pkg", "Arrays", "float64[36] covariance\nuint8[] data\nint16[<=4] small\n").unwrap();
        let types: Vec<&str> = msg.fields.iter().map(|f| f.type_.as_str()).collect();
        assert_eq!(types, vec!["float64[36]", "uint8[]", "int16[<=4]"]);
    }

    #[test]
    fn test_parse_empty_file() {
        let msg = compile_msg("std_msgs", "Empty", "# nothing here\n\n").unwrap();
        assert!(msg.fields.is_empty());
        assert!(msg.constants.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        let fail = |text: &str| compile_msg("pkg", "Bad", text).unwrap_err().to_string();

        assert_eq!(
            fail("int32\n"),
            "Parse error at line 1, column 6: Expected identifier but found \"end of line\""
        );
        assert_eq!(
            fail("int32 x\nint32 x\n"),
            "Parse error at line 2, column 7: The field \"x\" is defined twice"
        );
        assert_eq!(
            fail("int32 MAX=\n"),
            "Parse error at line 1, column 11: Missing value for constant \"MAX\""
        );
        assert_eq!(
            fail("= x\n"),
            "Parse error at line 1, column 1: Expected type but found \"=\""
        );
    }
}
