use crate::error::MsgWireError;

/// JSON-style quoting for names in diagnostics.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn error(msg: &str, line: usize, column: usize) -> MsgWireError {
    MsgWireError::ParseError {
        msg: msg.to_string(),
        line,
        column,
    }
}

/// Converts a string to PascalCase.
/// - If the string contains underscores, it splits on underscores and converts each word
///   so that its first letter is uppercase and the rest lowercase.
/// - Otherwise, it ensures only the first letter is uppercase.
pub fn to_pascal_case(s: &str) -> String {
    let capitalize = |word: &str, lower_rest: bool| {
        let mut chars = word.chars();
        match chars.next() {
            None => String::new(),
            Some(first) if lower_rest => {
                first.to_uppercase().to_string() + &chars.as_str().to_lowercase()
            }
            Some(first) => first.to_uppercase().to_string() + chars.as_str(),
        }
    };

    if s.contains('_') {
        s.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| capitalize(word, true))
            .collect::<String>()
    } else {
        capitalize(s, false)
    }
}

/// Converts a string to snake_case.
/// This implementation avoids inserting underscores between consecutive uppercase letters,
/// so that acronyms remain intact (e.g. "sessionID" becomes "session_id").
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for i in 0..chars.len() {
        let c = chars[i];
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                // Insert an underscore if the previous character is not uppercase,
                // or if the next character exists and is lowercase.
                if (!prev.is_uppercase() && prev != '_')
                    || (i + 1 < chars.len() && chars[i + 1].is_lowercase() && prev != '_')
                {
                    snake.push('_');
                }
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
pub fn escape_rust_keyword(s: &str) -> String {
    let keywords = [
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else",
        "enum", "extern", "false", "fn", "for", "if", "impl",
        "in", "let", "loop", "match", "mod", "move", "mut",
        "pub", "ref", "return", "self", "Self", "static",
        "struct", "super", "trait", "true", "type", "unsafe",
        "use", "where", "while",
    ];
    if keywords.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Prefixes every non-empty line with `depth` levels of four-space indentation.
pub fn indent(lines: Vec<String>, depth: usize) -> Vec<String> {
    let pad = "    ".repeat(depth);
    lines
        .into_iter()
        .map(|line| if line.is_empty() { line } else { format!("{}{}", pad, line) })
        .collect()
}

/// Escapes C reserved keywords by suffixing with an underscore.
pub fn escape_c_keyword(s: &str) -> String {
    let keywords = [
        "auto", "bool", "break", "case", "char", "const", "continue", "default",
        "do", "double", "else", "enum", "extern", "float", "for", "goto", "if",
        "inline", "int", "long", "register", "restrict", "return", "short",
        "signed", "sizeof", "static", "struct", "switch", "typedef", "union",
        "unsigned", "void", "volatile", "while",
    ];
    if keywords.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Splits a qualified name into its package (if any) and short name:
/// `pkg/msg/Name` → `(Some("pkg"), "Name")`, `Name` → `(None, "Name")`.
pub fn split_qualified(qualified: &str) -> (Option<&str>, &str) {
    match qualified.split_once('/') {
        Some((package, rest)) => (Some(package), rest.rsplit('/').next().unwrap_or(rest)),
        None => (None, qualified),
    }
}

/// C identifier for a qualified type name: `pkg/msg/Name` → `pkg__msg__Name`.
pub fn c_type_name(qualified: &str) -> String {
    qualified.replace('/', "__")
}
