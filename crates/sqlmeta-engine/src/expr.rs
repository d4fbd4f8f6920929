//! Light normalization of SQL expressions (defaults and CHECK bodies)
//!
//! Only removes differences that catalogs introduce on their own: redundant
//! outer parentheses, PostgreSQL literal casts, keyword case, whitespace and
//! the various spellings of "now". Quoted literals are kept verbatim.

const NOW_SYNONYMS: &[&str] = &[
    "NOW()",
    "CURRENT_TIMESTAMP()",
    "GETDATE()",
    "SYSDATETIME()",
    "SYSDATE",
    "SYSTIMESTAMP",
    "LOCALTIMESTAMP",
    "TRANSACTION_TIMESTAMP()",
];

/// Canonical form of an expression used for equality checks
pub fn normalize_expression(expression: &str) -> String {
    let mut current = collapse_outside_quotes(expression.trim());

    loop {
        let stripped = strip_outer_parens(&current);
        let stripped = strip_literal_cast(stripped);
        if stripped.len() == current.len() {
            break;
        }
        current = stripped.trim().to_string();
    }

    if NOW_SYNONYMS.contains(&current.as_str()) {
        return "CURRENT_TIMESTAMP".to_string();
    }
    current
}

/// Uppercase and collapse whitespace everywhere except inside quotes
fn collapse_outside_quotes(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;

    for c in expression.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => pending_space = true,
            None => {
                if pending_space {
                    // spaces next to punctuation carry no meaning
                    let prev = out.chars().last();
                    if !matches!(prev, None | Some('(' | ',')) && !matches!(c, ')' | ',') {
                        out.push(' ');
                    }
                    pending_space = false;
                }
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                out.extend(c.to_uppercase());
            }
        }
    }

    out
}

/// Remove one pair of parentheses wrapping the whole expression
fn strip_outer_parens(expression: &str) -> &str {
    let Some(inner) = expression
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    else {
        return expression;
    };

    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        // `(a) + (b)`: the outer pair does not wrap everything
                        return expression;
                    }
                }
                _ => {}
            },
        }
    }

    if depth == 0 {
        inner
    } else {
        expression
    }
}

/// Remove a trailing `::type` cast that follows a quoted literal
fn strip_literal_cast(expression: &str) -> &str {
    let Some(pos) = expression.rfind("::") else {
        return expression;
    };
    let (head, cast) = (&expression[..pos], &expression[pos + 2..]);
    let is_type = !cast.is_empty()
        && cast.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '(' | ')' | ',' | '[' | ']')
        });

    if is_type && head.ends_with('\'') {
        head
    } else {
        expression
    }
}
