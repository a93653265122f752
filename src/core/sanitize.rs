// src/core/sanitize.rs

pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&amp;", "&")
        .replace("&#43;", "+")
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Parse an XP figure as the site prints it: `+1,234,567`, `-12 000`, `0`.
/// Anything else (`n/a`, empty) is `None`.
pub fn parse_xp_number(s: &str) -> Option<i64> {
    let t = s.trim();
    let (neg, digits) = if let Some(rest) = t.strip_prefix('+') {
        (false, rest)
    } else if let Some(rest) = t.strip_prefix('-').or_else(|| t.strip_prefix('\u{2212}')) {
        (true, rest)
    } else {
        (false, t)
    };
    let mut value: i64 = 0;
    let mut seen = false;
    for ch in digits.chars() {
        match ch {
            '0'..='9' => {
                value = value.checked_mul(10)?.checked_add(ch as i64 - '0' as i64)?;
                seen = true;
            }
            ',' | ' ' | '\u{a0}' | '.' | '\'' => {}
            _ => return None,
        }
    }
    if !seen { return None; }
    Some(if neg { -value } else { value })
}
