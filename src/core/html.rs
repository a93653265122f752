// src/core/html.rs
// Tolerant, case-insensitive slicing of tag blocks. No DOM; just enough to
// walk a table's rows and cells.

use super::sanitize::{normalize_entities, normalize_ws};

/// ASCII-only lowercase, so byte offsets stay valid against the original.
pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii() {
                c.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect()
}

/// Byte range of the next `<o ...> ... c` block at or after `from`.
/// `lc` is `to_lower(s)`, computed once by the caller; offsets are shared.
pub fn next_tag_block_ci(s: &str, lc: &str, o: &str, c: &str, from: usize) -> Option<(usize, usize)> {
    let ol = to_lower(o);
    let cl = to_lower(c);
    let start = lc.get(from..)?.find(&ol)? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&cl)?;
    let end = open_end + end_rel + c.len();
    Some((start, end))
}

pub fn inner_after_open_tag(block: &str) -> String {
    if let Some(oe) = block.find('>') {
        if let Some(cs) = block.rfind('<') {
            if cs > oe {
                return block[oe + 1..cs].to_string();
            }
        }
    }
    s!()
}

pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();

    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&out)
}

/// First `<table>` whose opening tag carries `class` among its classes
/// (quoted or not). Returns the whole block including the tags.
pub fn find_table_by_class<'a>(doc: &'a str, class: &str) -> Option<&'a str> {
    let lc = to_lower(doc);
    let want = to_lower(class);
    let mut pos = 0usize;
    while let Some((s, e)) = next_tag_block_ci(doc, &lc, "<table", "</table>", pos) {
        let block_lc = &lc[s..e];
        let opener = &block_lc[..block_lc.find('>').unwrap_or(block_lc.len())];
        if has_class(opener, &want) {
            return Some(&doc[s..e]);
        }
        pos = e;
    }
    None
}

fn has_class(opener_lc: &str, want: &str) -> bool {
    let Some(i) = opener_lc.find("class=") else { return false };
    let val = &opener_lc[i + "class=".len()..];
    let quote = val.chars().next().filter(|c| *c == '"' || *c == '\'');
    let val = if quote.is_some() { &val[1..] } else { val };
    let end = val
        .find(|c: char| match quote {
            Some(q) => c == q,
            None => c.is_ascii_whitespace() || c == '>' || c == '/',
        })
        .unwrap_or(val.len());
    val[..end].split_whitespace().any(|c| c == want)
}

/// Text of every `<td>` in every `<tr>` of a table block.
/// Rows without `<td>` (header rows made of `<th>`) are skipped.
pub fn table_rows(table: &str) -> Vec<Vec<String>> {
    let lc = to_lower(table);
    let mut rows = Vec::new();
    let mut pos = 0usize;
    while let Some((tr_s, tr_e)) = next_tag_block_ci(table, &lc, "<tr", "</tr>", pos) {
        let (tr, tr_lc) = (&table[tr_s..tr_e], &lc[tr_s..tr_e]);
        pos = tr_e;

        let mut cells = Vec::new();
        let mut td_pos = 0usize;
        while let Some((td_s, td_e)) = next_tag_block_ci(tr, tr_lc, "<td", "</td>", td_pos) {
            let inner = inner_after_open_tag(&tr[td_s..td_e]);
            cells.push(strip_tags(normalize_entities(&inner)));
            td_pos = td_e;
        }
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    rows
}
