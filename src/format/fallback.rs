//! Line-oriented re-indenter used when the canonical formatter gives up.
//!
//! It tracks one indent level and whether the current line is inside a
//! triple-quoted string. The level is shallow on purpose: `class` resets it
//! to 0 and `def` forces it to 1, so nested classes come out flattened.
//! Output is advisory; the only guarantees are that it never fails and
//! that every input line maps to exactly one output line.

const FLOW_KEYWORDS: [&str; 5] = ["return", "break", "continue", "raise", "pass"];
const CLAUSE_KEYWORDS: [&str; 4] = ["elif", "else", "except", "finally"];

pub fn reindent(text: &str, indent_width: usize) -> String {
    if text.is_empty() {
        return String::new();
    }

    let unit = indent_width.max(1);
    let mut level = 0usize;
    let mut open_quote: Option<&'static str> = None;
    let mut out = Vec::new();

    for line in text.lines() {
        if open_quote.is_some() {
            out.push(line.to_string());
            open_quote = track_strings(line, open_quote);
            continue;
        }

        let stripped = line.trim();
        if stripped.is_empty() {
            out.push(String::new());
            continue;
        }
        if stripped.starts_with('#') {
            out.push(format!("{}{stripped}", " ".repeat(level * unit)));
            continue;
        }

        if starts_with_keyword(stripped, "class") {
            level = 0;
        } else if starts_with_keyword(stripped, "def")
            || stripped.starts_with("async def ")
        {
            level = 1;
        } else if FLOW_KEYWORDS
            .iter()
            .chain(CLAUSE_KEYWORDS.iter())
            .any(|keyword| starts_with_keyword(stripped, keyword))
        {
            level = level.saturating_sub(1);
        }

        out.push(format!("{}{stripped}", " ".repeat(level * unit)));

        open_quote = track_strings(stripped, None);
        if open_quote.is_none() && stripped.ends_with(':') {
            level += 1;
        }
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// `line` begins with `keyword` as a whole word.
fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.strip_prefix(keyword).is_some_and(|rest| {
        rest.chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
    })
}

/// Triple-quote state after `line`, given the state before it.
fn track_strings(line: &str, mut open: Option<&'static str>) -> Option<&'static str> {
    let mut rest = line;
    loop {
        match open {
            Some(quote) => match rest.find(quote) {
                Some(at) => {
                    rest = &rest[at + quote.len()..];
                    open = None;
                }
                None => return open,
            },
            None => {
                let double = rest.find("\"\"\"");
                let single = rest.find("'''");
                let (at, quote) = match (double, single) {
                    (Some(d), Some(s)) if s < d => (s, "'''"),
                    (Some(d), _) => (d, "\"\"\""),
                    (None, Some(s)) => (s, "'''"),
                    (None, None) => return None,
                };
                rest = &rest[at + quote.len()..];
                open = Some(quote);
            }
        }
    }
}
