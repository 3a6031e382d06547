//! `[IMAGE: prompt]` directives in plain-text answers. The reconciler strips them from the visible text and hands
//! the prompts to the image worker.

use std::sync::OnceLock;

use regex::Regex;

fn directive_opener() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\[IMAGE:").ok()).as_ref()
}

/// Byte offset of the `]` closing a directive body. Brackets inside the prompt are balanced; if they never
/// balance, the last `]` on the opening line closes it.
fn closing_bracket(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => return Some(i),
            ']' => depth -= 1,
            _ => {}
        }
    }
    body.split('\n').next().and_then(|line| line.rfind(']'))
}

/// Returns the text without directives and the non-empty prompts in order of appearance.
pub fn extract_image_directives(text: &str) -> (String, Vec<String>) {
    let Some(opener) = directive_opener() else {
        return (text.to_string(), Vec::new());
    };

    let mut kept = String::with_capacity(text.len());
    let mut prompts = Vec::new();
    let mut found = false;
    let mut pos = 0;
    while let Some(m) = opener.find_at(text, pos) {
        let body = &text[m.end()..];
        match closing_bracket(body) {
            Some(end) => {
                kept.push_str(&text[pos..m.start()]);
                let prompt = body[..end].trim();
                if !prompt.is_empty() {
                    prompts.push(prompt.to_string());
                }
                pos = m.end() + end + 1;
                found = true;
            }
            None => {
                kept.push_str(&text[pos..m.end()]);
                pos = m.end();
            }
        }
    }
    if !found {
        return (text.to_string(), prompts);
    }
    kept.push_str(&text[pos..]);

    let cleaned = kept
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();
    (cleaned, prompts)
}
