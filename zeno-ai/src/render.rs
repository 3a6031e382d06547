//! Output rendering: Markdown to the HTML subset Telegram accepts, and splitting text to the message size limit.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

/// Telegram's maximum message length.
pub const TELEGRAM_TEXT_LIMIT: usize = 4096;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Appends a block separator emitted by the renderer, keeping at most one blank line at the end. Text from the
/// source (code blocks included) is never touched.
fn push_separator(out: &mut String, separator: &str) {
    out.push_str(separator);
    while out.ends_with("\n\n\n") {
        out.pop();
    }
}

enum Frame {
    Close(&'static str),
    List,
}

/// Renders Markdown into Telegram HTML (`b`, `i`, `s`, `code`, `pre`, `a`, `blockquote`).
///
/// Headings become bold lines, list items get bullets or numbers, anything without a Telegram counterpart
/// keeps only its text.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::with_capacity(markdown.len() + markdown.len() / 4);
    let mut frames: Vec<Frame> = Vec::new();
    let mut lists: Vec<Option<u64>> = Vec::new();

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(tag) => {
                let (open, frame) = match tag {
                    Tag::Paragraph => (String::new(), Frame::Close("\n\n")),
                    Tag::Heading { .. } => ("<b>".to_string(), Frame::Close("</b>\n\n")),
                    Tag::BlockQuote(_) => ("<blockquote>".to_string(), Frame::Close("</blockquote>\n\n")),
                    Tag::CodeBlock(CodeBlockKind::Fenced(lang)) if !lang.trim().is_empty() => (
                        format!("<pre><code class=\"language-{}\">", escape_html(lang.trim())),
                        Frame::Close("</code></pre>\n\n"),
                    ),
                    Tag::CodeBlock(_) => ("<pre><code>".to_string(), Frame::Close("</code></pre>\n\n")),
                    Tag::List(start) => {
                        lists.push(start);
                        (String::new(), Frame::List)
                    }
                    Tag::Item => {
                        let indent = "  ".repeat(lists.len().saturating_sub(1));
                        let marker = match lists.last_mut() {
                            Some(Some(n)) => {
                                let marker = format!("{}. ", n);
                                *n += 1;
                                marker
                            }
                            _ => "• ".to_string(),
                        };
                        (format!("{}{}", indent, marker), Frame::Close("\n"))
                    }
                    Tag::Emphasis => ("<i>".to_string(), Frame::Close("</i>")),
                    Tag::Strong => ("<b>".to_string(), Frame::Close("</b>")),
                    Tag::Strikethrough => ("<s>".to_string(), Frame::Close("</s>")),
                    Tag::Link { dest_url, .. } => (format!("<a href=\"{}\">", escape_html(&dest_url)), Frame::Close("</a>")),
                    _ => (String::new(), Frame::Close("")),
                };
                out.push_str(&open);
                frames.push(frame);
            }
            Event::End(_) => match frames.pop() {
                Some(Frame::Close(close)) => push_separator(&mut out, close),
                Some(Frame::List) => {
                    lists.pop();
                    if lists.is_empty() {
                        push_separator(&mut out, "\n");
                    }
                }
                None => {}
            },
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => out.push_str(&escape_html(&text)),
            Event::Code(code) => {
                out.push_str("<code>");
                out.push_str(&escape_html(&code));
                out.push_str("</code>");
            }
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::Rule => push_separator(&mut out, "\n\n"),
            Event::TaskListMarker(done) => out.push_str(if done { "☑ " } else { "☐ " }),
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Splits `text` into pieces of at most `max_chars` characters, preferring line boundaries.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        if current_len > 0 && current_len + 1 + line_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                if current_len > 0 {
                    chunks.push(std::mem::take(&mut current));
                }
                current = piece.iter().collect();
                current_len = piece.len();
            }
            continue;
        }
        if current_len > 0 {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if current_len > 0 {
        chunks.push(current);
    }

    chunks.retain(|c| !c.trim().is_empty());
    chunks
}
