use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,3})\s+(.*)$").unwrap());
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-\s+(.*)$").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\((https?://[^)]+)\)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InList,
    InCodeBlock,
}

/// Render a restricted markup subset (headings, dash lists, code fences,
/// inline code/bold/italic/links) to HTML. Raw HTML in the input never
/// passes through: every piece of user text is escaped before any tag
/// is inserted.
pub fn render_markdown(source: &str) -> String {
    let normalized = source.replace("\r\n", "\n");
    let mut html = String::new();
    let mut state = ScanState::Normal;
    let mut code_buffer: Vec<&str> = Vec::new();

    for line in normalized.split('\n') {
        if line.trim().starts_with("```") {
            if state == ScanState::InCodeBlock {
                flush_code(&mut html, &mut code_buffer);
                state = ScanState::Normal;
            } else {
                if state == ScanState::InList {
                    html.push_str("</ul>");
                }
                code_buffer.clear();
                state = ScanState::InCodeBlock;
            }
            continue;
        }

        if state == ScanState::InCodeBlock {
            code_buffer.push(line);
            continue;
        }

        if let Some(caps) = HEADING.captures(line) {
            if state == ScanState::InList {
                html.push_str("</ul>");
            }
            state = ScanState::Normal;
            let level = caps[1].len();
            html.push_str(&format!("<h{level}>{}</h{level}>", render_inline(&caps[2])));
            continue;
        }

        if let Some(caps) = LIST_ITEM.captures(line) {
            if state != ScanState::InList {
                html.push_str("<ul>");
                state = ScanState::InList;
            }
            html.push_str(&format!("<li>{}</li>", render_inline(&caps[1])));
            continue;
        }

        if state == ScanState::InList {
            html.push_str("</ul>");
            state = ScanState::Normal;
        }

        // Blank line: paragraph separator only.
        if line.trim().is_empty() {
            continue;
        }

        html.push_str(&format!("<p>{}</p>", render_inline(line)));
    }

    match state {
        ScanState::InList => html.push_str("</ul>"),
        // Unterminated fences are closed implicitly.
        ScanState::InCodeBlock => flush_code(&mut html, &mut code_buffer),
        ScanState::Normal => {}
    }

    html
}

fn flush_code(html: &mut String, code_buffer: &mut Vec<&str>) {
    let code = escape_html(&code_buffer.join("\n"));
    html.push_str(&format!("<pre><code>{code}</code></pre>"));
    code_buffer.clear();
}

/// Ordered substitution passes over already-escaped text. Escaping must
/// come first; the pass order is code, bold, italic, links.
fn render_inline(text: &str) -> String {
    let escaped = escape_html(text);
    let with_code = INLINE_CODE.replace_all(&escaped, "<code>$1</code>");
    let with_bold = BOLD.replace_all(&with_code, "<strong>$1</strong>");
    let with_italic = ITALIC.replace_all(&with_bold, "<em>$1</em>");
    LINK.replace_all(
        &with_italic,
        r#"<a href="$2" target="_blank" rel="noopener noreferrer">$1</a>"#,
    )
    .into_owned()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}
