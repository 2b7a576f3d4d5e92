//! Cleanup of the model's raw answer before it is stored.
//!
//! The prompt asks for bare HTML tags, but models still wrap the answer in
//! code fences or sprinkle Markdown emphasis. These passes are applied in
//! order; each is a pure `&str → String` function.
//!
//! 1. Strip ```` ```html ```` and ```` ``` ```` fences, wherever they occur
//! 2. Remove every `*` (Markdown bold/italic markers)
//! 3. Normalise line endings (CRLF → LF)
//! 4. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
//! 5. Trim surrounding whitespace

/// Apply all cleanup passes to the raw model output.
pub fn clean_model_response(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = remove_asterisks(&s);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    s.trim().to_string()
}

// ── Pass 1: Code fences ──────────────────────────────────────────────────

fn strip_code_fences(input: &str) -> String {
    input.replace("```html", "").replace("```", "")
}

// ── Pass 2: Markdown emphasis ────────────────────────────────────────────

fn remove_asterisks(input: &str) -> String {
    input.replace('*', "")
}

// ── Pass 3: Line endings ─────────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Pass 4: Invisible characters ─────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_html_fence() {
        let input = "```html\n<h3>1. X</h3><p>y</p>\n```";
        assert_eq!(clean_model_response(input), "<h3>1. X</h3><p>y</p>");
    }

    #[test]
    fn strips_bare_fence_mid_text() {
        assert_eq!(strip_code_fences("a ``` b"), "a  b");
    }

    #[test]
    fn removes_markdown_bold() {
        assert_eq!(
            clean_model_response("<li>**Eat:** rice</li>"),
            "<li>Eat: rice</li>"
        );
    }

    #[test]
    fn normalises_crlf() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn removes_invisible() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar";
        assert_eq!(remove_invisible_chars(input), "helloworldfoobar");
    }

    #[test]
    fn plain_html_passthrough() {
        let html = "<h3>2. DIAGNOSIS</h3><p>Viral fever.</p>";
        assert_eq!(clean_model_response(html), html);
    }
}
