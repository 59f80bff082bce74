//! Sanitization of rendered section text for embedding in JSON-ish consumers.

/// Sanitizes section text: runs of newlines collapse to one, which is then
/// escaped as `\n`, and unescaped double quotes become `\"`.
///
/// The function is idempotent; sanitizing already-sanitized text changes
/// nothing.
#[must_use]
pub fn sanitize_section_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut prev_backslash = false;

    while let Some(ch) = chars.next() {
        match ch {
            '\n' => {
                while chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\\');
                out.push('n');
                prev_backslash = false;
            }
            '"' => {
                if !prev_backslash {
                    out.push('\\');
                }
                out.push('"');
                prev_backslash = false;
            }
            '\\' => {
                out.push('\\');
                prev_backslash = true;
            }
            other => {
                out.push(other);
                prev_backslash = false;
            }
        }
    }

    out
}
