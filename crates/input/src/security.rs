//! Final clean up applied to detected URIs.

/// Cleans a detected URI before it is handed to the application.
pub trait Sanitizer: Send + Sync {
    fn clean_uri(&self, raw: &str) -> String;
}

impl<F> Sanitizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn clean_uri(&self, raw: &str) -> String {
        (self)(raw)
    }
}

/// Escapes the HTML special characters `& < > " '`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEntities;

impl Sanitizer for HtmlEntities {
    fn clean_uri(&self, raw: &str) -> String {
        let mut cleaned = String::with_capacity(raw.len());
        for c in raw.chars() {
            match c {
                '&' => cleaned.push_str("&amp;"),
                '<' => cleaned.push_str("&lt;"),
                '>' => cleaned.push_str("&gt;"),
                '"' => cleaned.push_str("&quot;"),
                '\'' => cleaned.push_str("&#039;"),
                c => cleaned.push(c),
            }
        }
        cleaned
    }
}

/// Leaves the URI untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Sanitizer for Passthrough {
    fn clean_uri(&self, raw: &str) -> String {
        raw.to_owned()
    }
}
