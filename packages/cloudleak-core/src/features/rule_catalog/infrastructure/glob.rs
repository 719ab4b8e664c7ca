//! Glob patterns for path exemptions
//!
//! `**` crosses path segments, `*` and `?` stay within one. Relative patterns
//! match at any segment boundary so `cmd/**` covers `/repo/cmd/main.go`.

use regex::Regex;

pub fn compile_glob(pattern: &str) -> Result<Regex, regex::Error> {
    let normalized = pattern.replace('\\', "/");
    let chars: Vec<char> = normalized.chars().collect();

    let mut out = String::with_capacity(normalized.len() * 2 + 8);
    out.push('^');
    if !normalized.starts_with('/') && !normalized.starts_with("**") {
        out.push_str("(?:.*/)?");
    }

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                if chars.get(i) == Some(&'/') {
                    // `**/` also matches zero segments
                    out.push_str("(?:.*/)?");
                    i += 1;
                } else {
                    out.push_str(".*");
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            c => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
        }
        i += 1;
    }
    out.push('$');
    Regex::new(&out)
}
