//! `---` delimited `key: value` header at the top of a markdown file.

use std::collections::HashMap;

/// Header fields plus the text that follows the closing `---`. Without a
/// header the map is empty and the body is the whole input.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    pub fields: HashMap<String, String>,
    pub body: &'a str,
}

impl<'a> Frontmatter<'a> {
    pub fn split(content: &'a str) -> Self {
        let Some(rest) = content.strip_prefix("---") else {
            return Self::whole(content);
        };
        let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
            return Self::whole(content);
        };
        let Some(close) = find_closing(rest) else {
            return Self::whole(content);
        };

        let mut fields = HashMap::new();
        for line in rest[..close].lines() {
            let Some((key, value)) = line.split_once(':') else { continue };
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            fields.insert(key.trim().to_string(), value.to_string());
        }

        let body = &rest[close..];
        let body = body.strip_prefix("---").unwrap_or(body);
        Self { fields, body }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    fn whole(content: &'a str) -> Self {
        Self {
            fields: HashMap::new(),
            body: content,
        }
    }
}

/// Byte offset of the line that closes the header.
fn find_closing(rest: &str) -> Option<usize> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_header_and_body() {
        let fm = Frontmatter::split("---\nproject: Site\npriority: \"high\"\n---\n- [ ] #1 A | 1h\n");
        assert_eq!(fm.get("project"), Some("Site"));
        assert_eq!(fm.get("priority"), Some("high"));
        assert_eq!(fm.body.trim(), "- [ ] #1 A | 1h");
    }

    #[test]
    fn values_keep_inner_colons() {
        let fm = Frontmatter::split("---\nnote: at 09:30\n---\n");
        assert_eq!(fm.get("note"), Some("at 09:30"));
    }

    #[test]
    fn missing_or_unclosed_header_is_all_body() {
        let plain = "- [ ] #1 A | 1h";
        assert_eq!(Frontmatter::split(plain).body, plain);
        let open = "---\nproject: x\n- [ ] #1 A | 1h";
        let fm = Frontmatter::split(open);
        assert!(fm.fields.is_empty());
        assert_eq!(fm.body, open);
    }

    #[test]
    fn empty_values_read_as_absent() {
        let fm = Frontmatter::split("---\ndeadline:\n---\n");
        assert_eq!(fm.get("deadline"), None);
    }
}
