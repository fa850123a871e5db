//! Attribute tokenizer for a single HTML open tag.
//!
//! Grammar per token: `name[\s*=\s*("..."|'...'|bare)]`, where a name is
//! `[A-Za-z_:][-A-Za-z0-9_:.]*` and a bare value is a run of characters other
//! than whitespace and ``"'=<>` ``. Characters that cannot start a name are
//! skipped. A value that fails to lex (an unterminated quote, say) leaves the
//! attribute valueless and scanning resumes right after the name.
//!
//! The scanner never backtracks more than one value attempt, so it runs in
//! time linear in the input.

use indexmap::IndexMap;

/// One lexed attribute. Names are lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: String,
    pub value: Option<&'a str>,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

fn is_bare_value_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '"' | '\'' | '=' | '<' | '>' | '`')
}

/// Iterator over the attributes of a tag's attribute string.
pub struct Attributes<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Attributes<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Byte length of the leading run of `rest` matching `pred`.
    fn run_len(s: &str, pred: impl Fn(char) -> bool) -> usize {
        s.char_indices()
            .find(|&(_, c)| !pred(c))
            .map(|(i, _)| i)
            .unwrap_or(s.len())
    }

    /// Try to lex `\s*=\s*value` starting at `from`. Returns the value and the
    /// position just past it.
    fn lex_value(&self, from: usize) -> Option<(&'a str, usize)> {
        let s = &self.src[from..];
        let mut i = Self::run_len(s, char::is_whitespace);
        if !s[i..].starts_with('=') {
            return None;
        }
        i += 1;
        i += Self::run_len(&s[i..], char::is_whitespace);

        let tail = &s[i..];
        let quote = tail.chars().next()?;
        if quote == '"' || quote == '\'' {
            let body = &tail[1..];
            let close = body.find(quote)?;
            return Some((&body[..close], from + i + 1 + close + 1));
        }

        let len = Self::run_len(tail, is_bare_value_char);
        if len == 0 {
            return None;
        }
        Some((&tail[..len], from + i + len))
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let skip = self.rest().find(is_name_start)?;
        let start = self.pos + skip;
        let name_len = 1 + Self::run_len(&self.src[start + 1..], is_name_char);
        let name_end = start + name_len;
        let name = self.src[start..name_end].to_ascii_lowercase();

        match self.lex_value(name_end) {
            Some((value, end)) => {
                self.pos = end;
                Some(Attribute {
                    name,
                    value: Some(value),
                })
            }
            None => {
                self.pos = name_end;
                Some(Attribute { name, value: None })
            }
        }
    }
}

/// Collect attributes into a map; a repeated name keeps its last value.
pub fn collect_attributes(src: &str) -> IndexMap<String, Option<&str>> {
    let mut map = IndexMap::new();
    for attr in Attributes::new(src) {
        map.insert(attr.name, attr.value);
    }
    map
}
