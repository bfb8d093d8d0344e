/// Decoded GTF attribute column.
///
/// Pairs are kept in column order. Segments that could not be split into
/// key and value are kept aside in `malformed` so the caller decides whether
/// they are fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pairs: Vec<(String, String)>,
    malformed: Vec<String>,
}

impl Attributes {
    /// Value for `key`. A repeated key resolves to its last occurrence.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn malformed(&self) -> &[String] {
        &self.malformed
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Decode `key1 "value1"; key2 value2; ...`
///
/// - segments are separated by `;`; empty or whitespace-only ones are dropped
/// - a segment splits at its first whitespace into key and value
/// - the value is trimmed and surrounding `"` are stripped
/// - a segment without whitespace is recorded as malformed
pub fn parse_attributes(s: &str) -> Attributes {
    let mut out = Attributes::default();

    for part in s.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        match part.split_once(char::is_whitespace) {
            Some((key, rest)) => {
                out.pairs.push((key.to_string(), unquote(rest)));
            }
            None => out.malformed.push(part.to_string()),
        }
    }

    out
}

fn unquote(v: &str) -> String {
    v.trim().trim_matches('"').to_string()
}
