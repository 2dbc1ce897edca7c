//! Line-oriented configuration file parsing
//!
//! The format is flat `key = value` pairs, optionally grouped under
//! `[section]` headers. `#` starts a comment (full-line or trailing),
//! scalars may be double-quoted, and arrays are written
//! `["a", "b", "c"]`. Keys seen before any section header land in the
//! global section.
//!
//! ```text
//! # example
//! servername = "myproxy"
//!
//! [proxy]
//! serveraddr = 10.21.20.114      # address
//! serverport = 8080              # port
//! alloweduser = ["alice", "bob"]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A single configuration value, stored as its source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value(String);

impl Value {
    /// The raw text of the value, quotes stripped
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse as an integer
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// Parse as a float
    pub fn as_f64(&self) -> Option<f64> {
        self.0.parse().ok()
    }

    /// Everything is true except `0`, `false` and `False`
    pub fn as_bool(&self) -> bool {
        !matches!(self.0.as_str(), "0" | "false" | "False")
    }
}

/// One `[section]` worth of key/value entries.
///
/// Every key maps to an array of values; scalar entries are
/// one-element arrays.
#[derive(Debug, Default, Clone)]
pub struct Section {
    entries: HashMap<String, Vec<Value>>,
}

impl Section {
    /// First value for a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).and_then(|values| values.first())
    }

    /// All values for a key
    pub fn get_all(&self, key: &str) -> Option<&[Value]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Whether the section holds a key
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys in the section
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the section is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parsed configuration file
///
/// # Example
/// ```
/// use threadkit::Config;
///
/// let conf: Config = "servername = \"myproxy\"\n[proxy]\nserverport = 8080\n".parse().unwrap();
/// assert_eq!(conf.get("servername").unwrap().as_str(), "myproxy");
/// let proxy = conf.section("proxy").unwrap();
/// assert_eq!(proxy.get("serverport").unwrap().as_i64(), Some(8080));
/// ```
#[derive(Debug, Default, Clone)]
pub struct Config {
    global: Section,
    sections: HashMap<String, Section>,
}

impl Config {
    /// Parse a configuration file from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        fs::read_to_string(path)?.parse()
    }

    /// Keys outside any `[section]` header
    pub fn global(&self) -> &Section {
        &self.global
    }

    /// Look up a named section
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// First global value for a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.global.get(key)
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let mut config = Config::default();
        let mut current: Option<String> = None;

        for (idx, raw) in input.lines().enumerate() {
            let lineno = idx + 1;
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .ok_or_else(|| Error::parse(lineno, "unterminated section header"))?
                    .trim();
                if name.is_empty() {
                    return Err(Error::parse(lineno, "empty section name"));
                }
                config.sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| Error::parse(lineno, "expected `key = value`"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::parse(lineno, "empty key"));
            }

            let values = parse_values(value.trim(), lineno)?;
            let section = match &current {
                Some(name) => config.sections.entry(name.clone()).or_default(),
                None => &mut config.global,
            };
            section.entries.insert(key.to_string(), values);
        }

        Ok(config)
    }
}

/// Cut the line at the first `#` that sits outside double quotes
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (i, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_values(value: &str, lineno: usize) -> Result<Vec<Value>> {
    if let Some(body) = value.strip_prefix('[') {
        let body = body
            .strip_suffix(']')
            .ok_or_else(|| Error::parse(lineno, "unterminated array"))?;
        return parse_array(body, lineno);
    }
    Ok(vec![parse_scalar(value, lineno)?])
}

fn parse_scalar(text: &str, lineno: usize) -> Result<Value> {
    let text = text.trim();
    if let Some(body) = text.strip_prefix('"') {
        let body = body
            .strip_suffix('"')
            .ok_or_else(|| Error::parse(lineno, "unterminated quoted value"))?;
        if body.contains('"') {
            return Err(Error::parse(lineno, "stray quote inside value"));
        }
        return Ok(Value(body.to_string()));
    }
    if text.is_empty() {
        return Err(Error::parse(lineno, "empty value"));
    }
    if text.contains('"') {
        return Err(Error::parse(lineno, "stray quote inside value"));
    }
    Ok(Value(text.to_string()))
}

/// Split an array body on commas that sit outside quotes
fn parse_array(body: &str, lineno: usize) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    let mut item = String::new();
    let mut in_quotes = false;

    for ch in body.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                item.push(ch);
            }
            ',' if !in_quotes => {
                values.push(parse_scalar(&item, lineno)?);
                item.clear();
            }
            _ => item.push(ch),
        }
    }
    if in_quotes {
        return Err(Error::parse(lineno, "unterminated quoted value"));
    }
    if !item.trim().is_empty() {
        values.push(parse_scalar(&item, lineno)?);
    } else if !values.is_empty() {
        return Err(Error::parse(lineno, "trailing comma in array"));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# this is an example configuration file
gservername = "myproxy"

[proxy]
serveraddr = 10.21.20.114	# address
serverport = 8080		# port
alloweduser = ["testuser1", "testuser2", "testuser5"]	# allowed users
allowedclient = ["10.21.20.115", "10.21.20.116"]
"#;

    #[test]
    fn parses_globals_and_sections() {
        let conf: Config = SAMPLE.parse().unwrap();
        assert_eq!(conf.get("gservername").unwrap().as_str(), "myproxy");

        let proxy = conf.section("proxy").unwrap();
        assert_eq!(proxy.get("serveraddr").unwrap().as_str(), "10.21.20.114");
        assert_eq!(proxy.get("serverport").unwrap().as_i64(), Some(8080));

        let users: Vec<_> =
            proxy.get_all("alloweduser").unwrap().iter().map(Value::as_str).collect();
        assert_eq!(users, ["testuser1", "testuser2", "testuser5"]);
        assert_eq!(proxy.get_all("allowedclient").unwrap().len(), 2);
    }

    #[test]
    fn scalar_is_a_one_element_array() {
        let conf: Config = "port = 80\n".parse().unwrap();
        assert_eq!(conf.global().get_all("port").unwrap().len(), 1);
        assert_eq!(conf.get("port").unwrap().as_i64(), Some(80));
    }

    #[test]
    fn bool_coercion_rules() {
        let conf: Config = "a = 1\nb = 0\nc = false\nd = False\ne = yes\n".parse().unwrap();
        assert!(conf.get("a").unwrap().as_bool());
        assert!(!conf.get("b").unwrap().as_bool());
        assert!(!conf.get("c").unwrap().as_bool());
        assert!(!conf.get("d").unwrap().as_bool());
        assert!(conf.get("e").unwrap().as_bool());
    }

    #[test]
    fn float_values() {
        let conf: Config = "ratio = 0.75\n".parse().unwrap();
        assert_eq!(conf.get("ratio").unwrap().as_f64(), Some(0.75));
        assert_eq!(conf.get("ratio").unwrap().as_i64(), None);
    }

    #[test]
    fn comments_do_not_split_quoted_values() {
        let conf: Config = "motd = \"hello # world\"\n".parse().unwrap();
        assert_eq!(conf.get("motd").unwrap().as_str(), "hello # world");
    }

    #[test]
    fn commas_inside_quotes_stay_in_one_value() {
        let conf: Config = "pairs = [\"a,b\", \"c\"]\n".parse().unwrap();
        let pairs: Vec<_> =
            conf.global().get_all("pairs").unwrap().iter().map(Value::as_str).collect();
        assert_eq!(pairs, ["a,b", "c"]);
    }

    #[test]
    fn missing_equals_reports_line() {
        let err = "ok = 1\nbroken line\n".parse::<Config>().unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn unterminated_section_is_an_error() {
        let err = "[proxy\n".parse::<Config>().unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn unterminated_array_is_an_error() {
        let err = "xs = [\"a\", \"b\"\n".parse::<Config>().unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn later_sections_do_not_leak_into_global() {
        let conf: Config = "[a]\nx = 1\n[b]\nx = 2\n".parse().unwrap();
        assert!(conf.get("x").is_none());
        assert_eq!(conf.section("a").unwrap().get("x").unwrap().as_i64(), Some(1));
        assert_eq!(conf.section("b").unwrap().get("x").unwrap().as_i64(), Some(2));
    }
}
