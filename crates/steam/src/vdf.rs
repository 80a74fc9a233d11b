//! Text KeyValues ("VDF") parser for Steam's `libraryfolders.vdf`,
//! `appmanifest_*.acf` and `localconfig.vdf`.
//!
//! Keys are looked up case-insensitively, matching how Steam itself treats
//! them. Platform conditionals (`[$WIN32]`) are accepted and ignored.

use std::fs;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use crate::SteamError;

/// A value in a KeyValues tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Object(Object),
}

/// An ordered list of key/value pairs. Duplicate keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    /// First value under `key`, compared case-insensitively.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            Value::Object(_) => None,
        }
    }

    pub fn get_object(&self, key: &str) -> Option<&Object> {
        match self.get(key)? {
            Value::Object(o) => Some(o),
            Value::String(_) => None,
        }
    }

    /// Follows a chain of nested objects.
    pub fn get_path(&self, keys: &[&str]) -> Option<&Object> {
        keys.iter().try_fold(self, |obj, key| obj.get_object(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads and parses a KeyValues file.
pub fn load(path: &Path) -> Result<Object, SteamError> {
    let text = fs::read_to_string(path)?;
    parse(&text).map_err(|e| match e {
        SteamError::Vdf(msg) => SteamError::Vdf(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Parses KeyValues text into its top-level object.
pub fn parse(text: &str) -> Result<Object, SteamError> {
    let mut parser = Parser {
        chars: text.chars().peekable(),
        line: 1,
    };
    parser.parse_object(false)
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Str(String),
    Open,
    Close,
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl Parser<'_> {
    fn error(&self, msg: impl std::fmt::Display) -> SteamError {
        SteamError::Vdf(format!("line {}: {msg}", self.line))
    }

    fn parse_object(&mut self, nested: bool) -> Result<Object, SteamError> {
        let mut obj = Object::default();
        loop {
            let key = match self.next_token()? {
                Some(Token::Str(key)) => key,
                Some(Token::Close) if nested => return Ok(obj),
                Some(Token::Close) => return Err(self.error("unexpected '}'")),
                Some(Token::Open) => return Err(self.error("expected key, found '{'")),
                None if nested => return Err(self.error("unexpected end of input, missing '}'")),
                None => return Ok(obj),
            };

            let value = match self.next_token()? {
                Some(Token::Str(s)) => Value::String(s),
                Some(Token::Open) => Value::Object(self.parse_object(true)?),
                Some(Token::Close) => {
                    return Err(self.error(format!("missing value for key '{key}'")));
                }
                None => return Err(self.error(format!("unexpected end of input after '{key}'"))),
            };

            self.skip_conditional();
            obj.entries.push((key, value));
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, SteamError> {
        self.skip_trivia();
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };
        match c {
            '{' => {
                self.chars.next();
                Ok(Some(Token::Open))
            }
            '}' => {
                self.chars.next();
                Ok(Some(Token::Close))
            }
            '"' => {
                self.chars.next();
                self.quoted().map(|s| Some(Token::Str(s)))
            }
            _ => Ok(Some(Token::Str(self.bare()))),
        }
    }

    fn quoted(&mut self) -> Result<String, SteamError> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c @ ('\\' | '"')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    out.push(c);
                }
            }
        }
    }

    fn bare(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                self.line += 1;
                self.chars.next();
            } else if c.is_whitespace() {
                self.chars.next();
            } else if c == '/' {
                let mut probe = self.chars.clone();
                probe.next();
                if probe.peek() != Some(&'/') {
                    return;
                }
                for c in self.chars.by_ref() {
                    if c == '\n' {
                        self.line += 1;
                        break;
                    }
                }
            } else {
                return;
            }
        }
    }

    /// Skips a trailing `[$PLATFORM]` conditional on the same entry.
    fn skip_conditional(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' || !c.is_whitespace() {
                break;
            }
            self.chars.next();
        }
        if self.chars.peek() == Some(&'[') {
            for c in self.chars.by_ref() {
                if c == ']' {
                    break;
                }
            }
        }
    }
}
