//! Natural (human) ordering for file and directory names.
//!
//! Lexicographic ordering puts `10` before `2`. Natural ordering splits a
//! name into maximal runs of ASCII digits and non-digits and compares the
//! digit runs by numeric value, so sibling folders `1, 2, 10` rank in the
//! order a person expects.
//!
//! # Ordering rules
//!
//! - Digit runs compare by magnitude. Leading zeros do not change the
//!   magnitude; when magnitudes tie the literal digit text breaks the tie, so
//!   `"02"` and `"2"` are never equal.
//! - At the same token position a digit run sorts before a non-digit run.
//! - Non-digit runs compare by Unicode code point. The comparison is
//!   case-sensitive on every platform (`"B" < "a"`).
//! - When one token stream is a strict prefix of the other, the shorter
//!   stream sorts first. The empty string sorts before everything else.
//!
//! The result is a strict total order: [`natural_cmp`] returns
//! [`Ordering::Equal`] only for identical strings, which makes it safe to
//! back a deterministic sort.
//!
//! # Examples
//!
//! ```
//! use dp_core::natural_cmp;
//! use std::cmp::Ordering;
//!
//! assert_eq!(natural_cmp("2", "10"), Ordering::Less);
//! assert_eq!(natural_cmp("file2", "file10"), Ordering::Less);
//! assert_eq!(natural_cmp("a", "a"), Ordering::Equal);
//! ```

use std::cmp::Ordering;

use camino::Utf8Path;

/// A single run of digits or non-digits inside a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Digits(&'a str),
    Text(&'a str),
}

/// Splits a string into alternating digit and non-digit runs.
struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());

        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;

        Some(if digits {
            Token::Digits(head)
        } else {
            Token::Text(head)
        })
    }
}

const fn tokens(s: &str) -> Tokens<'_> {
    Tokens { rest: s }
}

/// Compares two names using natural ordering.
///
/// See the [module documentation](self) for the exact rules.
///
/// # Examples
///
/// ```
/// use dp_core::natural_cmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(natural_cmp("10", "2"), Ordering::Greater);
/// assert_eq!(natural_cmp("sub2", "sub10"), Ordering::Less);
/// assert_eq!(natural_cmp("", "0"), Ordering::Less);
/// ```
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = tokens(a);
    let mut right = tokens(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match compare_tokens(x, y) {
                Ordering::Equal => {}
                other => return other,
            },
        }
    }
}

fn compare_tokens(x: Token<'_>, y: Token<'_>) -> Ordering {
    match (x, y) {
        (Token::Digits(x), Token::Digits(y)) => compare_digits(x, y),
        (Token::Digits(_), Token::Text(_)) => Ordering::Less,
        (Token::Text(_), Token::Digits(_)) => Ordering::Greater,
        (Token::Text(x), Token::Text(y)) => x.cmp(y),
    }
}

/// Compares two ASCII digit runs by magnitude without parsing them, so
/// arbitrarily long runs never overflow.
fn compare_digits(x: &str, y: &str) -> Ordering {
    let x_significant = x.trim_start_matches('0');
    let y_significant = y.trim_start_matches('0');

    x_significant
        .len()
        .cmp(&y_significant.len())
        .then_with(|| x_significant.cmp(y_significant))
        .then_with(|| x.cmp(y))
}

/// A borrowed name that orders naturally.
///
/// Useful wherever an [`Ord`] key is needed, for example with
/// [`slice::sort_by_key`] or as a `BTreeMap` key.
///
/// # Examples
///
/// ```
/// use dp_core::NaturalKey;
///
/// let mut names = vec!["10", "2", "1"];
/// names.sort_by_key(|name| NaturalKey(*name));
/// assert_eq!(names, ["1", "2", "10"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NaturalKey<'a>(pub &'a str);

impl Ord for NaturalKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(self.0, other.0)
    }
}

impl PartialOrd for NaturalKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sorts names in place using natural ordering.
///
/// # Examples
///
/// ```
/// use dp_core::sort_names;
///
/// let mut names = vec!["b1", "B10", "B2", "A", "10", "2", "1"];
/// sort_names(&mut names);
/// assert_eq!(names, ["1", "2", "10", "A", "B2", "B10", "b1"]);
/// ```
pub fn sort_names<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}

/// Sorts paths in place by their final component using natural ordering.
///
/// Paths without a final component (such as `/`) compare by their full
/// text. Ties between equal final components fall back to the full path so
/// the result stays deterministic.
pub fn sort_paths<P: AsRef<Utf8Path>>(paths: &mut [P]) {
    paths.sort_by(|a, b| path_cmp(a.as_ref(), b.as_ref()));
}

/// Compares two paths the way [`sort_paths`] orders them.
#[must_use]
pub fn path_cmp(a: &Utf8Path, b: &Utf8Path) -> Ordering {
    natural_cmp(sort_name(a), sort_name(b)).then_with(|| natural_cmp(a.as_str(), b.as_str()))
}

fn sort_name(path: &Utf8Path) -> &str {
    path.file_name().unwrap_or(path.as_str())
}
