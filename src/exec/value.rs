//! Runtime values and the conversions that need no heap access.

use super::ast::FunctionDef;
use super::builtins::Native;
use std::rc::Rc;

/// Index of an object in the interpreter heap
pub type ObjectId = usize;

/// Index of a scope in the interpreter scope arena
pub type ScopeId = usize;

/// A script value. Derived equality is strict equality (`===`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Object(ObjectId),
    Native(Native),
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }
}

/// A user function together with the scope it closes over
#[derive(Debug, Clone)]
pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub env: ScopeId,
}

#[derive(Debug, Clone)]
pub enum Class {
    Plain,
    Array(Vec<Value>),
    Function(Closure),
    /// Created by `Error` and its siblings; `name` and `message` live in props
    Error,
}

/// A heap object: its class plus insertion-ordered own properties
#[derive(Debug, Clone)]
pub struct Object {
    pub class: Class,
    pub props: Vec<(Rc<str>, Value)>,
}

impl Object {
    pub fn new(class: Class) -> Self {
        Self {
            class,
            props: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    pub fn set(&mut self, key: Rc<str>, value: Value) {
        match self.props.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.props.push((key, value)),
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.class, Class::Function(_))
    }
}

/// Number formatting as the script language prints numbers
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{}", n);
    }

    let s = format!("{:e}", n);
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => s,
    }
}

/// Numeric value of a string, `NaN` when it is not a number literal
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    let numeric = t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return f64::NAN;
    }
    t.parse().unwrap_or(f64::NAN)
}

pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// `parseInt`: the longest valid integer prefix
pub fn parse_int(s: &str, radix: Option<u32>) -> f64 {
    let mut t = s.trim_start();
    let negative = t.starts_with('-');
    if t.starts_with('-') || t.starts_with('+') {
        t = &t[1..];
    }

    let mut radix = radix.unwrap_or(0);
    if radix == 0 || radix == 16 {
        if let Some(rest) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
            t = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    let digits: Vec<u32> = t.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let value = digits
        .iter()
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(*d));
    if negative {
        -value
    } else {
        value
    }
}

/// `parseFloat`: the longest valid decimal prefix
pub fn parse_float(s: &str) -> f64 {
    let t = s.trim_start();
    let chars: Vec<char> = t.chars().collect();
    let mut end = 0;

    if matches!(chars.first(), Some('+' | '-')) {
        end = 1;
    }
    if t[end..].starts_with("Infinity") {
        return if t.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let digit = |i: usize| chars.get(i).is_some_and(|c| c.is_ascii_digit());
    let mut seen_digit = false;
    while digit(end) {
        end += 1;
        seen_digit = true;
    }
    if chars.get(end) == Some(&'.') {
        end += 1;
        while digit(end) {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    if matches!(chars.get(end), Some('e' | 'E')) {
        let sign = usize::from(matches!(chars.get(end + 1), Some('+' | '-')));
        if digit(end + 1 + sign) {
            end += 1 + sign;
            while digit(end) {
                end += 1;
            }
        }
    }

    let prefix: String = chars[..end].iter().collect();
    prefix.parse().unwrap_or(f64::NAN)
}

/// Canonical array index for a property key such as `"3"`
pub fn array_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(2.0), "2");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(123456789.0), "123456789");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number("  42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x10"), 16.0);
        assert_eq!(string_to_number("1e3"), 1000.0);
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("inf").is_nan());
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42px", None), 42.0);
        assert_eq!(parse_int("  -17", None), -17.0);
        assert_eq!(parse_int("ff", Some(16)), 255.0);
        assert_eq!(parse_int("0x1A", None), 26.0);
        assert_eq!(parse_int("101", Some(2)), 5.0);
        assert!(parse_int("abc", None).is_nan());
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("3.14abc"), 3.14);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("-2e2x"), -200.0);
        assert_eq!(parse_float("1e"), 1.0);
        assert!(parse_float("e5").is_nan());
    }

    #[test]
    fn test_int32_wrapping() {
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_int32(-1.5), -1);
        assert_eq!(to_uint32(-1.0), 4_294_967_295);
        assert_eq!(to_int32(f64::NAN), 0);
    }

    #[test]
    fn test_array_index() {
        assert_eq!(array_index("3"), Some(3));
        assert_eq!(array_index("03"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("length"), None);
    }
}
