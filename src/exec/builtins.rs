//! Native functions and the global environment scripts start with.

use super::interp::{Eval, Interpreter, MAX_ARRAY_LEN};
use super::value::{
    array_index, number_to_string, parse_float, parse_int, Class, Object, ObjectId, Value,
};
use std::cmp::Ordering;
use std::rc::Rc;

/// Nesting limit for `JSON.stringify`
const MAX_JSON_DEPTH: usize = 1000;

/// A function implemented by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
    Console(ConsoleLevel),
    Math(MathFn),
    JsonStringify,
    StringCtor,
    NumberCtor,
    BooleanCtor,
    ParseInt,
    ParseFloat,
    IsNaN,
    ArrayIsArray,
    ObjectKeys,
    ObjectValues,
    ObjectEntries,
    /// `Error`, `TypeError`, ... carrying the error name
    ErrorCtor(&'static str),
    Array(ArrayMethod),
    Str(StringMethod),
    NumberToFixed,
    ToString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    Abs,
    Floor,
    Ceil,
    Round,
    Trunc,
    Sign,
    Sqrt,
    Pow,
    Min,
    Max,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayMethod {
    Push,
    Pop,
    Shift,
    Unshift,
    Join,
    Map,
    Filter,
    Reduce,
    ForEach,
    Find,
    FindIndex,
    Some,
    Every,
    Includes,
    IndexOf,
    Slice,
    Reverse,
    Concat,
    Sort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMethod {
    ToUpperCase,
    ToLowerCase,
    Trim,
    TrimStart,
    TrimEnd,
    Includes,
    StartsWith,
    EndsWith,
    IndexOf,
    Split,
    Repeat,
    Slice,
    Substring,
    CharAt,
    PadStart,
    PadEnd,
    Replace,
    ReplaceAll,
}

const CONSOLE_METHODS: &[(&str, ConsoleLevel)] = &[
    ("log", ConsoleLevel::Log),
    ("info", ConsoleLevel::Info),
    ("warn", ConsoleLevel::Warn),
    ("error", ConsoleLevel::Error),
];

const MATH_FUNCTIONS: &[(&str, MathFn)] = &[
    ("abs", MathFn::Abs),
    ("floor", MathFn::Floor),
    ("ceil", MathFn::Ceil),
    ("round", MathFn::Round),
    ("trunc", MathFn::Trunc),
    ("sign", MathFn::Sign),
    ("sqrt", MathFn::Sqrt),
    ("pow", MathFn::Pow),
    ("min", MathFn::Min),
    ("max", MathFn::Max),
    ("random", MathFn::Random),
];

const ARRAY_METHODS: &[(&str, ArrayMethod)] = &[
    ("push", ArrayMethod::Push),
    ("pop", ArrayMethod::Pop),
    ("shift", ArrayMethod::Shift),
    ("unshift", ArrayMethod::Unshift),
    ("join", ArrayMethod::Join),
    ("map", ArrayMethod::Map),
    ("filter", ArrayMethod::Filter),
    ("reduce", ArrayMethod::Reduce),
    ("forEach", ArrayMethod::ForEach),
    ("find", ArrayMethod::Find),
    ("findIndex", ArrayMethod::FindIndex),
    ("some", ArrayMethod::Some),
    ("every", ArrayMethod::Every),
    ("includes", ArrayMethod::Includes),
    ("indexOf", ArrayMethod::IndexOf),
    ("slice", ArrayMethod::Slice),
    ("reverse", ArrayMethod::Reverse),
    ("concat", ArrayMethod::Concat),
    ("sort", ArrayMethod::Sort),
];

const STRING_METHODS: &[(&str, StringMethod)] = &[
    ("toUpperCase", StringMethod::ToUpperCase),
    ("toLowerCase", StringMethod::ToLowerCase),
    ("trim", StringMethod::Trim),
    ("trimStart", StringMethod::TrimStart),
    ("trimEnd", StringMethod::TrimEnd),
    ("includes", StringMethod::Includes),
    ("startsWith", StringMethod::StartsWith),
    ("endsWith", StringMethod::EndsWith),
    ("indexOf", StringMethod::IndexOf),
    ("split", StringMethod::Split),
    ("repeat", StringMethod::Repeat),
    ("slice", StringMethod::Slice),
    ("substring", StringMethod::Substring),
    ("charAt", StringMethod::CharAt),
    ("padStart", StringMethod::PadStart),
    ("padEnd", StringMethod::PadEnd),
    ("replace", StringMethod::Replace),
    ("replaceAll", StringMethod::ReplaceAll),
];

fn name_in<T: PartialEq + Copy>(table: &[(&'static str, T)], item: T) -> &'static str {
    table
        .iter()
        .find(|(_, entry)| *entry == item)
        .map_or("", |(name, _)| *name)
}

fn lookup<T: Copy>(table: &[(&'static str, T)], key: &str) -> Option<T> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, entry)| *entry)
}

impl Native {
    /// Function name shown when the function itself is printed
    pub fn name(self) -> &'static str {
        match self {
            Native::Console(level) => name_in(CONSOLE_METHODS, level),
            Native::Math(f) => name_in(MATH_FUNCTIONS, f),
            Native::JsonStringify => "stringify",
            Native::StringCtor => "String",
            Native::NumberCtor => "Number",
            Native::BooleanCtor => "Boolean",
            Native::ParseInt => "parseInt",
            Native::ParseFloat => "parseFloat",
            Native::IsNaN => "isNaN",
            Native::ArrayIsArray => "isArray",
            Native::ObjectKeys => "keys",
            Native::ObjectValues => "values",
            Native::ObjectEntries => "entries",
            Native::ErrorCtor(name) => name,
            Native::Array(method) => name_in(ARRAY_METHODS, method),
            Native::Str(method) => name_in(STRING_METHODS, method),
            Native::NumberToFixed => "toFixed",
            Native::ToString => "toString",
        }
    }
}

/// Property of a string value: `length`, an index or a method
pub(crate) fn string_property(s: &str, key: &str) -> Value {
    if key == "length" {
        return Value::Number(s.chars().count() as f64);
    }
    if let Some(index) = array_index(key) {
        return s
            .chars()
            .nth(index)
            .map_or(Value::Undefined, |c| Value::str(c.to_string()));
    }
    if key == "toString" {
        return Value::Native(Native::ToString);
    }
    lookup(STRING_METHODS, key).map_or(Value::Undefined, |m| Value::Native(Native::Str(m)))
}

/// Methods reachable on numbers and booleans
pub(crate) fn primitive_method(value: &Value, key: &str) -> Value {
    match (value, key) {
        (Value::Number(_), "toFixed") => Value::Native(Native::NumberToFixed),
        (_, "toString") => Value::Native(Native::ToString),
        _ => Value::Undefined,
    }
}

pub(crate) fn array_method(key: &str) -> Value {
    lookup(ARRAY_METHODS, key).map_or(Value::Undefined, |m| Value::Native(Native::Array(m)))
}

fn namespace(interp: &mut Interpreter, entries: Vec<(&str, Value)>) -> Value {
    let mut object = Object::new(Class::Plain);
    for (key, value) in entries {
        object.set(Rc::from(key), value);
    }
    interp.heap.push(object);
    Value::Object(interp.heap.len() - 1)
}

/// Populate the global scope
pub(crate) fn install_globals(interp: &mut Interpreter) {
    let console = namespace(
        interp,
        CONSOLE_METHODS
            .iter()
            .map(|(name, level)| (*name, Value::Native(Native::Console(*level))))
            .collect(),
    );

    let mut math: Vec<(&str, Value)> = MATH_FUNCTIONS
        .iter()
        .map(|(name, f)| (*name, Value::Native(Native::Math(*f))))
        .collect();
    math.push(("PI", Value::Number(std::f64::consts::PI)));
    math.push(("E", Value::Number(std::f64::consts::E)));
    let math = namespace(interp, math);

    let json = namespace(
        interp,
        vec![("stringify", Value::Native(Native::JsonStringify))],
    );
    let object = namespace(
        interp,
        vec![
            ("keys", Value::Native(Native::ObjectKeys)),
            ("values", Value::Native(Native::ObjectValues)),
            ("entries", Value::Native(Native::ObjectEntries)),
        ],
    );
    let array = namespace(
        interp,
        vec![("isArray", Value::Native(Native::ArrayIsArray))],
    );

    let globals = [
        ("console", console),
        ("Math", math),
        ("JSON", json),
        ("Object", object),
        ("Array", array),
        ("String", Value::Native(Native::StringCtor)),
        ("Number", Value::Native(Native::NumberCtor)),
        ("Boolean", Value::Native(Native::BooleanCtor)),
        ("parseInt", Value::Native(Native::ParseInt)),
        ("parseFloat", Value::Native(Native::ParseFloat)),
        ("isNaN", Value::Native(Native::IsNaN)),
        ("Error", Value::Native(Native::ErrorCtor("Error"))),
        ("TypeError", Value::Native(Native::ErrorCtor("TypeError"))),
        ("RangeError", Value::Native(Native::ErrorCtor("RangeError"))),
        ("SyntaxError", Value::Native(Native::ErrorCtor("SyntaxError"))),
        ("ReferenceError", Value::Native(Native::ErrorCtor("ReferenceError"))),
        ("NaN", Value::Number(f64::NAN)),
        ("Infinity", Value::Number(f64::INFINITY)),
        ("undefined", Value::Undefined),
    ];
    for (name, value) in globals {
        interp.define(0, Rc::from(name), value, true);
    }
    interp.define(0, Rc::from("this"), Value::Undefined, false);
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

impl Interpreter {
    pub(crate) fn call_native(
        &mut self,
        native: Native,
        this: Value,
        args: Vec<Value>,
    ) -> Eval<Value> {
        match native {
            Native::Console(level) => {
                let mut line = self.console_line(&args)?;
                if level == ConsoleLevel::Error {
                    line.insert_str(0, "ERROR: ");
                }
                self.emit(line)?;
                Ok(Value::Undefined)
            }
            Native::Math(f) => Ok(Value::Number(self.math(f, &args))),
            Native::JsonStringify => {
                let indent = self.json_indent(&arg(&args, 2));
                Ok(match self.json_stringify(&arg(&args, 0), &indent)? {
                    Some(text) => Value::str(text),
                    None => Value::Undefined,
                })
            }
            Native::StringCtor => Ok(match args.first() {
                Some(value) => Value::Str(self.to_string(value)),
                None => Value::str(""),
            }),
            Native::NumberCtor => Ok(Value::Number(
                args.first().map_or(0.0, |value| self.to_number(value)),
            )),
            Native::BooleanCtor => Ok(Value::Bool(self.truthy(&arg(&args, 0)))),
            Native::ParseInt => {
                let text = self.to_string(&arg(&args, 0));
                let radix = match arg(&args, 1) {
                    Value::Undefined => None,
                    radix => Some(self.to_number(&radix) as u32),
                };
                Ok(Value::Number(parse_int(&text, radix)))
            }
            Native::ParseFloat => {
                let text = self.to_string(&arg(&args, 0));
                Ok(Value::Number(parse_float(&text)))
            }
            Native::IsNaN => Ok(Value::Bool(self.to_number(&arg(&args, 0)).is_nan())),
            Native::ArrayIsArray => Ok(Value::Bool(
                matches!(arg(&args, 0), Value::Object(id) if self.array_items(id).is_some()),
            )),
            Native::ObjectKeys => {
                let keys = self
                    .own_keys(&arg(&args, 0))
                    .into_iter()
                    .map(Value::Str)
                    .collect();
                self.alloc_array(keys)
            }
            Native::ObjectValues | Native::ObjectEntries => {
                let target = arg(&args, 0);
                let keys = self.own_keys(&target);
                let mut items = Vec::with_capacity(keys.len());
                for key in keys {
                    let value = self.get_property(&target, &key)?;
                    items.push(if native == Native::ObjectEntries {
                        self.alloc_array(vec![Value::Str(key), value])?
                    } else {
                        value
                    });
                }
                self.alloc_array(items)
            }
            Native::ErrorCtor(name) => {
                let message = match arg(&args, 0) {
                    Value::Undefined => Rc::from(""),
                    message => self.to_string(&message),
                };
                self.make_error(name, &message)
            }
            Native::Array(method) => self.array_call(method, this, args),
            Native::Str(method) => match this {
                Value::Str(text) => self.string_call(method, &text, &args),
                _ => Err(self.throw_error(
                    "TypeError",
                    "String method called on incompatible receiver",
                )),
            },
            Native::NumberToFixed => {
                let digits = self.to_number(&arg(&args, 0));
                let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
                if !(0.0..=100.0).contains(&digits) {
                    return Err(self.throw_error(
                        "RangeError",
                        "toFixed() digits argument must be between 0 and 100",
                    ));
                }
                let value = self.to_number(&this);
                Ok(Value::str(to_fixed(value, digits as usize)))
            }
            Native::ToString => {
                if let (Value::Number(n), Value::Number(radix)) = (&this, arg(&args, 0)) {
                    return Ok(Value::str(radix_string(*n, radix)));
                }
                Ok(Value::Str(self.to_string(&this)))
            }
        }
    }

    /// One `console.*` line: strings verbatim, objects as JSON
    fn console_line(&mut self, args: &[Value]) -> Eval<String> {
        let mut parts = Vec::with_capacity(args.len());
        for value in args {
            let part = match value {
                Value::Str(s) => s.to_string(),
                Value::Object(id)
                    if matches!(self.heap[*id].class, Class::Plain | Class::Array(_)) =>
                {
                    self.json_stringify(value, "")?
                        .unwrap_or_else(|| "undefined".to_string())
                }
                other => self.to_string(other).to_string(),
            };
            parts.push(part);
        }
        let line = parts.join(" ");
        self.check_string_len(line.len())?;
        Ok(line)
    }

    fn math(&self, f: MathFn, args: &[Value]) -> f64 {
        let n = |index: usize| self.to_number(&arg(args, index));
        match f {
            MathFn::Abs => n(0).abs(),
            MathFn::Floor => n(0).floor(),
            MathFn::Ceil => n(0).ceil(),
            MathFn::Round => {
                let x = n(0);
                if x.fract() == -0.5 {
                    x.ceil()
                } else {
                    x.round()
                }
            }
            MathFn::Trunc => n(0).trunc(),
            MathFn::Sign => {
                let x = n(0);
                if x.is_nan() || x == 0.0 {
                    x
                } else {
                    x.signum()
                }
            }
            MathFn::Sqrt => n(0).sqrt(),
            MathFn::Pow => n(0).powf(n(1)),
            MathFn::Min => args.iter().fold(f64::INFINITY, |acc, value| {
                let x = self.to_number(value);
                if acc.is_nan() || x.is_nan() {
                    f64::NAN
                } else {
                    acc.min(x)
                }
            }),
            MathFn::Max => args.iter().fold(f64::NEG_INFINITY, |acc, value| {
                let x = self.to_number(value);
                if acc.is_nan() || x.is_nan() {
                    f64::NAN
                } else {
                    acc.max(x)
                }
            }),
            MathFn::Random => rand::random::<f64>(),
        }
    }

    // =========================================================================
    // JSON
    // =========================================================================

    fn json_indent(&self, space: &Value) -> String {
        match space {
            Value::Number(n) if *n >= 1.0 => " ".repeat(n.min(10.0) as usize),
            Value::Str(s) => s.chars().take(10).collect(),
            _ => String::new(),
        }
    }

    /// `None` when the value has no JSON form (undefined, functions)
    pub(crate) fn json_stringify(&mut self, value: &Value, indent: &str) -> Eval<Option<String>> {
        let mut out = String::new();
        let mut stack = Vec::new();
        let written = self.json_write(value, indent, 0, &mut stack, &mut out)?;
        Ok(written.then_some(out))
    }

    fn json_write(
        &mut self,
        value: &Value,
        indent: &str,
        level: usize,
        stack: &mut Vec<ObjectId>,
        out: &mut String,
    ) -> Eval<bool> {
        match value {
            Value::Undefined | Value::Native(_) => return Ok(false),
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) if n.is_finite() => out.push_str(&number_to_string(*n)),
            Value::Number(_) => out.push_str("null"),
            Value::Str(s) => quote_json(s, out),
            Value::Object(id) => {
                let id = *id;
                if self.heap[id].is_function() {
                    return Ok(false);
                }
                if stack.contains(&id) {
                    return Err(
                        self.throw_error("TypeError", "Converting circular structure to JSON")
                    );
                }
                if stack.len() >= MAX_JSON_DEPTH {
                    return Err(self.throw_error("RangeError", "Maximum call stack size exceeded"));
                }
                stack.push(id);
                let result = self.json_write_object(id, indent, level, stack, out);
                stack.pop();
                result?;
            }
        }
        self.check_string_len(out.len())?;
        Ok(true)
    }

    fn json_write_object(
        &mut self,
        id: ObjectId,
        indent: &str,
        level: usize,
        stack: &mut Vec<ObjectId>,
        out: &mut String,
    ) -> Eval<()> {
        let object = &self.heap[id];
        let is_array = matches!(object.class, Class::Array(_));
        let entries: Vec<(Option<Rc<str>>, Value)> = match &object.class {
            Class::Array(items) => items.iter().map(|v| (None, v.clone())).collect(),
            Class::Error => Vec::new(),
            _ => object
                .props
                .iter()
                .map(|(k, v)| (Some(k.clone()), v.clone()))
                .collect(),
        };

        out.push(if is_array { '[' } else { '{' });
        let mut wrote_any = false;
        for (key, value) in entries {
            let mark = out.len();
            if wrote_any {
                out.push(',');
            }
            newline_indent(out, indent, level + 1);
            if let Some(key) = &key {
                quote_json(key, out);
                out.push(':');
                if !indent.is_empty() {
                    out.push(' ');
                }
            }
            if !self.json_write(&value, indent, level + 1, stack, out)? {
                if is_array {
                    out.push_str("null");
                } else {
                    out.truncate(mark);
                    continue;
                }
            }
            wrote_any = true;
        }
        if wrote_any {
            newline_indent(out, indent, level);
        }
        out.push(if is_array { ']' } else { '}' });
        Ok(())
    }

    // =========================================================================
    // Arrays
    // =========================================================================

    fn element(&self, id: ObjectId, index: usize) -> Value {
        self.array_items(id)
            .and_then(|items| items.get(index).cloned())
            .unwrap_or(Value::Undefined)
    }

    fn expect_callable(&mut self, value: &Value) -> Eval<()> {
        if self.is_callable(value) {
            return Ok(());
        }
        let shown = self.to_string(value);
        Err(self.throw_error("TypeError", format!("{} is not a function", shown)))
    }

    /// Clamp a relative index argument as `slice` does
    fn relative_index(&self, value: &Value, len: usize, default: usize) -> usize {
        if matches!(value, Value::Undefined) {
            return default;
        }
        let n = self.to_number(value);
        if n.is_nan() {
            0
        } else if n < 0.0 {
            (len as f64 + n.trunc()).max(0.0) as usize
        } else {
            n.trunc().min(len as f64) as usize
        }
    }

    fn array_call(&mut self, method: ArrayMethod, this: Value, args: Vec<Value>) -> Eval<Value> {
        use ArrayMethod as A;

        let id = match this {
            Value::Object(id) if self.array_items(id).is_some() => id,
            _ => {
                return Err(self.throw_error(
                    "TypeError",
                    "Array method called on incompatible receiver",
                ))
            }
        };
        let array = Value::Object(id);
        let len = self.array_items(id).map_or(0, Vec::len);

        match method {
            A::Push | A::Unshift => {
                if len + args.len() > MAX_ARRAY_LEN {
                    return Err(self.throw_error("RangeError", "Invalid array length"));
                }
                let added = args.len();
                if let Some(items) = self.array_items_mut(id) {
                    if method == A::Push {
                        items.extend(args);
                    } else {
                        let mut rest = std::mem::replace(items, args);
                        items.append(&mut rest);
                    }
                }
                Ok(Value::Number((len + added) as f64))
            }
            A::Pop => Ok(self
                .array_items_mut(id)
                .and_then(Vec::pop)
                .unwrap_or(Value::Undefined)),
            A::Shift => Ok(match self.array_items_mut(id) {
                Some(items) if !items.is_empty() => items.remove(0),
                _ => Value::Undefined,
            }),
            A::Join => {
                let separator = match arg(&args, 0) {
                    Value::Undefined => Rc::from(","),
                    sep => self.to_string(&sep),
                };
                let items = self.array_items(id).cloned().unwrap_or_default();
                let parts: Vec<Rc<str>> = items
                    .iter()
                    .map(|item| match item {
                        Value::Undefined | Value::Null => Rc::from(""),
                        other => self.to_string(other),
                    })
                    .collect();
                let text = parts.join(&*separator);
                self.check_string_len(text.len())?;
                Ok(Value::str(text))
            }
            A::Map | A::Filter | A::ForEach | A::Find | A::FindIndex | A::Some | A::Every => {
                let callback = arg(&args, 0);
                self.expect_callable(&callback)?;

                let mut collected = Vec::new();
                for index in 0..len {
                    let item = self.element(id, index);
                    let result = self.call(
                        &callback,
                        Value::Undefined,
                        vec![item.clone(), Value::Number(index as f64), array.clone()],
                    )?;
                    let hit = self.truthy(&result);
                    match method {
                        A::Map => collected.push(result),
                        A::Filter if hit => collected.push(item),
                        A::Find if hit => return Ok(item),
                        A::FindIndex if hit => return Ok(Value::Number(index as f64)),
                        A::Some if hit => return Ok(Value::Bool(true)),
                        A::Every if !hit => return Ok(Value::Bool(false)),
                        _ => {}
                    }
                }

                match method {
                    A::Map | A::Filter => self.alloc_array(collected),
                    A::FindIndex => Ok(Value::Number(-1.0)),
                    A::Some => Ok(Value::Bool(false)),
                    A::Every => Ok(Value::Bool(true)),
                    _ => Ok(Value::Undefined),
                }
            }
            A::Reduce => {
                let callback = arg(&args, 0);
                self.expect_callable(&callback)?;

                let (mut acc, start) = match args.get(1) {
                    Some(initial) => (initial.clone(), 0),
                    None if len == 0 => {
                        return Err(self.throw_error(
                            "TypeError",
                            "Reduce of empty array with no initial value",
                        ))
                    }
                    None => (self.element(id, 0), 1),
                };
                for index in start..len {
                    let item = self.element(id, index);
                    acc = self.call(
                        &callback,
                        Value::Undefined,
                        vec![acc, item, Value::Number(index as f64), array.clone()],
                    )?;
                }
                Ok(acc)
            }
            A::Includes | A::IndexOf => {
                let target = arg(&args, 0);
                let items = self.array_items(id).map_or(&[][..], Vec::as_slice);
                if method == A::Includes {
                    let found = items.iter().any(|item| match (item, &target) {
                        (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
                        (a, b) => a == b,
                    });
                    Ok(Value::Bool(found))
                } else {
                    let position = items.iter().position(|item| *item == target);
                    Ok(Value::Number(position.map_or(-1.0, |i| i as f64)))
                }
            }
            A::Slice => {
                let start = self.relative_index(&arg(&args, 0), len, 0);
                let end = self.relative_index(&arg(&args, 1), len, len).max(start);
                let items = self
                    .array_items(id)
                    .map(|items| items[start..end].to_vec())
                    .unwrap_or_default();
                self.alloc_array(items)
            }
            A::Reverse => {
                if let Some(items) = self.array_items_mut(id) {
                    items.reverse();
                }
                Ok(array)
            }
            A::Concat => {
                let mut items = self.array_items(id).cloned().unwrap_or_default();
                for value in args {
                    let spread = match &value {
                        Value::Object(other) => self.array_items(*other).cloned(),
                        _ => None,
                    };
                    match spread {
                        Some(more) => items.extend(more),
                        None => items.push(value),
                    }
                    if items.len() > MAX_ARRAY_LEN {
                        return Err(self.throw_error("RangeError", "Invalid array length"));
                    }
                }
                self.alloc_array(items)
            }
            A::Sort => {
                let comparator = match arg(&args, 0) {
                    Value::Undefined => None,
                    f if self.is_callable(&f) => Some(f),
                    _ => {
                        return Err(self.throw_error(
                            "TypeError",
                            "The comparison function must be either a function or undefined",
                        ))
                    }
                };
                let items = self.array_items(id).cloned().unwrap_or_default();
                let sorted = self.merge_sort(items, comparator.as_ref())?;
                if let Some(items) = self.array_items_mut(id) {
                    *items = sorted;
                }
                Ok(array)
            }
        }
    }

    /// Stable sort driven by a possibly throwing comparator
    fn merge_sort(&mut self, mut items: Vec<Value>, comparator: Option<&Value>) -> Eval<Vec<Value>> {
        if items.len() <= 1 {
            return Ok(items);
        }
        let right = items.split_off(items.len() / 2);
        let left = self.merge_sort(items, comparator)?;
        let right = self.merge_sort(right, comparator)?;

        let mut merged = Vec::with_capacity(left.len() + right.len());
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            if self.sort_order(&left[i], &right[j], comparator)? == Ordering::Greater {
                merged.push(right[j].clone());
                j += 1;
            } else {
                merged.push(left[i].clone());
                i += 1;
            }
        }
        merged.extend_from_slice(&left[i..]);
        merged.extend_from_slice(&right[j..]);
        Ok(merged)
    }

    fn sort_order(&mut self, a: &Value, b: &Value, comparator: Option<&Value>) -> Eval<Ordering> {
        match (a, b) {
            (Value::Undefined, Value::Undefined) => return Ok(Ordering::Equal),
            (Value::Undefined, _) => return Ok(Ordering::Greater),
            (_, Value::Undefined) => return Ok(Ordering::Less),
            _ => {}
        }
        match comparator {
            Some(f) => {
                let result = self.call(f, Value::Undefined, vec![a.clone(), b.clone()])?;
                let n = self.to_number(&result);
                Ok(if n > 0.0 {
                    Ordering::Greater
                } else if n < 0.0 {
                    Ordering::Less
                } else {
                    Ordering::Equal
                })
            }
            None => Ok(self.to_string(a).cmp(&self.to_string(b))),
        }
    }

    // =========================================================================
    // Strings
    // =========================================================================

    fn string_arg(&self, args: &[Value], index: usize) -> Rc<str> {
        self.to_string(&arg(args, index))
    }

    fn string_call(&mut self, method: StringMethod, s: &str, args: &[Value]) -> Eval<Value> {
        use StringMethod as S;

        let value = match method {
            S::ToUpperCase => Value::str(s.to_uppercase()),
            S::ToLowerCase => Value::str(s.to_lowercase()),
            S::Trim => Value::str(s.trim()),
            S::TrimStart => Value::str(s.trim_start()),
            S::TrimEnd => Value::str(s.trim_end()),
            S::Includes => Value::Bool(s.contains(&*self.string_arg(args, 0))),
            S::StartsWith => Value::Bool(s.starts_with(&*self.string_arg(args, 0))),
            S::EndsWith => Value::Bool(s.ends_with(&*self.string_arg(args, 0))),
            S::IndexOf => {
                let needle = self.string_arg(args, 0);
                Value::Number(
                    s.find(&*needle)
                        .map_or(-1.0, |byte| s[..byte].chars().count() as f64),
                )
            }
            S::Split => {
                let mut parts: Vec<Value> = match arg(args, 0) {
                    Value::Undefined => vec![Value::str(s)],
                    separator => {
                        let separator = self.to_string(&separator);
                        if separator.is_empty() {
                            s.chars().map(|c| Value::str(c.to_string())).collect()
                        } else {
                            s.split(&*separator).map(Value::str).collect()
                        }
                    }
                };
                if let Value::Number(limit) = arg(args, 1) {
                    parts.truncate(limit.max(0.0) as usize);
                }
                return self.alloc_array(parts);
            }
            S::Repeat => {
                let count = self.to_number(&arg(args, 0));
                let count = if count.is_nan() { 0.0 } else { count.trunc() };
                if count < 0.0 || count.is_infinite() {
                    return Err(self.throw_error(
                        "RangeError",
                        format!("Invalid count value: {}", number_to_string(count)),
                    ));
                }
                self.check_string_len(s.len().saturating_mul(count as usize))?;
                Value::str(s.repeat(count as usize))
            }
            S::Slice => {
                let chars: Vec<char> = s.chars().collect();
                let start = self.relative_index(&arg(args, 0), chars.len(), 0);
                let end = self
                    .relative_index(&arg(args, 1), chars.len(), chars.len())
                    .max(start);
                Value::str(chars[start..end].iter().collect::<String>())
            }
            S::Substring => {
                let chars: Vec<char> = s.chars().collect();
                let clamp = |value: Value, default: usize| match value {
                    Value::Undefined => default,
                    other => {
                        let n = self.to_number(&other);
                        if n.is_nan() {
                            0
                        } else {
                            n.clamp(0.0, chars.len() as f64) as usize
                        }
                    }
                };
                let a = clamp(arg(args, 0), 0);
                let b = clamp(arg(args, 1), chars.len());
                let (start, end) = if a <= b { (a, b) } else { (b, a) };
                Value::str(chars[start..end].iter().collect::<String>())
            }
            S::CharAt => {
                let n = self.to_number(&arg(args, 0));
                let n = if n.is_nan() { 0.0 } else { n.trunc() };
                let c = if n < 0.0 {
                    None
                } else {
                    s.chars().nth(n as usize)
                };
                Value::str(c.map(String::from).unwrap_or_default())
            }
            S::PadStart | S::PadEnd => {
                let target = self.to_number(&arg(args, 0));
                let target = if target.is_nan() { 0 } else { target.max(0.0) as usize };
                let pad = match arg(args, 1) {
                    Value::Undefined => Rc::from(" "),
                    other => self.to_string(&other),
                };
                let len = s.chars().count();
                if target <= len || pad.is_empty() {
                    return Ok(Value::str(s));
                }
                self.check_string_len(target)?;
                let fill: String = pad.chars().cycle().take(target - len).collect();
                if method == S::PadStart {
                    Value::str(fill + s)
                } else {
                    Value::str(s.to_string() + &fill)
                }
            }
            S::Replace | S::ReplaceAll => {
                let from = self.string_arg(args, 0);
                let to = self.string_arg(args, 1);
                let replaced = if method == S::Replace {
                    s.replacen(&*from, &to, 1)
                } else {
                    s.replace(&*from, &to)
                };
                self.check_string_len(replaced.len())?;
                Value::str(replaced)
            }
        };
        Ok(value)
    }
}

fn quote_json(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn newline_indent(out: &mut String, indent: &str, level: usize) {
    if indent.is_empty() {
        return;
    }
    out.push('\n');
    for _ in 0..level {
        out.push_str(indent);
    }
}

/// `Number.prototype.toFixed`: ties round away from zero
fn to_fixed(x: f64, digits: usize) -> String {
    if !x.is_finite() || x.abs() >= 1e21 {
        return number_to_string(x);
    }

    let exact = format!("{:.*}", digits + 25, x.abs());
    let (int_part, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut figures: Vec<u8> = int_part
        .bytes()
        .chain(frac.bytes().take(digits))
        .map(|b| b - b'0')
        .collect();
    let mut int_len = int_part.len();

    if frac.as_bytes().get(digits).is_some_and(|b| *b >= b'5') {
        let mut carry = true;
        for figure in figures.iter_mut().rev() {
            if *figure == 9 {
                *figure = 0;
            } else {
                *figure += 1;
                carry = false;
                break;
            }
        }
        if carry {
            figures.insert(0, 1);
            int_len += 1;
        }
    }

    let mut out = String::with_capacity(figures.len() + 2);
    if x < 0.0 {
        out.push('-');
    }
    for (i, figure) in figures.iter().enumerate() {
        if i == int_len {
            out.push('.');
        }
        out.push(char::from(b'0' + figure));
    }
    out
}

/// `Number.prototype.toString(radix)` for integral values
fn radix_string(n: f64, radix: f64) -> String {
    let radix = radix as u32;
    if radix == 10 || !(2..=36).contains(&radix) || n.fract() != 0.0 || n.abs() >= 9e15 {
        return number_to_string(n);
    }
    let mut value = n.abs() as u64;
    let mut digits = Vec::new();
    loop {
        let digit = (value % u64::from(radix)) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        value /= u64::from(radix);
        if value == 0 {
            break;
        }
    }
    if n < 0.0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::parser::parse_program;
    use crate::exec::Limits;

    fn run(source: &str) -> Vec<String> {
        let program = parse_program(source).expect("parse");
        Interpreter::new(Limits::default())
            .run(&program)
            .expect("run")
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(3.14159, 2), "3.14");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(9.999, 2), "10.00");
        assert_eq!(to_fixed(-1.5, 0), "-2");
        assert_eq!(to_fixed(42.0, 0), "42");
    }

    #[test]
    fn test_radix_string() {
        assert_eq!(radix_string(255.0, 16.0), "ff");
        assert_eq!(radix_string(-5.0, 2.0), "-101");
        assert_eq!(radix_string(1.5, 2.0), "1.5");
    }

    #[test]
    fn test_console_formats_values() {
        let out = run(r#"console.log("a", 1, true, null, undefined, [1, "x"], {k: 2});"#);
        assert_eq!(out, vec![r#"a 1 true null undefined [1,"x"] {"k":2}"#]);

        let out = run(r#"console.error("bad", 42); console.warn("careful");"#);
        assert_eq!(out, vec!["ERROR: bad 42", "careful"]);
    }

    #[test]
    fn test_json_stringify() {
        let out = run(
            r#"
            console.log(JSON.stringify({a: [1, 2], b: "q\"", c: undefined, d: NaN}));
            console.log(JSON.stringify([undefined, function () {}]));
            console.log(JSON.stringify({x: {y: 1}}, null, 2));
            console.log(JSON.stringify({}), JSON.stringify([]));
            "#,
        );
        assert_eq!(out[0], r#"{"a":[1,2],"b":"q\"","d":null}"#);
        assert_eq!(out[1], "[null,null]");
        assert_eq!(out[2], "{\n  \"x\": {\n    \"y\": 1\n  }\n}");
        assert_eq!(out[3], "{} []");
    }

    #[test]
    fn test_json_cycle_is_catchable() {
        let out = run(
            r#"
            const a = {};
            a.self = a;
            try { JSON.stringify(a); } catch (e) { console.log(e.name, e.message); }
            "#,
        );
        assert_eq!(out, vec!["TypeError Converting circular structure to JSON"]);
    }

    #[test]
    fn test_array_methods() {
        let out = run(
            r#"
            const xs = [3, 1, 2];
            xs.push(4);
            console.log(xs.length, xs.join("-"));
            console.log(xs.map(x => x * 2).filter(x => x > 4).join());
            console.log(xs.reduce((a, b) => a + b, 0));
            console.log(xs.slice(1, -1).join(), xs.indexOf(2), xs.includes(9));
            console.log(xs.sort((a, b) => a - b).join(), [10, 9, 1].sort().join());
            console.log(xs.find(x => x > 2), xs.findIndex(x => x > 9));
            console.log(xs.some(x => x > 3), xs.every(x => x > 3));
            console.log([1].concat([2, 3], 4).reverse().join());
            "#,
        );
        assert_eq!(
            out,
            vec![
                "4 3-1-2-4",
                "6,8",
                "10",
                "1,2 2 false",
                "1,2,3,4 1,10,9",
                "3 -1",
                "true false",
                "4,3,2,1",
            ]
        );
    }

    #[test]
    fn test_reduce_empty_without_initial_throws() {
        let out = run("try { [].reduce((a, b) => a) } catch (e) { console.log(e.message) }");
        assert_eq!(out, vec!["Reduce of empty array with no initial value"]);
    }

    #[test]
    fn test_string_methods() {
        let out = run(
            r#"
            const s = "  Hello, Nebula  ";
            const t = s.trim();
            console.log(t.toUpperCase(), t.toLowerCase());
            console.log(t.includes("Neb"), t.startsWith("Hell"), t.endsWith("x"));
            console.log(t.split(", ").join("|"), t.indexOf("N"), t.charAt(1));
            console.log("ab".repeat(3), t.slice(-6), t.substring(5, 0));
            console.log("5".padStart(3, "0"), "a-b-c".replaceAll("-", "+"), "a-b".replace("-", ""));
            "#,
        );
        assert_eq!(
            out,
            vec![
                "HELLO, NEBULA hello, nebula",
                "true true false",
                "Hello|Nebula 7 e",
                "ababab Nebula Hello",
                "005 a+b+c ab",
            ]
        );
    }

    #[test]
    fn test_math_and_conversions() {
        let out = run(
            r#"
            console.log(Math.max(1, 5, 3), Math.min(), Math.round(-2.5), Math.round(2.5));
            console.log(parseInt("42px"), parseFloat("3.5kg"), isNaN("abc"), Number("7"));
            console.log(String(12) + 1, Boolean(""), (3.14159).toFixed(2), (255).toString(16));
            const r = Math.random();
            console.log(r >= 0 && r < 1);
            "#,
        );
        assert_eq!(
            out,
            vec![
                "5 Infinity -2 3",
                "42 3.5 true 7",
                "121 false 3.14 ff",
                "true",
            ]
        );
    }

    #[test]
    fn test_object_helpers() {
        let out = run(
            r#"
            const o = {a: 1, b: "two"};
            console.log(Object.keys(o).join(), Object.values(o).join());
            console.log(JSON.stringify(Object.entries(o)));
            console.log(Array.isArray([]), Array.isArray(o));
            "#,
        );
        assert_eq!(
            out,
            vec!["a,b 1,two", r#"[["a",1],["b","two"]]"#, "true false"]
        );
    }

    #[test]
    fn test_to_string_on_objects() {
        let out = run(
            r#"
            console.log([1, 2].toString(), String([1, [2, 3]]), [null, 4].toString());
            console.log(({}).toString(), "" + [5, [6]]);
            try { [1, 2].nope() } catch (e) { console.log(e.message) }
            "#,
        );
        assert_eq!(
            out,
            vec![
                "1,2 1,2,3 ,4",
                "[object Object] 5,6",
                "[...].nope is not a function",
            ]
        );
    }
}
