//! Tree-walking evaluator.
//!
//! Scopes and objects live in arenas owned by the interpreter, so closures
//! hold plain indices and everything is freed when the interpreter drops.
//! Every statement, expression and loop iteration costs one step; the step
//! budget, the wall-clock deadline, the call depth and the output size are
//! all checked here.

use super::ast::{
    BinaryOp, DeclKind, Expr, FunctionBody, FunctionDef, LogicalOp, Stmt, UnaryOp,
};
use super::builtins::{self, Native};
use super::value::{
    array_index, number_to_string, string_to_number, to_int32, to_uint32, Class, Closure,
    Object, ObjectId, ScopeId, Value,
};
use super::{ExecutionError, Limits};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

const MAX_SCOPES: usize = 250_000;
const MAX_OBJECTS: usize = 500_000;
pub(crate) const MAX_STRING_LEN: usize = 1 << 24;
pub(crate) const MAX_ARRAY_LEN: usize = 1 << 22;

/// Why evaluation stopped early
#[derive(Debug)]
pub(crate) enum Abort {
    /// A thrown script value; `try/catch` can handle it
    Throw(Value),
    /// A resource limit; never catchable
    Limit(ExecutionError),
}

pub(crate) type Eval<T> = Result<T, Abort>;

/// Completion of a statement
#[derive(Debug)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

#[derive(Debug)]
struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Debug)]
struct Scope {
    vars: HashMap<Rc<str>, Binding>,
    parent: Option<ScopeId>,
    /// Function body scope; `var` declarations land here
    function: bool,
    /// A closure refers to this scope, so it must outlive its block
    captured: bool,
}

pub struct Interpreter {
    pub(crate) heap: Vec<Object>,
    scopes: Vec<Scope>,
    pub(crate) output: Vec<String>,
    limits: Limits,
    steps: u64,
    started: Instant,
    depth: usize,
}

impl Interpreter {
    pub fn new(limits: Limits) -> Self {
        let mut interp = Self {
            heap: Vec::new(),
            scopes: vec![Scope {
                vars: HashMap::new(),
                parent: None,
                function: true,
                captured: true,
            }],
            output: Vec::new(),
            limits,
            steps: 0,
            started: Instant::now(),
            depth: 0,
        };
        builtins::install_globals(&mut interp);
        interp
    }

    /// Run a parsed program and return the captured output lines
    pub fn run(mut self, program: &[Stmt]) -> Result<Vec<String>, ExecutionError> {
        self.started = Instant::now();
        let result = self
            .push_scope(0, true)
            .and_then(|scope| self.exec_statements(program, scope));
        match result {
            Ok(_) => Ok(self.output),
            Err(Abort::Limit(err)) => Err(err),
            Err(Abort::Throw(value)) => Err(ExecutionError::Uncaught(self.error_message(&value))),
        }
    }

    /// Message reported for an uncaught value: an error's `message`, or the
    /// value's string form
    fn error_message(&self, value: &Value) -> String {
        if let Value::Object(id) = value {
            let obj = &self.heap[*id];
            if matches!(obj.class, Class::Error) {
                if let Some(message) = obj.get("message") {
                    return self.to_string(message).to_string();
                }
            }
        }
        self.to_string(value).to_string()
    }

    // =========================================================================
    // Budgets
    // =========================================================================

    fn tick(&mut self) -> Eval<()> {
        self.steps += 1;
        if self.steps > self.limits.step_budget {
            log::info!("Script exceeded its step budget");
            return Err(Abort::Limit(ExecutionError::StepBudget(
                self.limits.step_budget,
            )));
        }
        if self.steps % 1024 == 0 && self.started.elapsed() >= self.limits.time_budget {
            log::info!("Script exceeded its time budget");
            return Err(Abort::Limit(ExecutionError::Timeout(
                self.limits.time_budget.as_millis() as u64,
            )));
        }
        Ok(())
    }

    pub(crate) fn emit(&mut self, line: String) -> Eval<()> {
        if self.output.len() >= self.limits.max_output_lines {
            return Err(Abort::Limit(ExecutionError::OutputLimit(
                self.limits.max_output_lines,
            )));
        }
        self.output.push(line);
        Ok(())
    }

    pub(crate) fn check_string_len(&mut self, len: usize) -> Eval<()> {
        if len > MAX_STRING_LEN {
            return Err(self.throw_error("RangeError", "Invalid string length"));
        }
        Ok(())
    }

    // =========================================================================
    // Heap
    // =========================================================================

    pub(crate) fn alloc(&mut self, object: Object) -> Eval<Value> {
        if self.heap.len() >= MAX_OBJECTS {
            return Err(Abort::Limit(ExecutionError::Resource("too many objects")));
        }
        self.heap.push(object);
        Ok(Value::Object(self.heap.len() - 1))
    }

    pub(crate) fn alloc_array(&mut self, items: Vec<Value>) -> Eval<Value> {
        self.alloc(Object::new(Class::Array(items)))
    }

    pub(crate) fn array_items(&self, id: ObjectId) -> Option<&Vec<Value>> {
        match &self.heap[id].class {
            Class::Array(items) => Some(items),
            _ => None,
        }
    }

    pub(crate) fn array_items_mut(&mut self, id: ObjectId) -> Option<&mut Vec<Value>> {
        match &mut self.heap[id].class {
            Class::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Build an error object such as `new TypeError(message)`
    pub(crate) fn make_error(&mut self, name: &str, message: &str) -> Eval<Value> {
        let mut obj = Object::new(Class::Error);
        obj.set(Rc::from("name"), Value::str(name));
        obj.set(Rc::from("message"), Value::str(message));
        self.alloc(obj)
    }

    /// An abort that throws a fresh error object
    pub(crate) fn throw_error(&mut self, name: &str, message: impl AsRef<str>) -> Abort {
        match self.make_error(name, message.as_ref()) {
            Ok(value) => Abort::Throw(value),
            Err(abort) => abort,
        }
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    fn push_scope(&mut self, parent: ScopeId, function: bool) -> Eval<ScopeId> {
        if self.scopes.len() >= MAX_SCOPES {
            return Err(Abort::Limit(ExecutionError::Resource("too many live scopes")));
        }
        self.scopes.push(Scope {
            vars: HashMap::new(),
            parent: Some(parent),
            function,
            captured: false,
        });
        Ok(self.scopes.len() - 1)
    }

    /// Release a scope if it is the newest one and nothing captured it
    fn pop_scope(&mut self, id: ScopeId) {
        if id + 1 == self.scopes.len() && !self.scopes[id].captured {
            self.scopes.pop();
        }
    }

    fn resolve(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scopes[id].vars.contains_key(name) {
                return Some(id);
            }
            current = self.scopes[id].parent;
        }
        None
    }

    fn lookup(&mut self, scope: ScopeId, name: &str) -> Eval<Value> {
        match self.resolve(scope, name) {
            Some(id) => Ok(self.scopes[id].vars[name].value.clone()),
            None => Err(self.throw_error("ReferenceError", format!("{} is not defined", name))),
        }
    }

    fn assign_var(&mut self, scope: ScopeId, name: &str, value: Value) -> Eval<()> {
        let Some(id) = self.resolve(scope, name) else {
            return Err(self.throw_error("ReferenceError", format!("{} is not defined", name)));
        };
        let Some(binding) = self.scopes[id].vars.get_mut(name) else {
            return Ok(());
        };
        if !binding.mutable {
            return Err(self.throw_error("TypeError", "Assignment to constant variable."));
        }
        binding.value = value;
        Ok(())
    }

    fn declare(
        &mut self,
        scope: ScopeId,
        name: &Rc<str>,
        value: Option<Value>,
        kind: DeclKind,
    ) -> Eval<()> {
        let target = match kind {
            DeclKind::Var => self.function_scope(scope),
            DeclKind::Let | DeclKind::Const => scope,
        };

        if let Some(existing) = self.scopes[target].vars.get_mut(name) {
            if kind != DeclKind::Var || !existing.mutable {
                return Err(self.throw_error(
                    "SyntaxError",
                    format!("Identifier '{}' has already been declared", name),
                ));
            }
            if let Some(value) = value {
                existing.value = value;
            }
            return Ok(());
        }

        self.define(target, name.clone(), value.unwrap_or(Value::Undefined), kind != DeclKind::Const);
        Ok(())
    }

    pub(crate) fn define(&mut self, scope: ScopeId, name: Rc<str>, value: Value, mutable: bool) {
        self.scopes[scope]
            .vars
            .insert(name, Binding { value, mutable });
    }

    fn function_scope(&self, scope: ScopeId) -> ScopeId {
        let mut id = scope;
        while !self.scopes[id].function {
            match self.scopes[id].parent {
                Some(parent) => id = parent,
                None => break,
            }
        }
        id
    }

    fn make_closure(&mut self, def: &Rc<FunctionDef>, scope: ScopeId) -> Eval<Value> {
        self.scopes[scope].captured = true;
        self.alloc(Object::new(Class::Function(Closure {
            def: Rc::clone(def),
            env: scope,
        })))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Run statements in `scope`, hoisting function declarations first
    fn exec_statements(&mut self, stmts: &[Stmt], scope: ScopeId) -> Eval<Flow> {
        for stmt in stmts {
            if let Stmt::Function(def) = stmt {
                if let Some(name) = &def.name {
                    let closure = self.make_closure(def, scope)?;
                    self.define(scope, name.clone(), closure, true);
                }
            }
        }

        for stmt in stmts {
            match self.exec(stmt, scope)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Run statements in a fresh child scope
    fn exec_block(&mut self, stmts: &[Stmt], parent: ScopeId) -> Eval<Flow> {
        let scope = self.push_scope(parent, false)?;
        let flow = self.exec_statements(stmts, scope);
        self.pop_scope(scope);
        flow
    }

    fn exec(&mut self, stmt: &Stmt, scope: ScopeId) -> Eval<Flow> {
        self.tick()?;

        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::Declare { kind, decls } => {
                for (name, init) in decls {
                    let value = match init {
                        Some(expr) => Some(self.eval(expr, scope)?),
                        None => None,
                    };
                    self.declare(scope, name, value, *kind)?;
                }
                Ok(Flow::Normal)
            }
            Stmt::Function(_) | Stmt::Empty => Ok(Flow::Normal),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If(test, consequent, alternate) => {
                let test = self.eval(test, scope)?;
                if self.truthy(&test) {
                    self.exec(consequent, scope)
                } else if let Some(alternate) = alternate {
                    self.exec(alternate, scope)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While(test, body) => {
                loop {
                    self.tick()?;
                    let test = self.eval(test, scope)?;
                    if !self.truthy(&test) {
                        break;
                    }
                    match self.exec(body, scope)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile(body, test) => {
                loop {
                    self.tick()?;
                    match self.exec(body, scope)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    let test = self.eval(test, scope)?;
                    if !self.truthy(&test) {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                let loop_scope = self.push_scope(scope, false)?;
                let flow = self.exec_for(
                    init.as_deref(),
                    test.as_ref(),
                    update.as_ref(),
                    body,
                    loop_scope,
                );
                self.pop_scope(loop_scope);
                flow
            }
            Stmt::ForEach {
                kind,
                name,
                keys,
                iterable,
                body,
            } => {
                let iterable = self.eval(iterable, scope)?;
                let items = if *keys {
                    self.own_keys(&iterable)
                        .into_iter()
                        .map(Value::Str)
                        .collect()
                } else {
                    self.iterate(&iterable)?
                };

                for item in items {
                    self.tick()?;
                    let iter_scope = self.push_scope(scope, false)?;
                    let flow = self
                        .declare(iter_scope, name, Some(item), *kind)
                        .and_then(|_| self.exec(body, iter_scope));
                    self.pop_scope(iter_scope);
                    match flow? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Block(stmts) => self.exec_block(stmts, scope),
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Throw(expr) => {
                let value = self.eval(expr, scope)?;
                Err(Abort::Throw(value))
            }
            Stmt::Try {
                block,
                handler,
                finalizer,
            } => {
                let mut result = self.exec_block(block, scope);

                if let Some(handler) = handler {
                    if let Err(Abort::Throw(thrown)) = result {
                        let catch_scope = self.push_scope(scope, false)?;
                        if let Some(param) = &handler.param {
                            self.define(catch_scope, param.clone(), thrown, true);
                        }
                        result = self.exec_statements(&handler.body, catch_scope);
                        self.pop_scope(catch_scope);
                    }
                }

                if matches!(result, Err(Abort::Limit(_))) {
                    return result;
                }
                if let Some(finalizer) = finalizer {
                    match self.exec_block(finalizer, scope)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                }
                result
            }
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        scope: ScopeId,
    ) -> Eval<Flow> {
        if let Some(init) = init {
            self.exec(init, scope)?;
        }
        loop {
            self.tick()?;
            if let Some(test) = test {
                let test = self.eval(test, scope)?;
                if !self.truthy(&test) {
                    break;
                }
            }
            match self.exec(body, scope)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
            if let Some(update) = update {
                self.eval(update, scope)?;
            }
        }
        Ok(Flow::Normal)
    }

    /// Values produced by `for...of`
    fn iterate(&mut self, value: &Value) -> Eval<Vec<Value>> {
        match value {
            Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
            Value::Object(id) => match self.array_items(*id) {
                Some(items) => Ok(items.clone()),
                None => Err(self.throw_error("TypeError", "object is not iterable")),
            },
            other => {
                let shown = self.to_string(other);
                Err(self.throw_error("TypeError", format!("{} is not iterable", shown)))
            }
        }
    }

    /// Enumerable own keys, as `Object.keys` reports them
    pub(crate) fn own_keys(&self, value: &Value) -> Vec<Rc<str>> {
        match value {
            Value::Str(s) => (0..s.chars().count())
                .map(|i| Rc::from(i.to_string().as_str()))
                .collect(),
            Value::Object(id) => {
                let obj = &self.heap[*id];
                let mut keys: Vec<Rc<str>> = match &obj.class {
                    Class::Array(items) => (0..items.len())
                        .map(|i| Rc::from(i.to_string().as_str()))
                        .collect(),
                    _ => Vec::new(),
                };
                let hidden = matches!(obj.class, Class::Error);
                keys.extend(
                    obj.props
                        .iter()
                        .filter(|(k, _)| !(hidden && (&**k == "name" || &**k == "message")))
                        .map(|(k, _)| k.clone()),
                );
                keys
            }
            _ => Vec::new(),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn eval(&mut self, expr: &Expr, scope: ScopeId) -> Eval<Value> {
        self.tick()?;

        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Template(strings, parts) => {
                let mut text = String::new();
                for (i, s) in strings.iter().enumerate() {
                    text.push_str(s);
                    if let Some(part) = parts.get(i) {
                        let value = self.eval(part, scope)?;
                        text.push_str(&self.to_string(&value));
                        self.check_string_len(text.len())?;
                    }
                }
                Ok(Value::str(text))
            }
            Expr::Ident(name) => self.lookup(scope, name),
            Expr::This => Ok(match self.resolve(scope, "this") {
                Some(id) => self.scopes[id].vars["this"].value.clone(),
                None => Value::Undefined,
            }),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, scope)?);
                }
                self.alloc_array(values)
            }
            Expr::Object(props) => {
                let mut obj = Object::new(Class::Plain);
                for (key, value) in props {
                    let key = self.eval(key, scope)?;
                    let key = self.to_property_key(&key);
                    let value = self.eval(value, scope)?;
                    obj.set(key, value);
                }
                self.alloc(obj)
            }
            Expr::Function(def) => self.make_closure(def, scope),
            Expr::Unary(op, operand) => self.eval_unary(*op, operand, scope),
            Expr::Update {
                increment,
                prefix,
                target,
            } => {
                let old = self.eval(target, scope)?;
                let old = self.to_number(&old);
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.assign(target, Value::Number(new), scope)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                self.binary(*op, &left, &right)
            }
            Expr::Logical(op, left, right) => {
                let left = self.eval(left, scope)?;
                let short_circuit = match op {
                    LogicalOp::And => !self.truthy(&left),
                    LogicalOp::Or => self.truthy(&left),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right, scope)
                }
            }
            Expr::Conditional(test, consequent, alternate) => {
                let test = self.eval(test, scope)?;
                if self.truthy(&test) {
                    self.eval(consequent, scope)
                } else {
                    self.eval(alternate, scope)
                }
            }
            Expr::Assign { op, target, value } => match op {
                None => {
                    let value = self.eval(value, scope)?;
                    self.assign(target, value.clone(), scope)?;
                    Ok(value)
                }
                Some(op) => self.compound_assign(*op, target, value, scope),
            },
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let object = self.eval(object, scope)?;
                if *optional && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = self.eval(property, scope)?;
                let key = self.to_property_key(&key);
                self.get_property(&object, &key)
            }
            Expr::Call { callee, args } => {
                let (this, func) = match callee.as_ref() {
                    Expr::Member {
                        object,
                        property,
                        optional,
                    } => {
                        let object = self.eval(object, scope)?;
                        if *optional && object.is_nullish() {
                            return Ok(Value::Undefined);
                        }
                        let key = self.eval(property, scope)?;
                        let key = self.to_property_key(&key);
                        let func = self.get_property(&object, &key)?;
                        (object, func)
                    }
                    other => (Value::Undefined, self.eval(other, scope)?),
                };

                let args = self.eval_args(args, scope)?;
                if !self.is_callable(&func) {
                    return Err(self.throw_error(
                        "TypeError",
                        format!("{} is not a function", describe(callee)),
                    ));
                }
                self.call(&func, this, args)
            }
            Expr::New { callee, args } => {
                let constructor = self.eval(callee, scope)?;
                let args = self.eval_args(args, scope)?;
                self.construct(&constructor, args, callee)
            }
            Expr::Sequence(exprs) => {
                let mut last = Value::Undefined;
                for expr in exprs {
                    last = self.eval(expr, scope)?;
                }
                Ok(last)
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr], scope: ScopeId) -> Eval<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, scope)?);
        }
        Ok(values)
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, scope: ScopeId) -> Eval<Value> {
        // `typeof missing` is "undefined" rather than a ReferenceError
        if let (UnaryOp::TypeOf, Expr::Ident(name)) = (op, operand) {
            if self.resolve(scope, name).is_none() {
                return Ok(Value::str("undefined"));
            }
        }

        let value = self.eval(operand, scope)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!self.truthy(&value)),
            UnaryOp::Neg => Value::Number(-self.to_number(&value)),
            UnaryOp::Plus => Value::Number(self.to_number(&value)),
            UnaryOp::BitNot => Value::Number(f64::from(!to_int32(self.to_number(&value)))),
            UnaryOp::TypeOf => Value::str(self.type_of(&value)),
            UnaryOp::Void => Value::Undefined,
        })
    }

    fn assign(&mut self, target: &Expr, value: Value, scope: ScopeId) -> Eval<()> {
        match target {
            Expr::Ident(name) => self.assign_var(scope, name, value),
            Expr::Member {
                object, property, ..
            } => {
                let object = self.eval(object, scope)?;
                let key = self.eval(property, scope)?;
                let key = self.to_property_key(&key);
                self.set_property(&object, key, value)
            }
            _ => Err(self.throw_error("SyntaxError", "Invalid left-hand side in assignment")),
        }
    }

    fn compound_assign(
        &mut self,
        op: BinaryOp,
        target: &Expr,
        value: &Expr,
        scope: ScopeId,
    ) -> Eval<Value> {
        match target {
            Expr::Ident(name) => {
                let current = self.lookup(scope, name)?;
                let rhs = self.eval(value, scope)?;
                let result = self.binary(op, &current, &rhs)?;
                self.assign_var(scope, name, result.clone())?;
                Ok(result)
            }
            Expr::Member {
                object, property, ..
            } => {
                let object = self.eval(object, scope)?;
                let key = self.eval(property, scope)?;
                let key = self.to_property_key(&key);
                let current = self.get_property(&object, &key)?;
                let rhs = self.eval(value, scope)?;
                let result = self.binary(op, &current, &rhs)?;
                self.set_property(&object, key, result.clone())?;
                Ok(result)
            }
            _ => Err(self.throw_error("SyntaxError", "Invalid left-hand side in assignment")),
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    pub(crate) fn is_callable(&self, value: &Value) -> bool {
        match value {
            Value::Native(_) => true,
            Value::Object(id) => self.heap[*id].is_function(),
            _ => false,
        }
    }

    pub(crate) fn call(&mut self, func: &Value, this: Value, args: Vec<Value>) -> Eval<Value> {
        match func {
            Value::Native(native) => self.call_native(*native, this, args),
            Value::Object(id) => {
                let Class::Function(closure) = &self.heap[*id].class else {
                    return Err(self.throw_error("TypeError", "value is not a function"));
                };
                let closure = closure.clone();
                self.call_closure(&closure, this, args)
            }
            _ => Err(self.throw_error("TypeError", "value is not a function")),
        }
    }

    fn call_closure(&mut self, closure: &Closure, this: Value, args: Vec<Value>) -> Eval<Value> {
        if self.depth >= self.limits.max_call_depth {
            return Err(Abort::Limit(ExecutionError::CallDepth(
                self.limits.max_call_depth,
            )));
        }

        let scope = self.push_scope(closure.env, true)?;
        self.depth += 1;
        let result = self.invoke(&closure.def, scope, this, args);
        self.depth -= 1;
        self.pop_scope(scope);
        result
    }

    fn invoke(
        &mut self,
        def: &FunctionDef,
        scope: ScopeId,
        this: Value,
        args: Vec<Value>,
    ) -> Eval<Value> {
        if !def.arrow {
            self.define(scope, Rc::from("this"), this, false);
        }

        let mut args = args.into_iter();
        for param in &def.params {
            let mut value = args.next().unwrap_or(Value::Undefined);
            if let (Value::Undefined, Some(default)) = (&value, &param.default) {
                value = self.eval(default, scope)?;
            }
            self.define(scope, param.name.clone(), value, true);
        }

        match &def.body {
            FunctionBody::Expr(expr) => self.eval(expr, scope),
            FunctionBody::Block(stmts) => match self.exec_statements(stmts, scope)? {
                Flow::Return(value) => Ok(value),
                _ => Ok(Value::Undefined),
            },
        }
    }

    fn construct(&mut self, constructor: &Value, args: Vec<Value>, callee: &Expr) -> Eval<Value> {
        match constructor {
            Value::Native(native @ Native::ErrorCtor(_)) => {
                self.call_native(*native, Value::Undefined, args)
            }
            Value::Object(id) => {
                let closure = match &self.heap[*id].class {
                    Class::Function(closure) if !closure.def.arrow => closure.clone(),
                    _ => {
                        return Err(self.throw_error(
                            "TypeError",
                            format!("{} is not a constructor", describe(callee)),
                        ))
                    }
                };
                let instance = self.alloc(Object::new(Class::Plain))?;
                let result = self.call_closure(&closure, instance.clone(), args)?;
                Ok(match result {
                    Value::Object(_) => result,
                    _ => instance,
                })
            }
            _ => Err(self.throw_error(
                "TypeError",
                format!("{} is not a constructor", describe(callee)),
            )),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub(crate) fn get_property(&mut self, object: &Value, key: &str) -> Eval<Value> {
        match object {
            Value::Undefined | Value::Null => {
                let shown = self.to_string(object);
                Err(self.throw_error(
                    "TypeError",
                    format!("Cannot read properties of {} (reading '{}')", shown, key),
                ))
            }
            Value::Str(s) => Ok(builtins::string_property(s, key)),
            Value::Number(_) | Value::Bool(_) => Ok(builtins::primitive_method(object, key)),
            Value::Native(_) => Ok(Value::Undefined),
            Value::Object(id) => {
                let obj = &self.heap[*id];
                if let Some(value) = obj.get(key) {
                    return Ok(value.clone());
                }
                Ok(match &obj.class {
                    Class::Array(items) => {
                        if key == "length" {
                            Value::Number(items.len() as f64)
                        } else if let Some(index) = array_index(key) {
                            items.get(index).cloned().unwrap_or(Value::Undefined)
                        } else if key == "toString" {
                            Value::Native(Native::ToString)
                        } else {
                            builtins::array_method(key)
                        }
                    }
                    Class::Function(closure) if key == "name" => {
                        Value::str(closure.def.name.as_deref().unwrap_or(""))
                    }
                    _ if key == "toString" => Value::Native(Native::ToString),
                    _ => Value::Undefined,
                })
            }
        }
    }

    pub(crate) fn set_property(&mut self, object: &Value, key: Rc<str>, value: Value) -> Eval<()> {
        let id = match object {
            Value::Object(id) => *id,
            Value::Undefined | Value::Null => {
                let shown = self.to_string(object);
                return Err(self.throw_error(
                    "TypeError",
                    format!("Cannot set properties of {} (setting '{}')", shown, key),
                ));
            }
            // Primitives silently drop writes
            _ => return Ok(()),
        };

        if let Some(items) = self.array_items(id) {
            let len = items.len();
            let new_len = if &*key == "length" {
                let n = self.to_number(&value);
                if n < 0.0 || n.fract() != 0.0 || !n.is_finite() {
                    return Err(self.throw_error("RangeError", "Invalid array length"));
                }
                Some(n as usize)
            } else {
                array_index(&key).map(|index| (index + 1).max(len))
            };

            if let Some(new_len) = new_len {
                if new_len > MAX_ARRAY_LEN {
                    return Err(self.throw_error("RangeError", "Invalid array length"));
                }
                if let Some(items) = self.array_items_mut(id) {
                    items.resize(new_len, Value::Undefined);
                    if let Some(index) = array_index(&key) {
                        items[index] = value;
                    }
                }
                return Ok(());
            }
        }

        self.heap[id].set(key, value);
        Ok(())
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    pub(crate) fn truthy(&self, value: &Value) -> bool {
        match value {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Object(_) | Value::Native(_) => true,
        }
    }

    pub(crate) fn type_of(&self, value: &Value) -> &'static str {
        match value {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Native(_) => "function",
            Value::Object(id) if self.heap[*id].is_function() => "function",
            Value::Object(_) => "object",
        }
    }

    pub(crate) fn to_number(&self, value: &Value) -> f64 {
        match value {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => string_to_number(s),
            Value::Object(id) if self.array_items(*id).is_some() => {
                string_to_number(&self.to_string(value))
            }
            Value::Object(_) | Value::Native(_) => f64::NAN,
        }
    }

    pub(crate) fn to_string(&self, value: &Value) -> Rc<str> {
        let mut seen = Vec::new();
        self.to_string_guarded(value, &mut seen)
    }

    fn to_string_guarded(&self, value: &Value, seen: &mut Vec<ObjectId>) -> Rc<str> {
        match value {
            Value::Undefined => Rc::from("undefined"),
            Value::Null => Rc::from("null"),
            Value::Bool(b) => Rc::from(if *b { "true" } else { "false" }),
            Value::Number(n) => Rc::from(number_to_string(*n).as_str()),
            Value::Str(s) => s.clone(),
            Value::Native(native) => {
                Rc::from(format!("function {}() {{ [native code] }}", native.name()).as_str())
            }
            Value::Object(id) => {
                if seen.contains(id) {
                    return Rc::from("");
                }
                let obj = &self.heap[*id];
                match &obj.class {
                    Class::Array(items) => {
                        seen.push(*id);
                        let parts: Vec<Rc<str>> = items
                            .iter()
                            .map(|item| match item {
                                Value::Undefined | Value::Null => Rc::from(""),
                                other => self.to_string_guarded(other, seen),
                            })
                            .collect();
                        seen.pop();
                        Rc::from(parts.join(",").as_str())
                    }
                    Class::Function(closure) => Rc::from(
                        format!(
                            "function {}() {{ ... }}",
                            closure.def.name.as_deref().unwrap_or("")
                        )
                        .as_str(),
                    ),
                    Class::Error => {
                        let field = |key: &str| match obj.get(key) {
                            Some(Value::Str(s)) => s.to_string(),
                            _ => String::new(),
                        };
                        let (name, message) = (field("name"), field("message"));
                        if message.is_empty() {
                            Rc::from(name.as_str())
                        } else {
                            Rc::from(format!("{}: {}", name, message).as_str())
                        }
                    }
                    Class::Plain => Rc::from("[object Object]"),
                }
            }
        }
    }

    pub(crate) fn to_property_key(&self, value: &Value) -> Rc<str> {
        self.to_string(value)
    }

    /// Objects become their string form; primitives are unchanged
    fn to_primitive(&self, value: &Value) -> Value {
        match value {
            Value::Object(_) | Value::Native(_) => Value::Str(self.to_string(value)),
            other => other.clone(),
        }
    }

    fn loose_equals(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::Number(x), Value::Str(s)) | (Value::Str(s), Value::Number(x)) => {
                *x == string_to_number(s)
            }
            (Value::Bool(_), _) => self.loose_equals(&Value::Number(self.to_number(a)), b),
            (_, Value::Bool(_)) => self.loose_equals(a, &Value::Number(self.to_number(b))),
            (Value::Object(_), Value::Object(_)) => a == b,
            (Value::Object(_), _) => self.loose_equals(&self.to_primitive(a), b),
            (_, Value::Object(_)) => self.loose_equals(a, &self.to_primitive(b)),
            _ => a == b,
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Value, right: &Value) -> Eval<Value> {
        match op {
            BinaryOp::Add => {
                let (l, r) = (self.to_primitive(left), self.to_primitive(right));
                if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
                    let (l, r) = (self.to_string(&l), self.to_string(&r));
                    self.check_string_len(l.len() + r.len())?;
                    let mut text = String::with_capacity(l.len() + r.len());
                    text.push_str(&l);
                    text.push_str(&r);
                    return Ok(Value::str(text));
                }
                return Ok(Value::Number(self.to_number(&l) + self.to_number(&r)));
            }
            BinaryOp::StrictEq => return Ok(Value::Bool(left == right)),
            BinaryOp::StrictNotEq => return Ok(Value::Bool(left != right)),
            BinaryOp::Eq => return Ok(Value::Bool(self.loose_equals(left, right))),
            BinaryOp::NotEq => return Ok(Value::Bool(!self.loose_equals(left, right))),
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
                return Ok(Value::Bool(self.compare(op, left, right)))
            }
            _ => {}
        }

        let (a, b) = (self.to_number(left), self.to_number(right));
        Ok(match op {
            BinaryOp::Sub => Value::Number(a - b),
            BinaryOp::Mul => Value::Number(a * b),
            BinaryOp::Div => Value::Number(a / b),
            BinaryOp::Rem => Value::Number(a % b),
            BinaryOp::Pow => Value::Number(a.powf(b)),
            BinaryOp::BitAnd => bitwise(a, b, |x, y| x & y),
            BinaryOp::BitOr => bitwise(a, b, |x, y| x | y),
            BinaryOp::BitXor => bitwise(a, b, |x, y| x ^ y),
            BinaryOp::Shl => bitwise(a, b, |x, y| x.wrapping_shl(y as u32 & 31)),
            BinaryOp::Shr => bitwise(a, b, |x, y| x.wrapping_shr(y as u32 & 31)),
            BinaryOp::UShr => {
                Value::Number(f64::from(to_uint32(a) >> (to_uint32(b) & 31)))
            }
            _ => Value::Undefined,
        })
    }

    fn compare(&self, op: BinaryOp, left: &Value, right: &Value) -> bool {
        let (l, r) = (self.to_primitive(left), self.to_primitive(right));
        let ordering = match (&l, &r) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => self.to_number(&l).partial_cmp(&self.to_number(&r)),
        };
        let Some(ordering) = ordering else {
            return false;
        };
        match op {
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::Gt => ordering.is_gt(),
            BinaryOp::LtEq => ordering.is_le(),
            BinaryOp::GtEq => ordering.is_ge(),
            _ => false,
        }
    }
}

fn bitwise(a: f64, b: f64, f: impl Fn(i32, i32) -> i32) -> Value {
    Value::Number(f64::from(f(to_int32(a), to_int32(b))))
}

/// Short source-like rendering of a callee for error messages
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.to_string(),
        Expr::This => "this".to_string(),
        Expr::Member {
            object, property, ..
        } => match property.as_ref() {
            Expr::Str(name) => format!("{}.{}", describe(object), name),
            _ => format!("{}[...]", describe(object)),
        },
        Expr::Call { callee, .. } => format!("{}(...)", describe(callee)),
        Expr::Number(n) => number_to_string(*n),
        Expr::Str(s) => format!("\"{}\"", s),
        Expr::Bool(b) => b.to_string(),
        Expr::Null => "null".to_string(),
        Expr::Undefined => "undefined".to_string(),
        Expr::Array(_) => "[...]".to_string(),
        Expr::Object(_) => "{...}".to_string(),
        Expr::Function(def) => def.name.as_deref().unwrap_or("(anonymous)").to_string(),
        _ => "(intermediate value)".to_string(),
    }
}
