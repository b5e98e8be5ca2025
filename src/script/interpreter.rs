use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::SandboxLimits;
use super::ast::{
    ArrayItem, AssignOp, BinaryOp, DeclKind, Expr, Function, FunctionBody, Literal, LogicalOp,
    MemberProperty, PropertyItem, PropertyKey, Stmt, TemplateChunk, UnaryOp,
};
use super::builtins;
use super::error::{ScriptError, ScriptResult};
use super::value::{NativeFunction, ScriptValue, VALUE_SLOT_BYTES, format_number};

pub(crate) type Args = SmallVec<[ScriptValue; 4]>;

const PROGRAM_FRAME: usize = 1;

pub(crate) enum Flow {
    Normal,
    Return(ScriptValue),
}

/// Tree-walking evaluator over a fixed set of injected globals.
///
/// Frame 0 holds the injected bindings, frame 1 the program's own top-level
/// declarations; nothing else is reachable by name.
pub(crate) struct Interpreter {
    scopes: Vec<IndexMap<String, ScriptValue>>,
    function_frames: Vec<usize>,
    steps: usize,
    depth: usize,
    limits: SandboxLimits,
}

impl Interpreter {
    pub(crate) fn new(globals: IndexMap<String, ScriptValue>, limits: SandboxLimits) -> Self {
        Self {
            scopes: vec![globals, IndexMap::new()],
            function_frames: vec![PROGRAM_FRAME],
            steps: 0,
            depth: 0,
            limits,
        }
    }

    pub(crate) fn declare_program_binding(&mut self, name: &str, value: ScriptValue) {
        self.scopes[PROGRAM_FRAME].insert(name.to_owned(), value);
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&ScriptValue> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Runs top-level statements, returning the explicit `return` value (if any)
    /// and the value of the last expression statement.
    pub(crate) fn run_program(
        &mut self,
        body: &[Stmt],
    ) -> ScriptResult<(Option<ScriptValue>, Option<ScriptValue>)> {
        self.hoist_functions(body);
        let mut completion = None;
        for stmt in body {
            if let Stmt::Expr(expr) = stmt {
                completion = Some(self.eval(expr)?);
                continue;
            }
            if let Flow::Return(value) = self.exec(stmt)? {
                return Ok((Some(value), completion));
            }
        }
        Ok((None, completion))
    }

    fn tick(&mut self) -> ScriptResult<()> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(ScriptError::StepLimit(self.limits.max_steps));
        }
        Ok(())
    }

    fn enter(&mut self) -> ScriptResult<()> {
        self.depth += 1;
        if self.depth > self.limits.max_depth {
            return Err(ScriptError::DepthLimit(self.limits.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Fails once a value being built would exceed `max_value_bytes`.
    pub(crate) fn check_size(&self, size: usize) -> ScriptResult<()> {
        if size > self.limits.max_value_bytes {
            return Err(ScriptError::SizeLimit(self.limits.max_value_bytes));
        }
        Ok(())
    }

    /// Approximate size of `value`, failing when it alone exceeds the budget.
    pub(crate) fn measure(&self, value: &ScriptValue) -> ScriptResult<usize> {
        let size = value.approx_size(self.limits.max_value_bytes);
        self.check_size(size)?;
        Ok(size)
    }

    fn bounded(&self, value: ScriptValue) -> ScriptResult<ScriptValue> {
        if let ScriptValue::String(s) = &value {
            self.check_size(s.len())?;
        }
        Ok(value)
    }

    fn hoist_functions(&mut self, body: &[Stmt]) {
        for stmt in body {
            if let Stmt::Function { name, function } = stmt {
                let frame = self.scopes.len() - 1;
                self.scopes[frame].insert(name.clone(), ScriptValue::Function(Rc::clone(function)));
            }
        }
    }

    fn exec_block(&mut self, body: &[Stmt]) -> ScriptResult<Flow> {
        self.scopes.push(IndexMap::new());
        self.hoist_functions(body);
        let mut flow = Ok(Flow::Normal);
        for stmt in body {
            match self.exec(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    flow = other;
                    break;
                }
            }
        }
        self.scopes.pop();
        flow
    }

    fn exec(&mut self, stmt: &Stmt) -> ScriptResult<Flow> {
        self.tick()?;
        match stmt {
            Stmt::Empty | Stmt::Function { .. } => Ok(Flow::Normal),
            Stmt::Declare { kind, declarations } => {
                for (name, init) in declarations {
                    let value = match init {
                        Some(expr) => self.eval(expr)?,
                        None => ScriptValue::Undefined,
                    };
                    let frame = match kind {
                        DeclKind::Var => *self.function_frames.last().unwrap_or(&PROGRAM_FRAME),
                        DeclKind::Let | DeclKind::Const => self.scopes.len() - 1,
                    };
                    self.scopes[frame].insert(name.clone(), value);
                }
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => ScriptValue::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.exec(consequent)
                } else if let Some(alternate) = alternate {
                    self.exec(alternate)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                self.scopes.push(IndexMap::new());
                let flow = self.exec_for(init.as_deref(), test.as_ref(), update.as_ref(), body);
                self.scopes.pop();
                flow
            }
            Stmt::Block(body) => self.exec_block(body),
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) -> ScriptResult<Flow> {
        if let Some(init) = init {
            self.exec(init)?;
        }
        loop {
            self.tick()?;
            if let Some(test) = test {
                if !self.eval(test)?.is_truthy() {
                    return Ok(Flow::Normal);
                }
            }
            if let Flow::Return(value) = self.exec(body)? {
                return Ok(Flow::Return(value));
            }
            if let Some(update) = update {
                self.eval(update)?;
            }
        }
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> ScriptResult<ScriptValue> {
        Ok(self.eval_chain(expr)?.unwrap_or(ScriptValue::Undefined))
    }

    /// `None` means an optional chain short-circuited on a nullish link.
    fn eval_chain(&mut self, expr: &Expr) -> ScriptResult<Option<ScriptValue>> {
        self.tick()?;
        self.enter()?;
        let result = self.eval_inner(expr);
        self.leave();
        result
    }

    fn eval_inner(&mut self, expr: &Expr) -> ScriptResult<Option<ScriptValue>> {
        let value = match expr {
            Expr::Literal(literal) => match literal {
                Literal::Undefined => ScriptValue::Undefined,
                Literal::Null => ScriptValue::Null,
                Literal::Bool(b) => ScriptValue::Bool(*b),
                Literal::Number(n) => ScriptValue::Number(*n),
                Literal::Exact(n) => ScriptValue::Exact(n.clone()),
                Literal::Str(s) => ScriptValue::String(s.clone()),
            },
            Expr::Template(chunks) => {
                let mut out = String::new();
                for chunk in chunks {
                    match chunk {
                        TemplateChunk::Text(text) => out.push_str(text),
                        TemplateChunk::Expr(expr) => out.push_str(&self.eval(expr)?.to_string()),
                    }
                    self.check_size(out.len())?;
                }
                ScriptValue::String(out)
            }
            Expr::Ident(name, _) => self
                .lookup(name)
                .cloned()
                .ok_or_else(|| ScriptError::UnknownBinding(name.clone()))?,
            Expr::Array(items) => ScriptValue::Array(self.eval_items(items)?.into_vec()),
            Expr::Object(properties) => self.eval_object(properties)?,
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(receiver) = self.eval_chain(object)? else {
                    return Ok(None);
                };
                if *optional && receiver.is_nullish() {
                    return Ok(None);
                }
                let key = self.property_key(property)?;
                builtins::get_member(&receiver, &key)?
            }
            Expr::Call {
                callee,
                args,
                optional,
            } => return self.eval_call(callee, args, *optional),
            Expr::New { callee, args } => {
                let constructor = self.eval(callee)?;
                let args = self.eval_items(args)?;
                match constructor {
                    ScriptValue::Native(native) => call_native(native, &args),
                    _ => {
                        return Err(ScriptError::runtime(
                            "only charting namespace constructors can be instantiated",
                        ));
                    }
                }
            }
            Expr::Unary { op, operand } => self.eval_unary(*op, operand)?,
            Expr::Update {
                increment,
                prefix,
                target,
            } => {
                let old = self.eval(target)?.to_number();
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.assign(target, ScriptValue::Number(new))?;
                ScriptValue::Number(if *prefix { new } else { old })
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.bounded(binary(*op, &left, &right))?
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    left
                } else {
                    self.eval(right)?
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(consequent)?
                } else {
                    self.eval(alternate)?
                }
            }
            Expr::Function(function) => ScriptValue::Function(Rc::clone(function)),
            Expr::Assign { op, target, value } => {
                let value = if *op == AssignOp::Assign {
                    self.eval(value)?
                } else {
                    let current = self.eval(target)?;
                    let rhs = self.eval(value)?;
                    let binary_op = match op {
                        AssignOp::Add => BinaryOp::Add,
                        AssignOp::Sub => BinaryOp::Sub,
                        AssignOp::Mul => BinaryOp::Mul,
                        _ => BinaryOp::Div,
                    };
                    self.bounded(binary(binary_op, &current, &rhs))?
                };
                self.assign(target, value.clone())?;
                value
            }
        };
        Ok(Some(value))
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> ScriptResult<ScriptValue> {
        if op == UnaryOp::TypeOf {
            if let Expr::Ident(name, _) = operand {
                if self.lookup(name).is_none() {
                    return Ok(ScriptValue::String("undefined".to_owned()));
                }
            }
        }
        let value = self.eval(operand)?;
        Ok(match op {
            UnaryOp::Not => ScriptValue::Bool(!value.is_truthy()),
            UnaryOp::Negate => value.negate(),
            UnaryOp::Plus => ScriptValue::Number(value.to_number()),
            UnaryOp::TypeOf => ScriptValue::String(value.type_of().to_owned()),
        })
    }

    fn eval_items(&mut self, items: &[ArrayItem]) -> ScriptResult<Args> {
        let mut out = Args::new();
        let mut size = 0usize;
        for item in items {
            match item {
                ArrayItem::Item(expr) => {
                    let value = self.eval(expr)?;
                    size = size.saturating_add(self.measure(&value)?);
                    self.check_size(size)?;
                    out.push(value);
                }
                ArrayItem::Hole => out.push(ScriptValue::Undefined),
                ArrayItem::Spread(expr) => match self.eval(expr)? {
                    ScriptValue::Array(values) => {
                        for value in &values {
                            size = size.saturating_add(self.measure(value)?);
                            self.check_size(size)?;
                        }
                        out.extend(values);
                    }
                    ScriptValue::String(s) => {
                        let chars = s.chars().count();
                        size = size.saturating_add(chars.saturating_mul(VALUE_SLOT_BYTES));
                        self.check_size(size)?;
                        out.extend(s.chars().map(|c| ScriptValue::String(c.to_string())));
                    }
                    other => {
                        return Err(ScriptError::runtime(format!(
                            "cannot spread non-iterable {}",
                            other.type_of()
                        )));
                    }
                },
            }
        }
        Ok(out)
    }

    fn eval_object(&mut self, properties: &[PropertyItem]) -> ScriptResult<ScriptValue> {
        let mut map = IndexMap::with_capacity(properties.len());
        let mut size = 0usize;
        for property in properties {
            match property {
                PropertyItem::KeyValue(key, value) => {
                    let key = match key {
                        PropertyKey::Named(name) => name.clone(),
                        PropertyKey::Computed(expr) => property_name(&self.eval(expr)?),
                    };
                    let value = self.eval(value)?;
                    size = size.saturating_add(key.len() + self.measure(&value)?);
                    self.check_size(size)?;
                    map.insert(key, value);
                }
                PropertyItem::Spread(expr) => {
                    let source = self.eval(expr)?;
                    size = size.saturating_add(self.measure(&source)?);
                    self.check_size(size)?;
                    match source {
                        ScriptValue::Object(source) => map.extend(source),
                        ScriptValue::Array(items) => {
                            for (index, item) in items.into_iter().enumerate() {
                                map.insert(index.to_string(), item);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(ScriptValue::Object(map))
    }

    fn property_key(&mut self, property: &MemberProperty) -> ScriptResult<String> {
        match property {
            MemberProperty::Named(name) => Ok(name.clone()),
            MemberProperty::Computed(expr) => Ok(property_name(&self.eval(expr)?)),
        }
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[ArrayItem],
        optional: bool,
    ) -> ScriptResult<Option<ScriptValue>> {
        if let Expr::Member {
            object,
            property,
            optional: optional_member,
        } = callee
        {
            let Some(receiver) = self.eval_chain(object)? else {
                return Ok(None);
            };
            if *optional_member && receiver.is_nullish() {
                return Ok(None);
            }
            let method = self.property_key(property)?;
            let args = self.eval_items(args)?;

            if builtins::is_mutating_method(&receiver, &method) {
                let (updated, result) = builtins::call_mutating(self, receiver, &method, &args)?;
                self.measure(&updated)?;
                if let Some(path) = self.place_path(object)? {
                    self.write_path(&path, updated)?;
                }
                return Ok(Some(result));
            }
            if let Some(result) = builtins::call_method(self, &receiver, &method, &args)? {
                return self.bounded(result).map(Some);
            }
            let function = builtins::get_member(&receiver, &method)?;
            if optional && function.is_nullish() {
                return Ok(None);
            }
            return self.call_value(&function, &args).map(Some);
        }

        let Some(function) = self.eval_chain(callee)? else {
            return Ok(None);
        };
        if optional && function.is_nullish() {
            return Ok(None);
        }
        let args = self.eval_items(args)?;
        self.call_value(&function, &args).map(Some)
    }

    pub(crate) fn call_value(
        &mut self,
        function: &ScriptValue,
        args: &[ScriptValue],
    ) -> ScriptResult<ScriptValue> {
        match function {
            ScriptValue::Function(function) => self.call_function(function, args),
            ScriptValue::Native(native) => Ok(call_native(*native, args)),
            other => Err(ScriptError::runtime(format!(
                "{} is not a function",
                other.type_of()
            ))),
        }
    }

    fn call_function(
        &mut self,
        function: &Function,
        args: &[ScriptValue],
    ) -> ScriptResult<ScriptValue> {
        self.enter()?;
        let mut frame = IndexMap::with_capacity(function.params.len());
        for (index, param) in function.params.iter().enumerate() {
            let value = args.get(index).cloned().unwrap_or(ScriptValue::Undefined);
            frame.insert(param.clone(), value);
        }
        self.scopes.push(frame);
        self.function_frames.push(self.scopes.len() - 1);

        let result = match &function.body {
            FunctionBody::Expr(expr) => self.eval(expr),
            FunctionBody::Block(body) => {
                self.hoist_functions(body);
                let mut result = Ok(ScriptValue::Undefined);
                for stmt in body {
                    match self.exec(stmt) {
                        Ok(Flow::Normal) => {}
                        Ok(Flow::Return(value)) => {
                            result = Ok(value);
                            break;
                        }
                        Err(err) => {
                            result = Err(err);
                            break;
                        }
                    }
                }
                result
            }
        };

        self.function_frames.pop();
        self.scopes.pop();
        self.leave();
        result
    }

    fn assign(&mut self, target: &Expr, value: ScriptValue) -> ScriptResult<()> {
        if let Expr::Ident(name, _) = target {
            for scope in self.scopes.iter_mut().rev() {
                if let Some(slot) = scope.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
            }
            // Undeclared assignment lands in the program frame, never in globals.
            self.scopes[PROGRAM_FRAME].insert(name.clone(), value);
            return Ok(());
        }
        let path = self
            .place_path(target)?
            .ok_or_else(|| ScriptError::runtime("unsupported assignment target"))?;
        self.write_path(&path, value)
    }

    /// Resolves `a.b[0].c` into `("a", ["b", "0", "c"])`; `None` when the chain
    /// is not rooted at a variable.
    fn place_path(&mut self, expr: &Expr) -> ScriptResult<Option<(String, Vec<String>)>> {
        match expr {
            Expr::Ident(name, _) => Ok(Some((name.clone(), Vec::new()))),
            Expr::Member {
                object,
                property,
                optional: false,
            } => {
                let Some((root, mut keys)) = self.place_path(object)? else {
                    return Ok(None);
                };
                keys.push(self.property_key(property)?);
                Ok(Some((root, keys)))
            }
            _ => Ok(None),
        }
    }

    fn write_path(&mut self, path: &(String, Vec<String>), value: ScriptValue) -> ScriptResult<()> {
        let (root, keys) = path;
        let Some((last, parents)) = keys.split_last() else {
            return self.assign(&Expr::Ident(root.clone(), Default::default()), value);
        };
        self.write_member(root, parents, last, value)?;
        match self.lookup(root) {
            Some(updated) => self.measure(updated).map(|_| ()),
            None => Ok(()),
        }
    }

    fn write_member(
        &mut self,
        root: &str,
        parents: &[String],
        last: &str,
        value: ScriptValue,
    ) -> ScriptResult<()> {
        let max_len = self.limits.max_value_bytes / VALUE_SLOT_BYTES;
        let mut slot = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(root))
            .ok_or_else(|| ScriptError::UnknownBinding(root.to_owned()))?;
        for key in parents {
            slot = child_mut(slot, key)?;
        }
        match slot {
            ScriptValue::Object(map) => {
                map.insert(last.to_owned(), value);
                Ok(())
            }
            ScriptValue::Array(items) => {
                let index = last.parse::<usize>().map_err(|_| {
                    ScriptError::runtime(format!("cannot set property `{last}` on an array"))
                })?;
                if index >= max_len {
                    return Err(ScriptError::SizeLimit(max_len * VALUE_SLOT_BYTES));
                }
                if index >= items.len() {
                    items.resize(index + 1, ScriptValue::Undefined);
                }
                items[index] = value;
                Ok(())
            }
            other => Err(ScriptError::runtime(format!(
                "cannot set property `{last}` on {}",
                other.type_of()
            ))),
        }
    }
}

fn child_mut<'v>(slot: &'v mut ScriptValue, key: &str) -> ScriptResult<&'v mut ScriptValue> {
    match slot {
        ScriptValue::Object(map) => map.get_mut(key).ok_or_else(|| {
            ScriptError::runtime(format!(
                "cannot set properties of undefined (reading `{key}`)"
            ))
        }),
        ScriptValue::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get_mut(index))
            .ok_or_else(|| ScriptError::runtime(format!("array index `{key}` is out of range"))),
        other => Err(ScriptError::runtime(format!(
            "cannot set properties of {} (reading `{key}`)",
            other.type_of()
        ))),
    }
}

pub(crate) fn property_name(value: &ScriptValue) -> String {
    match value {
        ScriptValue::Number(n) => format_number(*n),
        other => other.to_string(),
    }
}

fn call_native(native: NativeFunction, args: &[ScriptValue]) -> ScriptValue {
    let arg = |index: usize| args.get(index).cloned().unwrap_or(ScriptValue::Undefined);
    let mut gradient = IndexMap::new();
    match native {
        NativeFunction::LinearGradient => {
            gradient.insert("type".to_owned(), ScriptValue::String("linear".to_owned()));
            gradient.insert("x".to_owned(), arg(0));
            gradient.insert("y".to_owned(), arg(1));
            gradient.insert("x2".to_owned(), arg(2));
            gradient.insert("y2".to_owned(), arg(3));
            gradient.insert("colorStops".to_owned(), arg(4));
            gradient.insert("global".to_owned(), ScriptValue::Bool(arg(5).is_truthy()));
        }
        NativeFunction::RadialGradient => {
            gradient.insert("type".to_owned(), ScriptValue::String("radial".to_owned()));
            gradient.insert("x".to_owned(), arg(0));
            gradient.insert("y".to_owned(), arg(1));
            gradient.insert("r".to_owned(), arg(2));
            gradient.insert("colorStops".to_owned(), arg(3));
            gradient.insert("global".to_owned(), ScriptValue::Bool(arg(4).is_truthy()));
        }
    }
    ScriptValue::Object(gradient)
}

fn binary(op: BinaryOp, left: &ScriptValue, right: &ScriptValue) -> ScriptValue {
    use std::cmp::Ordering;

    let compare = |left: &ScriptValue, right: &ScriptValue| -> Option<Ordering> {
        match (left, right) {
            (ScriptValue::String(a), ScriptValue::String(b)) => Some(a.cmp(b)),
            _ => left.to_number().partial_cmp(&right.to_number()),
        }
    };

    match op {
        BinaryOp::Add => {
            let stringy = |v: &ScriptValue| {
                matches!(
                    v,
                    ScriptValue::String(_) | ScriptValue::Array(_) | ScriptValue::Object(_)
                )
            };
            if stringy(left) || stringy(right) {
                ScriptValue::String(format!("{left}{right}"))
            } else {
                ScriptValue::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => ScriptValue::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => ScriptValue::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => ScriptValue::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => ScriptValue::Number(left.to_number() % right.to_number()),
        BinaryOp::Eq => ScriptValue::Bool(left.loose_equals(right)),
        BinaryOp::NotEq => ScriptValue::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => ScriptValue::Bool(left.strict_equals(right)),
        BinaryOp::StrictNotEq => ScriptValue::Bool(!left.strict_equals(right)),
        BinaryOp::Lt => ScriptValue::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::Gt => ScriptValue::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::LtEq => ScriptValue::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::GtEq => ScriptValue::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
    }
}
