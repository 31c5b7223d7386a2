use std::{collections::HashMap, sync::Arc};

use crate::{
    ast::{AssignOperator, BlockStatement, Expression, FunctionLiteral, Program, Statement},
    config::Config,
    error::{Error, RuntimeError},
    interpreter::{
        environment::{Environment, FrameId},
        evaluator::{
            binary,
            function::core::install_builtins,
            trace::{ErrorTrace, SourceMap},
        },
        host::Host,
        parser::parse,
        process::{Process, table},
        token::Position,
        value::{
            core::{NULL, Value},
            function::Function,
        },
    },
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// `RuntimeError` describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Evaluates a sub-expression result and returns early if it is a
/// `return`, `break` or `continue` marker.
macro_rules! operand {
    ($value:expr) => {
        match $value {
            value if value.is_control() => return Ok(value),
            value => value,
        }
    };
}

pub(crate) use operand;

/// Stores the runtime state of one process.
///
/// ## Usage
///
/// An `Evaluator` is created once per process and reused for every program
/// it runs. The frame arena, the error trace and the module cache are
/// private to it; spawning a process [`fork`](Self::fork)s a copy.
///
/// Frames are arranged as follows: the *core* frame holds the builtins and
/// the `math`/`proc` namespaces, the *globals* frame encloses it and holds
/// top-level bindings, and every module frame encloses the core frame too.
pub struct Evaluator {
    pub(crate) host:       Host,
    pub(crate) config:     Arc<Config>,
    pub(crate) env:        Environment,
    pub(crate) core:       FrameId,
    pub(crate) globals:    FrameId,
    pub(crate) process:    Arc<Process>,
    pub(crate) trace:      ErrorTrace,
    pub(crate) sources:    SourceMap,
    pub(crate) modules:    HashMap<String, Value>,
    pub(crate) importing:  Vec<String>,
    pub(crate) call_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        let config = Config::from_env();
        Self::new(Host::new(&config), config)
    }
}

impl Evaluator {
    /// Creates an evaluator with a fresh arena and a registered process.
    ///
    /// The first evaluator seals the builtin registry: later calls to
    /// `register_builtin` fail.
    #[must_use]
    pub fn new(host: Host, config: Config) -> Self {
        let mut env = Environment::new();
        let core = env.push(None);
        install_builtins(&mut env, core);
        let globals = env.push(Some(core));
        env.pin(globals);

        let process = table::register(&config.node_name);
        tracing::debug!(process = %process.key(), "evaluator started");

        Self { host,
               config: Arc::new(config),
               env,
               core,
               globals,
               process,
               trace: ErrorTrace::default(),
               sources: SourceMap::new(),
               modules: HashMap::new(),
               importing: Vec::new(),
               call_depth: 0 }
    }

    /// Creates the evaluator of a spawned process.
    ///
    /// The copy works on a snapshot of the frame arena, so every closure of
    /// the parent stays callable while no frame is shared. It registers its
    /// own process record.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self { host:       self.host.clone(),
               config:     Arc::clone(&self.config),
               env:        self.env.snapshot(),
               core:       self.core,
               globals:    self.globals,
               process:    table::register(&self.config.node_name),
               trace:      ErrorTrace::default(),
               sources:    self.sources.clone(),
               modules:    self.modules.clone(),
               importing:  Vec::new(),
               call_depth: 0, }
    }

    /// The host capabilities.
    #[must_use]
    pub const fn host(&self) -> &Host {
        &self.host
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The process this evaluator runs.
    #[must_use]
    pub const fn process(&self) -> &Arc<Process> {
        &self.process
    }

    /// The text of every file evaluated so far, for rendering errors.
    #[must_use]
    pub const fn sources(&self) -> &SourceMap {
        &self.sources
    }

    /// Looks up a top-level binding.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<Value> {
        self.env.get(self.globals, name)
    }

    /// Parses and evaluates `source` in the global frame and returns the
    /// value of its last statement.
    ///
    /// # Parameters
    /// - `source`: Program text.
    /// - `file`: Name used in positions and diagnostics.
    ///
    /// # Returns
    /// The final value, all parse errors, or the runtime error that nothing
    /// caught.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::evaluator::core::Evaluator;
    ///
    /// let mut evaluator = Evaluator::default();
    /// evaluator.run("var x = 40", "main").unwrap();
    /// let value = evaluator.run("x + 2", "main").unwrap();
    /// assert_eq!(value.as_i64(), Some(42));
    /// ```
    pub fn run(&mut self, source: &str, file: &str) -> Result<Value, Error> {
        self.sources.insert(file, source);
        let program = parse(source, file).map_err(Error::Parse)?;
        Ok(self.eval_program(&program)?)
    }

    /// Evaluates a parsed program in the global frame.
    ///
    /// A `return`, `break` or `continue` that reaches the top level is a
    /// `ControlFlowError`.
    pub fn eval_program(&mut self, program: &Program) -> EvalResult<Value> {
        tracing::trace!(statements = program.statements.len(), "eval program");
        let globals = self.globals;
        let mut result = NULL;
        for statement in &program.statements {
            let value = self.eval_statement(statement, globals)?;
            if value.is_control() {
                let error = stray_marker(&value);
                return Err(self.trace_error(error, &statement.token().position));
            }
            result = value;
        }
        self.env.collect();
        Ok(result)
    }

    /// Evaluates statements in order in `frame`.
    ///
    /// # Returns
    /// The value of the last statement, or the first control-flow marker
    /// produced, which skips the remaining statements.
    pub(crate) fn eval_statements(&mut self,
                                  statements: &[Statement],
                                  frame: FrameId)
                                  -> EvalResult<Value> {
        let mut result = NULL;
        for statement in statements {
            result = operand!(self.eval_statement(statement, frame)?);
        }
        Ok(result)
    }

    /// Evaluates a block, in a fresh frame if it declares bindings.
    ///
    /// # Parameters
    /// - `block`: Block to evaluate.
    /// - `frame`: Enclosing frame.
    ///
    /// # Returns
    /// The value of the block's last statement, or a control-flow marker.
    pub fn eval_block(&mut self, block: &BlockStatement, frame: FrameId) -> EvalResult<Value> {
        if !block.declares_bindings() {
            return self.eval_statements(&block.statements, frame);
        }
        let scope = self.env.push(Some(frame));
        let result = self.eval_statements(&block.statements, scope);
        self.env.release(scope);
        result
    }

    /// Evaluates a single statement in `frame`.
    ///
    /// Declarations evaluate to `null`; `return`, `break` and `continue`
    /// evaluate to their markers.
    pub fn eval_statement(&mut self, statement: &Statement, frame: FrameId) -> EvalResult<Value> {
        self.trace.enter(&statement.token().position);
        let result = self.dispatch_statement(statement, frame);
        let result = result.map_err(|e| self.trace.attach(e, self.config.trace_depth));
        self.trace.leave();
        result
    }

    fn dispatch_statement(&mut self, statement: &Statement, frame: FrameId) -> EvalResult<Value> {
        match statement {
            Statement::Var { name,
                             operator,
                             value,
                             .. } => {
                let value = operand!(self.eval_expression(value, frame)?);
                self.eval_var(name, *operator, value, frame)?;
                Ok(NULL)
            },
            Statement::Val { name, value, .. } => {
                let value = operand!(self.eval_expression(value, frame)?);
                self.env.declare(frame, name, value)?;
                self.env.mark_immutable(frame, name);
                Ok(NULL)
            },
            Statement::Function { function, .. } => {
                let value = self.make_function(function, frame);
                if let Some(name) = &function.name {
                    self.env.declare(frame, name, value)?;
                }
                Ok(NULL)
            },
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expression) => operand!(self.eval_expression(expression, frame)?),
                    None => NULL,
                };
                Ok(Value::Return(Box::new(value)))
            },
            Statement::Break { .. } => Ok(Value::Break),
            Statement::Continue { .. } => Ok(Value::Continue),
            Statement::Expression { expression, .. } => self.eval_expression(expression, frame),
            Statement::Block(block) => self.eval_block(block, frame),
            Statement::Import { path, .. } => self.eval_import(path, frame),
        }
    }

    /// Binds `name` for a `var` statement, applying a compound operator
    /// against the current value when one is given.
    fn eval_var(&mut self,
                name: &str,
                operator: AssignOperator,
                value: Value,
                frame: FrameId)
                -> EvalResult<()> {
        match operator {
            AssignOperator::Assign => self.env.declare(frame, name, value),
            AssignOperator::Compound(op) => {
                let current = self.env
                                  .get(frame, name)
                                  .ok_or_else(|| RuntimeError::name(format!("identifier not found: {name}")))?;
                let updated = binary::core::apply(op, &current, &value)?;
                self.env.set(frame, name, updated)
            },
        }
    }

    /// Evaluates an expression and returns the resulting value.
    ///
    /// This is the main entry point for expression evaluation. The position
    /// of the expression is pushed on the error trace while it runs; an error
    /// raised inside gets the innermost positions attached.
    ///
    /// # Parameters
    /// - `expression`: Expression to evaluate.
    /// - `frame`: Frame names are resolved in.
    ///
    /// # Returns
    /// The value, or a control-flow marker produced by a nested block.
    pub fn eval_expression(&mut self, expression: &Expression, frame: FrameId) -> EvalResult<Value> {
        self.trace.enter(&expression.token().position);
        let result = self.dispatch_expression(expression, frame);
        let result = result.map_err(|e| self.trace.attach(e, self.config.trace_depth));
        self.trace.leave();
        result
    }

    fn dispatch_expression(&mut self, expression: &Expression, frame: FrameId) -> EvalResult<Value> {
        match expression {
            Expression::Identifier { name, .. } => {
                self.env
                    .get(frame, name)
                    .ok_or_else(|| RuntimeError::name(format!("identifier not found: {name}")))
            },
            Expression::Null { .. }
            | Expression::Boolean { .. }
            | Expression::Integer { .. }
            | Expression::BigInteger { .. }
            | Expression::Float { .. }
            | Expression::BigFloat { .. }
            | Expression::Hex { .. }
            | Expression::Octal { .. }
            | Expression::Binary { .. }
            | Expression::UInteger { .. }
            | Expression::Regex { .. } => Ok(Self::eval_scalar_literal(expression)),
            Expression::String { token, parts } => self.eval_string(&token.literal, parts, frame),
            Expression::ExecString { command, .. } => Self::eval_exec_string(command),
            Expression::List { elements, .. } => self.eval_list_literal(elements, frame),
            Expression::Map { entries, .. } => self.eval_map_literal(entries, frame),
            Expression::Set { elements, .. } => self.eval_set_literal(elements, frame),
            Expression::Struct { fields, .. } => self.eval_struct_literal(fields, frame),
            Expression::ListComp { element, clause, .. } => {
                self.eval_list_comprehension(element, clause, frame)
            },
            Expression::SetComp { element, clause, .. } => {
                self.eval_set_comprehension(element, clause, frame)
            },
            Expression::MapComp { key,
                                  value,
                                  clause,
                                  .. } => self.eval_map_comprehension(key, value, clause, frame),
            Expression::Function(function) => Ok(self.make_function(function, frame)),
            Expression::Prefix { operator, right, .. } => self.eval_prefix(*operator, right, frame),
            Expression::Infix { left,
                                operator,
                                right,
                                .. } => self.eval_infix(left, *operator, right, frame),
            Expression::If { condition,
                             consequence,
                             alternative,
                             .. } => self.eval_if(condition, consequence, alternative.as_ref(), frame),
            Expression::Match { subject, arms, .. } => self.eval_match(subject.as_deref(), arms, frame),
            Expression::Call { token,
                               function,
                               arguments,
                               named, } => self.eval_call(token, function, arguments, named, frame),
            Expression::Index { left, index, .. } => self.eval_index(left, index, frame),
            Expression::For { condition, body, .. } => self.eval_for(condition, body, frame),
            Expression::ForIn { bindings,
                                iterable,
                                body,
                                .. } => self.eval_for_in(bindings, iterable, body, frame),
            Expression::Assign { target,
                                 operator,
                                 value,
                                 .. } => self.eval_assign(target, *operator, value, frame),
            Expression::Eval { source, .. } => self.eval_source(source, frame),
            Expression::Try { body,
                              catch,
                              finally,
                              .. } => self.eval_try(body, catch.as_ref(), finally.as_ref(), frame),
        }
    }

    /// Creates a closure over `frame`.
    ///
    /// The frame outlives the call that created it for as long as the
    /// closure stays reachable.
    pub(crate) fn make_function(&mut self, literal: &Arc<FunctionLiteral>, frame: FrameId) -> Value {
        let function = Arc::new(Function { literal: Arc::clone(literal),
                                           env:     frame,
                                           arena:   self.env.id(), });
        self.env.capture(frame, &function);
        Value::Function(function)
    }

    /// Attaches a trace made of `position` alone, for errors raised outside
    /// any expression.
    fn trace_error(&mut self, error: RuntimeError, position: &Position) -> RuntimeError {
        self.trace.enter(position);
        let error = self.trace.attach(error, self.config.trace_depth);
        self.trace.leave();
        error
    }
}

impl Drop for Evaluator {
    fn drop(&mut self) {
        table::remove(self.process.key());
        tracing::debug!(process = %self.process.key(), "evaluator finished");
    }
}

/// The error for a control-flow marker that escaped its construct.
pub(crate) fn stray_marker(marker: &Value) -> RuntimeError {
    RuntimeError::control_flow(match marker {
                                   Value::Break => "'break' outside a loop",
                                   Value::Continue => "'continue' outside a loop",
                                   _ => "'return' outside a function",
                               })
}
