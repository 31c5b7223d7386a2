use crate::{
    ast::{Expression, FunctionLiteral},
    error::RuntimeError,
    interpreter::{
        environment::FrameId,
        evaluator::core::{EvalResult, Evaluator, operand, stray_marker},
        token::Token,
        value::{
            core::Value,
            function::{Arguments, Function},
        },
    },
};

impl Evaluator {
    /// Evaluates a call expression.
    ///
    /// The callee is evaluated first, then the positional arguments and then
    /// the named arguments, each left to right.
    ///
    /// # Errors
    /// Returns a `NameError` when a builtin that mutates its first argument
    /// is handed an immutable binding, plus every error of
    /// [`call_value`](Self::call_value).
    pub(crate) fn eval_call(&mut self,
                            token: &Token,
                            function: &Expression,
                            arguments: &[Expression],
                            named: &[(String, Expression)],
                            frame: FrameId)
                            -> EvalResult<Value> {
        let callee = operand!(self.eval_expression(function, frame)?);

        if let Value::Builtin(builtin) = &callee
           && builtin.mutates
           && let Some(Expression::Identifier { name, .. }) = arguments.first()
           && self.env.is_immutable(frame, name)
        {
            return Err(RuntimeError::name(format!("{}() cannot modify immutable binding '{name}'",
                                                  builtin.name)));
        }

        let mut positional = Vec::with_capacity(arguments.len());
        for argument in arguments {
            positional.push(operand!(self.eval_expression(argument, frame)?));
        }
        let mut named_values = Vec::with_capacity(named.len());
        for (name, argument) in named {
            named_values.push((name.clone(), operand!(self.eval_expression(argument, frame)?)));
        }

        let args = Arguments { positional,
                               named: named_values,
                               position: token.position.clone() };
        self.call_value(&callee, args)
    }

    /// Calls a function or builtin with already evaluated arguments.
    ///
    /// Builtins use this to call back into user code, e.g. `sort` with a key
    /// function or `spawn`.
    ///
    /// # Errors
    /// Returns a `TypeError` if `callee` is not callable, and whatever the
    /// call itself reports.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::{
    ///     evaluator::core::Evaluator,
    ///     token::Position,
    ///     value::{core::Value, function::Arguments},
    /// };
    ///
    /// let mut evaluator = Evaluator::default();
    /// evaluator.run("fun add(a, b = 10) { a + b }", "main").unwrap();
    /// let add = evaluator.global("add").unwrap();
    ///
    /// let args = Arguments::new(vec![Value::Integer(1)], Position::default());
    /// assert_eq!(evaluator.call_value(&add, args).unwrap().as_i64(), Some(11));
    /// ```
    pub fn call_value(&mut self, callee: &Value, args: Arguments) -> EvalResult<Value> {
        match callee {
            Value::Function(function) => self.call_function(function, args),
            Value::Builtin(builtin) => builtin.call(self, args),
            other => Err(RuntimeError::type_error(format!("not a function: {}", other.type_name()))),
        }
    }

    /// Calls a closure: binds its parameters in a fresh frame enclosed by
    /// the captured one and runs the body there.
    fn call_function(&mut self, function: &Function, args: Arguments) -> EvalResult<Value> {
        if !self.env.owns(function.arena) {
            return Err(RuntimeError::process("function belongs to another process"));
        }
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::range(format!("maximum call depth of {} exceeded",
                                                   self.config.max_call_depth)));
        }

        let literal = &function.literal;
        if args.positional.len() > literal.parameters.len() {
            return Err(RuntimeError::arity(format!("{}() takes at most {} arguments, got {}",
                                                   display_name(literal),
                                                   literal.parameters.len(),
                                                   args.positional.len())));
        }

        let scope = self.env.push(Some(function.env));
        self.call_depth += 1;
        let result = self.bind_and_run(literal, args, scope);
        self.call_depth -= 1;
        self.env.release(scope);
        result
    }

    fn bind_and_run(&mut self, literal: &FunctionLiteral, args: Arguments, scope: FrameId) -> EvalResult<Value> {
        let Arguments { positional,
                        mut named,
                        .. } = args;
        let bound = positional.len();

        for (name, _) in &named {
            match literal.parameters.iter().position(|p| &p.name == name) {
                None => {
                    return Err(RuntimeError::type_error(format!("{}() got an unexpected named argument '{name}'",
                                                                display_name(literal))));
                },
                Some(index) if index < bound => {
                    return Err(RuntimeError::type_error(format!("{}() got multiple values for argument '{name}'",
                                                                display_name(literal))));
                },
                Some(_) => {},
            }
        }

        for (parameter, value) in literal.parameters.iter().zip(positional) {
            self.env.define(scope, &parameter.name, value);
        }

        for parameter in &literal.parameters[bound..] {
            let value = if let Some(index) = named.iter().position(|(n, _)| n == &parameter.name) {
                named.swap_remove(index).1
            } else if let Some(default) = &parameter.default {
                self.eval_expression(default, scope)?
            } else {
                return Err(RuntimeError::arity(format!("missing argument '{}' in call to {}()",
                                                       parameter.name,
                                                       display_name(literal))));
            };
            self.env.define(scope, &parameter.name, value);
        }

        match self.eval_statements(&literal.body.statements, scope)? {
            Value::Return(value) => Ok(*value),
            marker @ (Value::Break | Value::Continue) => Err(stray_marker(&marker)),
            value => Ok(value),
        }
    }
}

fn display_name(literal: &FunctionLiteral) -> &str {
    literal.name.as_deref().unwrap_or("<anonymous>")
}

#[cfg(test)]
mod tests {
    use crate::{
        error::{Error, ErrorKind},
        interpreter::{evaluator::core::Evaluator, host::INTERPRETER_STACK_SIZE},
    };

    fn run_err(source: &str) -> ErrorKind {
        match Evaluator::default().run(source, "test") {
            Err(Error::Runtime(e)) => e.kind,
            other => panic!("expected a runtime error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_see_earlier_parameters() {
        let v = Evaluator::default().run("fun f(a, b = a * 2) { a + b }; f(3)", "test")
                                    .unwrap();
        assert_eq!(v.as_i64(), Some(9));
    }

    #[test]
    fn named_arguments_fill_later_parameters() {
        let v = Evaluator::default().run("fun f(a, b = 1, c = 2) { [a, b, c] }; f(0, c = 5)", "test")
                                    .unwrap();
        assert_eq!(v.to_string(), "[0, 1, 5]");
    }

    #[test]
    fn argument_shape_errors() {
        assert_eq!(run_err("fun f(a) { a }; f(1, 2)"), ErrorKind::Arity);
        assert_eq!(run_err("fun f(a, b) { a }; f(1)"), ErrorKind::Arity);
        assert_eq!(run_err("fun f(a) { a }; f(1, a = 2)"), ErrorKind::Type);
        assert_eq!(run_err("fun f(a) { a }; f(b = 2)"), ErrorKind::Type);
        assert_eq!(run_err("5(1)"), ErrorKind::Type);
    }

    #[test]
    fn break_cannot_escape_a_function() {
        assert_eq!(run_err("fun f() { break }; f()"), ErrorKind::ControlFlow);
    }

    #[test]
    fn runaway_recursion_is_reported() {
        let kind = std::thread::Builder::new().stack_size(INTERPRETER_STACK_SIZE)
                                              .spawn(|| run_err("fun f(n) { f(n + 1) }; f(0)"))
                                              .unwrap()
                                              .join()
                                              .unwrap();
        assert_eq!(kind, ErrorKind::Range);
    }
}
