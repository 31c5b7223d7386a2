use std::sync::Arc;

use crate::{
    ast::{Expression, Program},
    error::{ErrorKind, ParseError, RuntimeError},
    interpreter::{
        environment::FrameId,
        evaluator::core::{EvalResult, Evaluator, operand, stray_marker},
        parser::parse,
        value::{
            core::{NULL, Value},
            function::Module,
        },
    },
};

/// File name given to source text run through `eval`.
pub const EVAL_FILE: &str = "<eval>";

impl Evaluator {
    /// Evaluates `import a.b.c`.
    ///
    /// The module is loaded through the host's source loader, evaluated once
    /// in a frame of its own enclosed by the core frame, and bound in `frame`
    /// under the last path segment. Later imports of the same path reuse the
    /// cached module.
    ///
    /// # Errors
    /// Returns an `ImportError` if the module cannot be loaded, does not
    /// parse, fails while evaluating, or is already being imported further
    /// up the chain.
    ///
    /// # Example
    /// ```
    /// use blue::{
    ///     config::Config,
    ///     interpreter::{
    ///         evaluator::core::Evaluator,
    ///         host::{Host, MemoryLoader},
    ///     },
    /// };
    ///
    /// let config = Config::default();
    /// let loader = MemoryLoader::new().with_module("util.math", "fun double(x) { x * 2 }");
    /// let mut evaluator = Evaluator::new(Host::new(&config).with_loader(loader), config);
    ///
    /// let v = evaluator.run("import util.math\nmath.double(21)", "main").unwrap();
    /// assert_eq!(v.as_i64(), Some(42));
    /// ```
    pub(crate) fn eval_import(&mut self, path: &str, frame: FrameId) -> EvalResult<Value> {
        let name = path.rsplit('.').next().unwrap_or(path);
        let cached = self.modules.get(path).cloned();
        let module = match cached {
            Some(module) => module,
            None => self.load_module(path, name)?,
        };
        self.env.declare(frame, name, module)?;
        Ok(NULL)
    }

    fn load_module(&mut self, path: &str, name: &str) -> EvalResult<Value> {
        if self.importing.iter().any(|p| p == path) {
            let chain = self.importing.join(" -> ");
            return Err(RuntimeError::import(format!("cyclic import: {chain} -> {path}")));
        }

        tracing::debug!(module = path, "import");
        let source = self.host
                         .loader
                         .load(path)
                         .map_err(|e| RuntimeError::import(e.to_string()))?;
        self.sources.insert(path, &source);
        let program = parse(&source, path).map_err(|errors| {
                                              RuntimeError::import(format!("cannot parse module '{path}': {}",
                                                                           describe(&errors)))
                                          })?;

        let scope = self.env.push(Some(self.core));
        self.env.pin(scope);
        self.importing.push(path.to_string());
        let result = self.eval_module(&program, scope);
        self.importing.pop();

        if let Err(error) = result {
            if error.kind == ErrorKind::Import {
                return Err(error);
            }
            let mut wrapped = RuntimeError::import(format!("error in module '{path}': {error}"));
            wrapped.trace = error.trace;
            return Err(wrapped);
        }

        let module = Value::Module(Arc::new(Module { name:  name.to_string(),
                                                     env:   scope,
                                                     arena: self.env.id(), }));
        self.modules.insert(path.to_string(), module.clone());
        Ok(module)
    }

    fn eval_module(&mut self, program: &Program, scope: FrameId) -> EvalResult<()> {
        for statement in &program.statements {
            let value = self.eval_statement(statement, scope)?;
            if value.is_control() {
                return Err(stray_marker(&value));
            }
        }
        Ok(())
    }

    /// Evaluates `eval(source)`: the string is parsed and run in `frame`, so
    /// it sees and may change the caller's bindings.
    ///
    /// # Errors
    /// Returns a `TypeError` if the argument is not a string, a
    /// `ParserError` if it does not parse, and whatever its evaluation
    /// raises.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::evaluator::core::Evaluator;
    ///
    /// let mut evaluator = Evaluator::default();
    /// let v = evaluator.run(r#"var x = 1; eval("x = x + 1"); x"#, "main").unwrap();
    /// assert_eq!(v.as_i64(), Some(2));
    /// ```
    pub(crate) fn eval_source(&mut self, source: &Expression, frame: FrameId) -> EvalResult<Value> {
        let text = operand!(self.eval_expression(source, frame)?);
        let text = text.expect_str("eval source")?;
        self.sources.insert(EVAL_FILE, text);
        let program = parse(text, EVAL_FILE).map_err(|errors| RuntimeError::new(ErrorKind::Parser, describe(&errors)))?;
        self.eval_statements(&program.statements, frame)
    }
}

/// Joins parse errors into one message, without their `ParserError:`
/// prefix.
fn describe(errors: &[ParseError]) -> String {
    errors.iter()
          .map(|e| {
              let text = e.to_string();
              text.strip_prefix("ParserError: ").map_or_else(|| text.clone(), str::to_string)
          })
          .collect::<Vec<_>>()
          .join("; ")
}

#[cfg(test)]
mod tests {
    use crate::{
        config::Config,
        error::{Error, ErrorKind},
        interpreter::{
            evaluator::core::Evaluator,
            host::{Host, MemoryLoader},
        },
    };

    fn evaluator(loader: MemoryLoader) -> Evaluator {
        let config = Config::default();
        Evaluator::new(Host::new(&config).with_loader(loader), config)
    }

    fn import_error(evaluator: &mut Evaluator, source: &str) -> String {
        match evaluator.run(source, "main") {
            Err(Error::Runtime(e)) if e.kind == ErrorKind::Import => e.message,
            other => panic!("expected an import error, got {other:?}"),
        }
    }

    #[test]
    fn cyclic_imports_are_rejected() {
        let loader = MemoryLoader::new().with_module("a", "import b")
                                        .with_module("b", "import a");
        let message = import_error(&mut evaluator(loader), "import a");
        assert!(message.contains("cyclic import"), "{message}");
    }

    #[test]
    fn missing_modules_and_bad_syntax_are_import_errors() {
        let loader = MemoryLoader::new().with_module("broken", "var = 1");
        let mut evaluator = evaluator(loader);
        assert!(import_error(&mut evaluator, "import nowhere").contains("not found"));
        assert!(import_error(&mut evaluator, "import broken").contains("cannot parse"));
    }

    #[test]
    fn modules_are_evaluated_once() {
        let loader = MemoryLoader::new().with_module("counter", "var hits = [1]");
        let mut evaluator = evaluator(loader);
        let v = evaluator.run("import counter\npush(counter.hits, 2)\nimport counter\nlen(counter.hits)", "main")
                         .unwrap();
        assert_eq!(v.as_i64(), Some(2));
    }

    #[test]
    fn module_members_do_not_leak_builtins() {
        let loader = MemoryLoader::new().with_module("m", "val x = 1");
        let mut evaluator = evaluator(loader);
        assert!(evaluator.run("import m\nm.print", "main").is_err());
        assert_eq!(evaluator.run("m.x", "main").unwrap().as_i64(), Some(1));
    }
}
