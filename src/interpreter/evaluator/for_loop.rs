use crate::{
    ast::{BlockStatement, ComprehensionClause, Expression},
    error::RuntimeError,
    interpreter::{
        environment::FrameId,
        evaluator::core::{EvalResult, Evaluator, operand},
        value::{
            collection::{MapValue, SetValue},
            core::{NULL, Value},
        },
    },
    util::num::usize_to_i64,
};

/// The elements a `for ... in` loop or comprehension walks over.
///
/// Every step is a `(key, item)` pair: the position and element for
/// sequences and sets, the key and value for maps. A single loop binding
/// receives the item, or the key when iterating a map.
struct Steps {
    keyed: bool,
    pairs: Vec<(Value, Value)>,
}

impl Steps {
    fn of(iterable: &Value, bindings: usize) -> EvalResult<Self> {
        if !(1..=2).contains(&bindings) {
            return Err(RuntimeError::type_error(format!("a loop takes one or two bindings, got {bindings}")));
        }

        Ok(match iterable {
               Value::List(items) => Self { keyed: false,
                                            pairs: indexed(items.snapshot()) },
               Value::Set(set) => Self { keyed: false,
                                         pairs: indexed(set.read().iter().cloned().collect()) },
               Value::Map(map) => {
                   Self { keyed: true,
                          pairs: map.read()
                                    .iter()
                                    .map(|(k, v)| (k.clone(), v.clone()))
                                    .collect() }
               },
               Value::String(s) => {
                   Self { keyed: false,
                          pairs: indexed(s.chars().map(|c| Value::from(c.to_string())).collect()) }
               },
               Value::Bytes(bytes) => {
                   Self { keyed: false,
                          pairs: indexed(bytes.iter().map(|&b| Value::Integer(i64::from(b))).collect()) }
               },
               other => {
                   return Err(RuntimeError::type_error(format!("cannot iterate over {}", other.type_name())));
               },
           })
    }
}

fn indexed(items: Vec<Value>) -> Vec<(Value, Value)> {
    items.into_iter()
         .enumerate()
         .map(|(i, item)| (Value::Integer(usize_to_i64(i)), item))
         .collect()
}

impl Evaluator {
    /// Evaluates `for condition { body }`.
    ///
    /// The condition is re-evaluated before every iteration. `break` leaves
    /// the loop, `continue` starts the next iteration and `return` unwinds
    /// out of it.
    ///
    /// # Returns
    /// `null`, or the `return` marker that ended the loop.
    pub(crate) fn eval_for(&mut self,
                           condition: &Expression,
                           body: &BlockStatement,
                           frame: FrameId)
                           -> EvalResult<Value> {
        loop {
            let condition = operand!(self.eval_expression(condition, frame)?);
            if !condition.is_truthy() {
                return Ok(NULL);
            }
            match self.eval_block(body, frame)? {
                Value::Break => return Ok(NULL),
                marker @ Value::Return(_) => return Ok(marker),
                _ => {},
            }
        }
    }

    /// Evaluates `for x in iterable { body }` and `for k, v in iterable {
    /// body }`.
    ///
    /// The iterable is evaluated once and walked as it was at that moment.
    /// The loop variables live in `frame` while the loop runs; afterwards
    /// the bindings they shadowed there are put back, or the variables are
    /// removed.
    ///
    /// # Errors
    /// Returns a `NameError` if a loop variable names an immutable binding,
    /// and a `TypeError` if the value cannot be iterated.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::evaluator::core::Evaluator;
    ///
    /// let mut evaluator = Evaluator::default();
    /// let v = evaluator.run("var total = 0; for k, v in {a: 1, b: 2} { total += v }; total", "main")
    ///                  .unwrap();
    /// assert_eq!(v.as_i64(), Some(3));
    /// ```
    pub(crate) fn eval_for_in(&mut self,
                              bindings: &[String],
                              iterable: &Expression,
                              body: &BlockStatement,
                              frame: FrameId)
                              -> EvalResult<Value> {
        let iterable = operand!(self.eval_expression(iterable, frame)?);
        let steps = Steps::of(&iterable, bindings.len())?;

        if let Some(name) = bindings.iter().find(|name| self.env.is_immutable_local(frame, name)) {
            return Err(RuntimeError::name(format!("cannot use immutable binding '{name}' as a loop variable")));
        }

        let shadowed = bindings.iter()
                               .map(|name| {
                                   self.env
                                       .contains_local(frame, name)
                                       .then(|| self.env.get(frame, name))
                                       .flatten()
                               })
                               .collect::<Vec<_>>();

        let result = self.run_steps(bindings, steps, body, frame);

        for (name, previous) in bindings.iter().zip(shadowed) {
            match previous {
                Some(value) => self.env.define(frame, name, value),
                None => {
                    self.env.remove(frame, name);
                },
            }
        }
        result
    }

    fn run_steps(&mut self,
                 bindings: &[String],
                 steps: Steps,
                 body: &BlockStatement,
                 frame: FrameId)
                 -> EvalResult<Value> {
        for pair in steps.pairs {
            self.bind_step(bindings, steps.keyed, pair, frame);
            match self.eval_block(body, frame)? {
                Value::Break => break,
                marker @ Value::Return(_) => return Ok(marker),
                _ => {},
            }
        }
        Ok(NULL)
    }

    fn bind_step(&mut self, bindings: &[String], keyed: bool, (key, item): (Value, Value), frame: FrameId) {
        match bindings {
            [single] => self.env.define(frame, single, if keyed { key } else { item }),
            [first, second, ..] => {
                self.env.define(frame, first, key);
                self.env.define(frame, second, item);
            },
            [] => {},
        }
    }

    /// Runs the `for ... in ... if ...` part of a comprehension.
    ///
    /// The bindings live in a fresh frame enclosed by `frame`. `emit` is
    /// called once per step that passes the filter; a control marker it
    /// returns stops the walk and is handed back.
    fn comprehend<F>(&mut self, clause: &ComprehensionClause, frame: FrameId, mut emit: F) -> EvalResult<Value>
        where F: FnMut(&mut Self, FrameId) -> EvalResult<Value>
    {
        let iterable = operand!(self.eval_expression(&clause.iterable, frame)?);
        let steps = Steps::of(&iterable, clause.bindings.len())?;

        let scope = self.env.push(Some(frame));
        let result = self.comprehend_steps(clause, steps, scope, &mut emit);
        self.env.release(scope);
        result
    }

    fn comprehend_steps<F>(&mut self,
                           clause: &ComprehensionClause,
                           steps: Steps,
                           scope: FrameId,
                           emit: &mut F)
                           -> EvalResult<Value>
        where F: FnMut(&mut Self, FrameId) -> EvalResult<Value>
    {
        for pair in steps.pairs {
            self.bind_step(&clause.bindings, steps.keyed, pair, scope);
            if let Some(filter) = &clause.filter {
                let keep = operand!(self.eval_expression(filter, scope)?);
                if !keep.is_truthy() {
                    continue;
                }
            }
            operand!(emit(self, scope)?);
        }
        Ok(NULL)
    }

    /// Evaluates `[element for x in xs if cond]`.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::evaluator::core::Evaluator;
    ///
    /// let mut evaluator = Evaluator::default();
    /// let v = evaluator.run("[x * x for x in 1..5 if x % 2 == 1]", "main").unwrap();
    /// assert_eq!(v.to_string(), "[1, 9, 25]");
    /// ```
    pub(crate) fn eval_list_comprehension(&mut self,
                                          element: &Expression,
                                          clause: &ComprehensionClause,
                                          frame: FrameId)
                                          -> EvalResult<Value> {
        let mut items = Vec::new();
        let done = self.comprehend(clause, frame, |this, scope| {
                           items.push(operand!(this.eval_expression(element, scope)?));
                           Ok(NULL)
                       })?;
        if done.is_control() {
            return Ok(done);
        }
        Ok(Value::from(items))
    }

    /// Evaluates `{element for x in xs if cond}`.
    pub(crate) fn eval_set_comprehension(&mut self,
                                         element: &Expression,
                                         clause: &ComprehensionClause,
                                         frame: FrameId)
                                         -> EvalResult<Value> {
        let mut set = SetValue::new();
        let done = self.comprehend(clause, frame, |this, scope| {
                           set.insert(operand!(this.eval_expression(element, scope)?))?;
                           Ok(NULL)
                       })?;
        if done.is_control() {
            return Ok(done);
        }
        Ok(Value::from(set))
    }

    /// Evaluates `{key: value for k, v in m if cond}`.
    pub(crate) fn eval_map_comprehension(&mut self,
                                         key: &Expression,
                                         value: &Expression,
                                         clause: &ComprehensionClause,
                                         frame: FrameId)
                                         -> EvalResult<Value> {
        let mut map = MapValue::new();
        let done = self.comprehend(clause, frame, |this, scope| {
                           let k = operand!(this.eval_expression(key, scope)?);
                           let v = operand!(this.eval_expression(value, scope)?);
                           map.insert(k, v)?;
                           Ok(NULL)
                       })?;
        if done.is_control() {
            return Ok(done);
        }
        Ok(Value::from(map))
    }
}
