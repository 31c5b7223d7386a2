use std::{process::Command, sync::Arc};

use crate::{
    ast::{Expression, StringPart},
    error::RuntimeError,
    interpreter::{
        environment::FrameId,
        evaluator::core::{EvalResult, Evaluator, operand},
        value::{
            collection::{MapValue, SetValue},
            core::{NULL, Value},
        },
    },
};

impl Evaluator {
    /// Evaluates a literal that needs no environment: numbers, booleans,
    /// `null` and regexes.
    pub(crate) fn eval_scalar_literal(expression: &Expression) -> Value {
        match expression {
            Expression::Boolean { value, .. } => Value::Boolean(*value),
            Expression::Integer { value, .. } => Value::Integer(*value),
            Expression::BigInteger { value, .. } => Value::BigInteger(Arc::clone(value)),
            Expression::Float { value, .. } => Value::Float(*value),
            Expression::BigFloat { value, .. } => Value::BigFloat(Arc::clone(value)),
            Expression::Hex { value, .. }
            | Expression::Octal { value, .. }
            | Expression::Binary { value, .. }
            | Expression::UInteger { value, .. } => Value::UInteger(*value),
            Expression::Regex { pattern, .. } => Value::Regex(Arc::clone(pattern)),
            _ => NULL,
        }
    }

    /// Evaluates a string literal, substituting the inspect form of every
    /// interpolated expression.
    ///
    /// # Parameters
    /// - `text`: The processed text, returned as is when nothing is
    ///   interpolated.
    /// - `parts`: Text and interpolation parts, in order.
    /// - `frame`: Frame the interpolated expressions see.
    pub(crate) fn eval_string(&mut self,
                              text: &str,
                              parts: &[StringPart],
                              frame: FrameId)
                              -> EvalResult<Value> {
        if !parts.iter().any(|p| matches!(p, StringPart::Interpolation(_))) {
            return Ok(Value::from(text));
        }

        let mut out = String::with_capacity(text.len());
        for part in parts {
            match part {
                StringPart::Text(text) => out.push_str(text),
                StringPart::Interpolation(expression) => {
                    let value = operand!(self.eval_expression(expression, frame)?);
                    out.push_str(&value.inspect());
                },
            }
        }
        Ok(Value::from(out))
    }

    /// Runs an exec string through `sh -c` and returns its standard output.
    ///
    /// # Errors
    /// Returns a `HostError` if the shell cannot be started or the command
    /// exits unsuccessfully; the message carries the command's stderr.
    pub(crate) fn eval_exec_string(command: &str) -> EvalResult<Value> {
        tracing::debug!(command, "exec string");
        let output = Command::new("sh").arg("-c")
                                       .arg(command)
                                       .output()
                                       .map_err(|e| RuntimeError::host(format!("cannot run `{command}`: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RuntimeError::host(format!("`{command}` failed ({}): {}",
                                                  output.status,
                                                  stderr.trim_end())));
        }
        Ok(Value::from(String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    pub(crate) fn eval_list_literal(&mut self,
                                    elements: &[Expression],
                                    frame: FrameId)
                                    -> EvalResult<Value> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            values.push(operand!(self.eval_expression(element, frame)?));
        }
        Ok(Value::from(values))
    }

    /// Evaluates a map literal. Keys and values are evaluated left to right;
    /// a repeated key keeps its first position and takes the last value.
    pub(crate) fn eval_map_literal(&mut self,
                                   entries: &[(Expression, Expression)],
                                   frame: FrameId)
                                   -> EvalResult<Value> {
        let mut map = MapValue::new();
        for (key, value) in entries {
            let key = operand!(self.eval_expression(key, frame)?);
            let value = operand!(self.eval_expression(value, frame)?);
            map.insert(key, value)?;
        }
        Ok(Value::from(map))
    }

    pub(crate) fn eval_set_literal(&mut self,
                                   elements: &[Expression],
                                   frame: FrameId)
                                   -> EvalResult<Value> {
        let mut set = SetValue::new();
        for element in elements {
            set.insert(operand!(self.eval_expression(element, frame)?))?;
        }
        Ok(Value::from(set))
    }

    /// Evaluates a struct literal into a map with string keys in field
    /// order.
    pub(crate) fn eval_struct_literal(&mut self,
                                      fields: &[(String, Expression)],
                                      frame: FrameId)
                                      -> EvalResult<Value> {
        let mut map = MapValue::new();
        for (name, value) in fields {
            let value = operand!(self.eval_expression(value, frame)?);
            map.insert(Value::from(name.as_str()), value)?;
        }
        Ok(Value::from(map))
    }
}
