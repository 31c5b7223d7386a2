use crate::{
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::{
            core::{NULL, Value},
            function::Arguments,
        },
    },
    util::num::millis,
};

/// `now_ms()`: milliseconds since the Unix epoch, from the host clock.
pub fn now_ms(evaluator: &mut Evaluator, _: Arguments) -> EvalResult<Value> {
    Ok(Value::Integer(evaluator.host.clock.now_ms()))
}

/// `sleep(ms)`: blocks the current process through the host clock.
///
/// # Errors
/// Returns an `ArithmeticError` for a negative duration.
pub fn sleep(evaluator: &mut Evaluator, args: Arguments) -> EvalResult<Value> {
    let duration = millis(args.at(0)?.expect_i64("sleep duration")?)?;
    evaluator.host.clock.sleep(duration);
    Ok(NULL)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicI64, Ordering},
        },
        time::Duration,
    };

    use crate::{
        config::Config,
        interpreter::{
            evaluator::core::Evaluator,
            host::{Clock, Host},
        },
    };

    #[derive(Default)]
    struct FakeClock {
        now: Arc<AtomicI64>,
    }

    impl Clock for FakeClock {
        fn now_ms(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }

        fn sleep(&self, duration: Duration) {
            let ms = i64::try_from(duration.as_millis()).unwrap();
            self.now.fetch_add(ms, Ordering::SeqCst);
        }
    }

    #[test]
    fn time_goes_through_the_host_clock() {
        let config = Config::default();
        let clock = FakeClock::default();
        let host = Host::new(&config).with_clock(clock);
        let mut evaluator = Evaluator::new(host, config);
        let v = evaluator.run("val t = now_ms(); sleep(250); now_ms() - t", "test").unwrap();
        assert_eq!(v.as_i64(), Some(250));
        assert!(evaluator.run("sleep(-1)", "test").is_err());
    }
}
