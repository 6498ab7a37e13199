use std::{cell::RefCell, ffi::OsStr, time::Duration};

#[derive(Clone, Copy)]
struct Env {
    /// `LMC_DELAY`, in milliseconds
    delay: Option<Duration>,
    /// `LMC_MINIMAL=1`
    minimal: bool,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        delay: std::env::var("LMC_DELAY")
            .ok()
            .and_then(|v| parse_delay(&v)),
        minimal: var_is("LMC_MINIMAL", "1"),
    };
    set_env(value);
}

/// Default delay between steps in slow mode, if configured.
pub fn delay() -> Option<Duration> {
    with_env(|env| env.delay)
}

pub fn is_minimal() -> bool {
    with_env(|env| env.minimal)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}

fn parse_delay(value: &str) -> Option<Duration> {
    value.trim().parse().ok().map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_in_milliseconds() {
        assert_eq!(parse_delay("250"), Some(Duration::from_millis(250)));
        assert_eq!(parse_delay(" 0 "), Some(Duration::ZERO));
        assert_eq!(parse_delay("fast"), None);
        assert_eq!(parse_delay("-1"), None);
    }
}
