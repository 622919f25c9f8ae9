//! Job language demo.
//!
//! A small effect language (`Job1`, `Job2`, named jobs, printing and reading
//! the job context) interpreted three ways: directly with `execute`, lazily
//! through `into_deferred`, and with a job quota through `try_execute`.
//!
//! ```text
//! cargo run --example lang -- [cycle-length]
//! RUST_LOG=catfree=debug cargo run --example lang
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use catfree::control::{Deferred, Program};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CYCLE_LENGTH: u64 = 1_000_000;

// =============================================================================
// Language
// =============================================================================

/// Host state observed by `Read`.
#[derive(Debug, Default)]
struct JobContext {
    jobs_done: Vec<String>,
}

type Reader = Arc<dyn Fn(&JobContext) -> Box<dyn Any> + Send + Sync>;

#[derive(Clone)]
enum Lang {
    Job1,
    Job2,
    SpecialJob(String),
    Print(String),
    Read(Reader),
}

impl fmt::Debug for Lang {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Job1 => formatter.write_str("Job1"),
            Self::Job2 => formatter.write_str("Job2"),
            Self::SpecialJob(name) => formatter.debug_tuple("SpecialJob").field(name).finish(),
            Self::Print(message) => formatter.debug_tuple("Print").field(message).finish(),
            Self::Read(_) => formatter.write_str("Read(<reader>)"),
        }
    }
}

fn job1() -> Program<Lang, ()> {
    Program::lift(Lang::Job1)
}

fn job2() -> Program<Lang, ()> {
    Program::lift(Lang::Job2)
}

fn special_job(name: impl Into<String>) -> Program<Lang, ()> {
    Program::lift(Lang::SpecialJob(name.into()))
}

fn print(message: impl Into<String>) -> Program<Lang, ()> {
    Program::lift(Lang::Print(message.into()))
}

fn read<A, F>(view: F) -> Program<Lang, A>
where
    A: Clone + Send + Sync + 'static,
    F: Fn(&JobContext) -> A + Send + Sync + 'static,
{
    let reader: Reader =
        Arc::new(move |context: &JobContext| -> Box<dyn Any> { Box::new(view(context)) });
    Program::lift(Lang::Read(reader))
}

// =============================================================================
// Programs
// =============================================================================

fn check_about_jobs() -> Program<Lang, usize> {
    read(|context| context.jobs_done.len()).flat_map(|count| {
        let message = if count > 0 {
            format!("{count} jobs is done, wow!")
        } else {
            String::from("no jobs yet")
        };
        print(message).map(move |()| count)
    })
}

fn do_stuff() -> Program<Lang, usize> {
    job1().then(job2()).then(check_about_jobs())
}

/// Unfolds `step` from `seed` until it yields `None`.
///
/// Each step is built only when the previous one has run, so arbitrarily long
/// cycles never exist in memory all at once.
fn cycle<V, F>(seed: V, step: Arc<F>) -> Program<Lang, V>
where
    V: Clone + Send + Sync + 'static,
    F: Fn(V) -> Option<Program<Lang, V>> + Send + Sync + 'static,
{
    match step(seed.clone()) {
        None => Program::pure(seed),
        Some(next) => next.flat_map(move |value| cycle(value, Arc::clone(&step))),
    }
}

// =============================================================================
// Interpreters
// =============================================================================

fn perform(context: &RefCell<JobContext>, effect: &Lang) -> Box<dyn Any> {
    match effect {
        Lang::Job1 => {
            println!("[job1]");
            context.borrow_mut().jobs_done.push(String::from("job1"));
            Box::new(())
        }
        Lang::Job2 => {
            println!("[job2]");
            context.borrow_mut().jobs_done.push(String::from("job2"));
            Box::new(())
        }
        Lang::SpecialJob(name) => {
            context.borrow_mut().jobs_done.push(name.clone());
            Box::new(())
        }
        Lang::Print(message) => {
            println!("[print:][ {message} ]");
            Box::new(())
        }
        Lang::Read(reader) => {
            println!("[read]");
            reader(&*context.borrow())
        }
    }
}

fn execute_lang<V: 'static>(program: Program<Lang, V>) -> V {
    let context = RefCell::new(JobContext::default());
    program.execute(|effect| perform(&context, effect))
}

fn defer_lang<V: 'static>(program: Program<Lang, V>) -> Deferred<V> {
    let context = Rc::new(RefCell::new(JobContext::default()));
    program.into_deferred(move |effect| {
        let context = Rc::clone(&context);
        let effect = effect.clone();
        Deferred::new(move || perform(&context, &effect))
    })
}

/// Failure raised by the quota interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LangError {
    /// More jobs were requested than the quota allows.
    QuotaExceeded {
        /// Number of jobs allowed.
        limit: usize,
    },
}

impl fmt::Display for LangError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotaExceeded { limit } => write!(formatter, "job quota of {limit} exceeded"),
        }
    }
}

impl std::error::Error for LangError {}

fn execute_with_quota<V: 'static>(program: Program<Lang, V>, limit: usize) -> Result<V, LangError> {
    let context = RefCell::new(JobContext::default());
    program.try_execute(|effect| {
        let is_job = matches!(effect, Lang::Job1 | Lang::Job2 | Lang::SpecialJob(_));
        if is_job && context.borrow().jobs_done.len() >= limit {
            return Err(LangError::QuotaExceeded { limit });
        }
        Ok(perform(&context, effect))
    })
}

// =============================================================================
// Entry Point
// =============================================================================

fn log_run(name: &str, run: impl FnOnce()) {
    tracing::info!("[run start] {name}");
    let started = Instant::now();
    run();
    tracing::info!("[run finished] {name} in {:?}", started.elapsed());
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cycle_length = match std::env::args().nth(1).map(|argument| argument.parse::<u64>()) {
        None => DEFAULT_CYCLE_LENGTH,
        Some(Ok(length)) => length,
        Some(Err(error)) => {
            tracing::warn!("invalid cycle length: {error}");
            tracing::info!("Using default cycle length {DEFAULT_CYCLE_LENGTH}");
            DEFAULT_CYCLE_LENGTH
        }
    };

    log_run("do_stuff", || {
        println!("do_stuff executed with result: {}", execute_lang(do_stuff()));
    });

    log_run("check_about_jobs", || {
        println!(
            "check_about_jobs executed with result: {}",
            execute_lang(check_about_jobs())
        );
    });

    log_run("deferred do_stuff", || {
        let deferred = defer_lang(do_stuff());
        println!("deferred was constructed");
        println!("do_stuff executed with result: {}", deferred.force());
    });

    log_run("quota do_stuff", || match execute_with_quota(do_stuff(), 1) {
        Ok(result) => println!("do_stuff executed with result: {result}"),
        Err(error) => println!("do_stuff failed: {error}"),
    });

    log_run("cycle", || {
        let program = cycle(
            cycle_length,
            Arc::new(move |remaining: u64| {
                (remaining > 0).then(|| {
                    special_job(format!("In Cycle Job ({})", cycle_length - remaining))
                        .map(move |()| remaining - 1)
                })
            }),
        )
        .then(check_about_jobs());
        println!("cycle executed with result: {}", execute_lang(program));
    });
}
