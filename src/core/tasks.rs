//! Fixed fan-out of worker threads joined at a single point.
//!
//! Workers report human-readable messages through a bounded channel that the
//! calling thread drains until every worker has hung up. Each worker's own
//! result comes back through its join handle, so no error is lost.

use crate::error::{OraclientError, Result};
use std::sync::mpsc::{self, SyncSender};
use std::thread;
use tracing::{debug, warn};

const MESSAGE_BUFFER: usize = 16;

/// Handle given to each worker for progress messages.
pub struct TaskReporter {
    tx: SyncSender<String>,
}

impl TaskReporter {
    pub fn report<S: Into<String>>(&self, message: S) {
        // The receiver outlives every worker, so a send only fails if the
        // consumer itself panicked.
        let _ = self.tx.send(message.into());
    }
}

type TaskFn<'env, T> = Box<dyn FnOnce(&TaskReporter) -> Result<T> + Send + 'env>;

pub struct Task<'env, T> {
    name: String,
    run: TaskFn<'env, T>,
}

impl<'env, T> Task<'env, T> {
    pub fn new<S, F>(name: S, run: F) -> Self
    where
        S: Into<String>,
        F: FnOnce(&TaskReporter) -> Result<T> + Send + 'env,
    {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }
}

#[derive(Debug)]
pub struct TaskResult<T> {
    pub name: String,
    pub result: Result<T>,
}

/// Runs every task concurrently and waits for all of them, whatever their
/// outcome. `on_message` sees worker messages in arrival order. Results are
/// returned in the order the tasks were given.
pub fn run_all<'env, T, M>(tasks: Vec<Task<'env, T>>, mut on_message: M) -> Vec<TaskResult<T>>
where
    T: Send + 'env,
    M: FnMut(String),
{
    thread::scope(|scope| {
        let (tx, rx) = mpsc::sync_channel(MESSAGE_BUFFER);

        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let reporter = TaskReporter { tx: tx.clone() };
                let run = task.run;
                debug!(task = %task.name, "spawning task");
                let handle = thread::Builder::new()
                    .name(task.name.clone())
                    .spawn_scoped(scope, move || run(&reporter));
                (task.name, handle)
            })
            .collect();

        // Only the workers hold senders now; the loop ends once they are done.
        drop(tx);
        for message in rx {
            on_message(message);
        }

        handles
            .into_iter()
            .map(|(name, handle)| {
                let result = match handle {
                    Ok(handle) => handle.join().unwrap_or_else(|_| {
                        warn!(task = %name, "task panicked");
                        Err(OraclientError::TaskPanicked { task: name.clone() })
                    }),
                    Err(e) => Err(OraclientError::Io(e)),
                };
                debug!(task = %name, ok = result.is_ok(), "task finished");
                TaskResult { name, result }
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_waits_for_every_task() {
        let delay = Duration::from_millis(200);
        let started = Instant::now();

        let results = run_all(
            vec![
                Task::new("fails", |_: &TaskReporter| -> Result<u32> {
                    Err(OraclientError::InvalidUrl {
                        url: "bad".to_string(),
                    })
                }),
                Task::new("slow", move |_: &TaskReporter| {
                    thread::sleep(delay);
                    Ok(7)
                }),
            ],
            |_| {},
        );

        assert!(started.elapsed() >= delay);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "fails");
        assert!(matches!(
            results[0].result,
            Err(OraclientError::InvalidUrl { .. })
        ));
        assert_eq!(results[1].name, "slow");
        assert_eq!(results[1].result.as_ref().unwrap(), &7);
    }

    #[test]
    fn test_messages_are_drained() {
        let mut messages = Vec::new();

        let results = run_all(
            vec![
                Task::new("a", |reporter: &TaskReporter| {
                    for i in 0..40 {
                        reporter.report(format!("a{i}"));
                    }
                    Ok(())
                }),
                Task::new("b", |reporter: &TaskReporter| {
                    reporter.report("b done");
                    Ok(())
                }),
            ],
            |message| messages.push(message),
        );

        assert!(results.iter().all(|r| r.result.is_ok()));
        assert_eq!(messages.len(), 41);
        assert!(messages.contains(&"b done".to_string()));
        let a_messages: Vec<_> = messages.iter().filter(|m| m.starts_with('a')).collect();
        assert_eq!(a_messages.first().map(|m| m.as_str()), Some("a0"));
        assert_eq!(a_messages.last().map(|m| m.as_str()), Some("a39"));
    }

    #[test]
    fn test_panicking_task_is_reported() {
        let results = run_all(
            vec![
                Task::new("boom", |_: &TaskReporter| -> Result<()> {
                    panic!("worker exploded");
                }),
                Task::new("fine", |_: &TaskReporter| Ok(())),
            ],
            |_| {},
        );

        assert!(matches!(
            &results[0].result,
            Err(OraclientError::TaskPanicked { task }) if task == "boom"
        ));
        assert!(results[1].result.is_ok());
    }

    #[test]
    fn test_tasks_borrow_from_caller() {
        let inputs = vec![1, 2, 3];
        let results = run_all(
            vec![
                Task::new("sum", |_: &TaskReporter| Ok(inputs.iter().sum::<i32>())),
                Task::new("len", |_: &TaskReporter| Ok(inputs.len() as i32)),
            ],
            |_| {},
        );

        let values: Vec<i32> = results.into_iter().map(|r| r.result.unwrap()).collect();
        assert_eq!(values, vec![6, 3]);
    }
}
