//! Hierarchical progress tracking
//!
//! A [`Task`] is a named scope in a tree of work. Creating a subtask and
//! marking a task done are logged through the `log` facade and appended to
//! a journal shared by the whole tree, so callers (and tests) can inspect
//! what ran and in which order.
//!
//! ```rust
//! use rfsvm::task::Task;
//!
//! let main = Task::root("experiment");
//! let load = main.subtask_named("training data", Some("Loading patients"));
//! load.progress(1, 2);
//! load.done("loaded 2 patients");
//! assert!(load.is_done());
//! assert_eq!(load.path(), "experiment/training data");
//! ```

use log::{debug, info};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// What happened to a task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEventKind {
    /// Task scope opened
    Started { description: Option<String> },
    /// Intermediate progress report
    Progress { current: usize, total: usize },
    /// Task scope closed with a status message
    Done { message: String, elapsed: Duration },
}

/// Journal entry for a single task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEvent {
    /// Slash-separated path from the root task
    pub path: String,
    pub kind: TaskEventKind,
}

type Journal = Arc<Mutex<Vec<TaskEvent>>>;

struct TaskNode {
    name: String,
    path: String,
    description: Option<String>,
    started: Instant,
    done: AtomicBool,
    children: AtomicUsize,
    journal: Journal,
}

/// Handle to a node in the task tree; cheap to clone and shareable across threads
#[derive(Clone)]
pub struct Task {
    node: Arc<TaskNode>,
}

impl Task {
    /// Create a new root task with its own journal
    pub fn root(name: &str) -> Self {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        Self::open(name.to_string(), name.to_string(), None, journal)
    }

    fn open(name: String, path: String, description: Option<String>, journal: Journal) -> Self {
        match &description {
            Some(desc) => info!("[{path}] {desc}"),
            None => debug!("[{path}] started"),
        }

        let task = Self {
            node: Arc::new(TaskNode {
                name,
                path,
                description,
                started: Instant::now(),
                done: AtomicBool::new(false),
                children: AtomicUsize::new(0),
                journal,
            }),
        };
        task.record(TaskEventKind::Started {
            description: task.node.description.clone(),
        });
        task
    }

    /// Open an unnamed child scope
    ///
    /// Unnamed children are numbered in creation order (`#1`, `#2`, ...).
    pub fn subtask(&self) -> Task {
        let index = self.node.children.fetch_add(1, Ordering::SeqCst) + 1;
        self.child(format!("#{index}"), None)
    }

    /// Open a named child scope with an optional description
    pub fn subtask_named(&self, name: &str, description: Option<&str>) -> Task {
        self.node.children.fetch_add(1, Ordering::SeqCst);
        self.child(name.to_string(), description.map(str::to_string))
    }

    fn child(&self, name: String, description: Option<String>) -> Task {
        let path = format!("{}/{}", self.node.path, name);
        Self::open(name, path, description, Arc::clone(&self.node.journal))
    }

    /// Report progress within this task
    pub fn progress(&self, current: usize, total: usize) {
        debug!("[{}] {current}/{total}", self.node.path);
        self.record(TaskEventKind::Progress { current, total });
    }

    /// Close this task with a status message
    ///
    /// Closing twice keeps the first status; the second call is only logged.
    pub fn done(&self, message: &str) {
        if self.node.done.swap(true, Ordering::SeqCst) {
            debug!("[{}] already done, ignoring '{message}'", self.node.path);
            return;
        }

        let elapsed = self.node.started.elapsed();
        info!("[{}] {message} ({elapsed:.2?})", self.node.path);
        self.record(TaskEventKind::Done {
            message: message.to_string(),
            elapsed,
        });
    }

    /// Whether [`Task::done`] has been called
    pub fn is_done(&self) -> bool {
        self.node.done.load(Ordering::SeqCst)
    }

    /// Name of this task
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Description given at creation, if any
    pub fn description(&self) -> Option<&str> {
        self.node.description.as_deref()
    }

    /// Slash-separated path from the root
    pub fn path(&self) -> &str {
        &self.node.path
    }

    /// Time since the task was opened
    pub fn elapsed(&self) -> Duration {
        self.node.started.elapsed()
    }

    /// Snapshot of the journal shared by the whole task tree
    pub fn events(&self) -> Vec<TaskEvent> {
        self.journal().clone()
    }

    fn record(&self, kind: TaskEventKind) {
        self.journal().push(TaskEvent {
            path: self.node.path.clone(),
            kind,
        });
    }

    fn journal(&self) -> MutexGuard<'_, Vec<TaskEvent>> {
        // A panic while holding the lock leaves the journal intact.
        self.node
            .journal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("path", &self.node.path)
            .field("done", &self.is_done())
            .finish()
    }
}
