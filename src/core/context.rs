//! Cancellation context tree.
//!
//! A [`Context`] is a node in a tree of cancelable, awaitable scopes.
//! Cancellation flows down: [`ContextCtl::cancel`] marks a node and every live
//! descendant as cancelled before returning. Completion flows up:
//! [`Context::finish`] waits for every child to finish before the node
//! detaches from its parent and wakes anyone waiting on it.
//!
//! The owning task holds the `Context` (which is not `Clone`) and must call
//! `finish` exactly once. Supervisors hold a cloneable [`ContextCtl`] that can
//! cancel the node and wait for it to finish.
//!
//! ```rust,ignore
//! let (root, _root_ctl) = Context::root("main");
//! let (child, ctl) = root.make_child()?;
//! tokio::spawn(async move {
//!     child.cancelled().await;
//!     child.finish().await;
//! });
//! ctl.cancel();
//! ctl.wait_for_finish().await;
//! root.finish().await;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{error, trace};

use crate::core::{JobberError, Result};

#[derive(Default)]
struct Links {
    children: HashMap<u64, Weak<Node>>,
    next_child: u64,
    /// Set once the node is cancelled or has begun finishing.
    closed: bool,
}

struct Node {
    id: u64,
    name: String,
    parent: Option<Arc<Node>>,
    links: Mutex<Links>,
    cancelled: watch::Sender<bool>,
    finished: watch::Sender<bool>,
    outstanding: watch::Sender<usize>,
}

impl Node {
    fn new(id: u64, name: String, parent: Option<Arc<Self>>) -> Arc<Self> {
        Arc::new(Self {
            id,
            name,
            parent,
            links: Mutex::new(Links::default()),
            cancelled: watch::Sender::new(false),
            finished: watch::Sender::new(false),
            outstanding: watch::Sender::new(0),
        })
    }

    fn cancel(&self) {
        let children: Vec<Arc<Self>> = {
            let mut links = self.links.lock();
            if *self.cancelled.borrow() {
                return;
            }
            links.closed = true;
            self.cancelled.send_replace(true);
            links.children.values().filter_map(Weak::upgrade).collect()
        };
        trace!(context = %self.name, children = children.len(), "context cancelled");
        for child in children {
            child.cancel();
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    fn is_finished(&self) -> bool {
        *self.finished.borrow()
    }

    fn detach(&self) {
        if let Some(parent) = &self.parent {
            let removed = parent.links.lock().children.remove(&self.id).is_some();
            if removed {
                parent.outstanding.send_modify(|n| *n = n.saturating_sub(1));
            }
        }
        self.finished.send_replace(true);
    }
}

/// A scope owned by exactly one task.
pub struct Context {
    node: Arc<Node>,
    done: bool,
}

/// Supervisor handle to a [`Context`].
#[derive(Clone)]
pub struct ContextCtl {
    node: Arc<Node>,
}

impl Context {
    /// A new root context.
    #[must_use]
    pub fn root(name: impl Into<String>) -> (Self, ContextCtl) {
        Self::wrap(Node::new(0, name.into(), None))
    }

    fn wrap(node: Arc<Node>) -> (Self, ContextCtl) {
        let ctl = ContextCtl {
            node: Arc::clone(&node),
        };
        (Self { node, done: false }, ctl)
    }

    /// Create a child scope.
    ///
    /// Fails with [`JobberError::ContextClosed`] if this context is
    /// cancelled or finishing.
    pub fn make_child(&self) -> Result<(Self, ContextCtl)> {
        let mut links = self.node.links.lock();
        if links.closed {
            return Err(JobberError::ContextClosed);
        }
        links.next_child += 1;
        let id = links.next_child;
        let child = Node::new(
            id,
            format!("{}.{id}", self.node.name),
            Some(Arc::clone(&self.node)),
        );
        links.children.insert(id, Arc::downgrade(&child));
        self.node.outstanding.send_modify(|n| *n += 1);
        drop(links);
        Ok(Self::wrap(child))
    }

    /// Create a child scope that cancels itself after `timeout`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn make_child_with_timeout(&self, timeout: Duration) -> Result<(Self, ContextCtl)> {
        let (child, ctl) = self.make_child()?;
        let timer = ctl.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(timeout) => {
                    trace!(context = %timer.name(), "context deadline reached");
                    timer.cancel();
                }
                () = timer.wait_for_finish() => {}
            }
        });
        Ok((child, ctl))
    }

    /// Diagnostic name (`parent.N` for children).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// A supervisor handle for this context.
    #[must_use]
    pub fn ctl(&self) -> ContextCtl {
        ContextCtl {
            node: Arc::clone(&self.node),
        }
    }

    /// Cancel this context and all of its descendants.
    pub fn cancel(&self) {
        self.node.cancel();
    }

    /// Whether this context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.node.is_cancelled()
    }

    /// Resolve once this context is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.node.cancelled.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|c| *c).await;
    }

    /// Number of children that have not finished.
    #[must_use]
    pub fn outstanding_children(&self) -> usize {
        *self.node.outstanding.borrow()
    }

    /// Wait until every child created so far has finished, without finishing
    /// this context.
    pub async fn wait_for_children(&self) {
        let mut rx = self.node.outstanding.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Finish this context: refuse new children, wait for existing children
    /// to finish, detach from the parent and wake waiters.
    pub async fn finish(mut self) {
        self.node.links.lock().closed = true;
        self.wait_for_children().await;
        self.node.detach();
        self.done = true;
        trace!(context = %self.node.name, "context finished");
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        error!(context = %self.node.name, "context dropped without finish");
        self.node.links.lock().closed = true;
        self.node.detach();
        debug_assert!(
            std::thread::panicking(),
            "context {} dropped without finish",
            self.node.name
        );
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.node.name)
            .field("cancelled", &self.node.is_cancelled())
            .field("outstanding", &self.outstanding_children())
            .finish()
    }
}

impl ContextCtl {
    /// Diagnostic name of the context.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Cancel the context and all of its descendants. Idempotent; does not
    /// wait for anything to finish.
    pub fn cancel(&self) {
        self.node.cancel();
    }

    /// Whether the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.node.is_cancelled()
    }

    /// Whether the context has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.node.is_finished()
    }

    /// Resolve once the context has finished.
    pub async fn wait_for_finish(&self) {
        let mut rx = self.node.finished.subscribe();
        let _ = rx.wait_for(|f| *f).await;
    }
}

impl std::fmt::Debug for ContextCtl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextCtl")
            .field("name", &self.node.name)
            .field("cancelled", &self.node.is_cancelled())
            .field("finished", &self.node.is_finished())
            .finish()
    }
}
