// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Toast queue with TTL + dedupe, used to surface poll failures and lifecycle
//! problems without interrupting the render loop.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// Informational note.
    Info,
    /// Warning that may need attention.
    Warn,
    /// Error requiring user awareness.
    Error,
}

/// Subsystem that raised the toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastOrigin {
    /// Data poller (fetch/decode failures).
    Poller,
    /// Scene / renderer lifecycle.
    Scene,
    /// Config store.
    Config,
}

/// Identifier for a toast entry.
pub type ToastId = u64;

#[derive(Debug, Clone)]
struct Toast {
    id: ToastId,
    kind: ToastKind,
    origin: ToastOrigin,
    title: String,
    body: Option<String>,
    ttl: Duration,
    created: Instant,
    repeats: u32,
}

/// Rendering-friendly view of a toast.
#[derive(Debug, Clone)]
pub struct ToastRender {
    /// Stable identifier.
    pub id: ToastId,
    /// Severity.
    pub kind: ToastKind,
    /// Raising subsystem.
    pub origin: ToastOrigin,
    /// Short title line.
    pub title: String,
    /// Optional body text.
    pub body: Option<String>,
    /// How many times this toast was re-raised while visible.
    pub repeats: u32,
    /// 1.0 -> just created, 0.0 -> expired.
    pub progress: f32,
}

/// In-memory toast queue with TTL and a dedupe window.
///
/// Re-raising a toast with the same kind/origin/title inside the dedupe window
/// refreshes the existing entry and bumps its repeat counter instead of
/// stacking duplicates; a failing poller at 1 Hz therefore shows one toast.
pub struct ToastService {
    queue: VecDeque<Toast>,
    max: usize,
    dedupe_window: Duration,
    next_id: ToastId,
}

impl ToastService {
    /// Create a new queue holding at most `max` toasts.
    pub fn new(max: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max: max.max(1),
            dedupe_window: Duration::from_secs(5),
            next_id: 1,
        }
    }

    /// Push a toast, folding it into a matching recent entry when possible.
    pub fn push<S, B>(
        &mut self,
        kind: ToastKind,
        origin: ToastOrigin,
        title: S,
        body: B,
        ttl: Duration,
        now: Instant,
    ) -> ToastId
    where
        S: Into<String>,
        B: Into<Option<String>>,
    {
        let title = title.into();
        let body = body.into();
        let window = self.dedupe_window;

        if let Some(existing) = self.queue.iter_mut().find(|t| {
            t.kind == kind
                && t.origin == origin
                && t.title == title
                && now.saturating_duration_since(t.created) <= window.max(t.ttl)
        }) {
            existing.created = now;
            existing.ttl = ttl;
            existing.body = body;
            existing.repeats = existing.repeats.saturating_add(1);
            return existing.id;
        }

        let id = self.next_id;
        self.next_id += 1;
        if self.queue.len() == self.max {
            self.queue.pop_front();
        }
        self.queue.push_back(Toast {
            id,
            kind,
            origin,
            title,
            body,
            ttl,
            created: now,
            repeats: 0,
        });
        id
    }

    /// Drop expired toasts (call once per frame).
    pub fn retain_visible(&mut self, now: Instant) {
        self.queue
            .retain(|t| now.saturating_duration_since(t.created) < t.ttl);
    }

    /// Number of queued toasts (visible or not yet pruned).
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Return render-ready toasts with progress ratios.
    pub fn visible(&self, now: Instant) -> Vec<ToastRender> {
        self.queue
            .iter()
            .filter(|t| now.saturating_duration_since(t.created) < t.ttl)
            .map(|t| {
                let age = now.saturating_duration_since(t.created).as_secs_f32();
                ToastRender {
                    id: t.id,
                    kind: t.kind,
                    origin: t.origin,
                    title: t.title.clone(),
                    body: t.body.clone(),
                    repeats: t.repeats,
                    progress: 1.0 - age / t.ttl.as_secs_f32().max(f32::EPSILON),
                }
            })
            .collect()
    }
}
