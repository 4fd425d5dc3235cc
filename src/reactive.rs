//! A minimal reference reactive engine satisfying the `Signal`/`Memo`
//! contract the incremental pipeline (`crate::pipeline`) is built
//! against.
//!
//! The pipeline is written against this module's types directly rather
//! than against a trait, because the spec treats the reactive engine as
//! an external collaborator *described by its contract*, not as
//! something the core needs to be generic over — any engine satisfying
//! the same `get`/`set`/backdating behavior (salsa, a hand-rolled
//! revision counter, whatever an embedder already has) is a drop-in
//! replacement for this module. This implementation exists so the crate
//! is usable standalone.
//!
//! Dependency tracking works the way most single-threaded reactive
//! engines do it: a `Runtime` keeps a stack of "currently recording"
//! frames, and every `Signal`/`Memo` read pushes itself onto the
//! innermost frame (if any) before returning its value. A `Memo`
//! recomputes only when at least one recorded dependency's `changed_at`
//! no longer matches what was observed during its last computation —
//! and even then, backdates: if the freshly computed value equals the
//! previous one, `changed_at` does not advance, so anything depending on
//! this memo sees no change.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Anything that can report "when did I last actually change" and, for
/// memos, bring itself up to date first.
trait Tracked {
    fn ensure_current(&self);
    fn changed_at(&self) -> u64;
}

struct Dependency {
    tracked: Rc<dyn Tracked>,
    observed_changed_at: u64,
}

/// Owns the revision clock and the dependency-tracking stack for one
/// group of signals/memos.
pub struct Runtime {
    clock: Cell<u64>,
    tracking_stack: RefCell<Vec<RefCell<Vec<Dependency>>>>,
}

impl Runtime {
    pub fn new() -> Rc<Runtime> {
        Rc::new(Runtime { clock: Cell::new(0), tracking_stack: RefCell::new(Vec::new()) })
    }

    fn tick(&self) -> u64 {
        let next = self.clock.get() + 1;
        self.clock.set(next);
        next
    }

    /// The clock's current value — monotonically increases exactly when
    /// some signal or memo actually changes (never on a backdated
    /// recomputation).
    pub fn current_revision(&self) -> u64 {
        self.clock.get()
    }

    fn push_frame(&self) {
        self.tracking_stack.borrow_mut().push(RefCell::new(Vec::new()));
    }

    fn pop_frame(&self) -> Vec<Dependency> {
        self.tracking_stack.borrow_mut().pop().expect("tracking frame stack underflow").into_inner()
    }

    fn record_read(&self, dep: Dependency) {
        if let Some(frame) = self.tracking_stack.borrow().last() {
            frame.borrow_mut().push(dep);
        }
    }
}

/// An input cell.
pub struct Signal<T> {
    runtime: Rc<Runtime>,
    value: RefCell<T>,
    changed_at: Cell<u64>,
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub fn new(runtime: &Rc<Runtime>, init: T) -> Rc<Signal<T>> {
        Rc::new(Signal { runtime: runtime.clone(), value: RefCell::new(init), changed_at: Cell::new(runtime.tick()) })
    }

    /// Read the current value, registering this signal as a dependency
    /// of whatever memo is currently recomputing (if any).
    pub fn get(self: &Rc<Self>) -> T {
        self.runtime.record_read(Dependency { tracked: self.clone(), observed_changed_at: self.changed_at.get() });
        self.value.borrow().clone()
    }

    /// Update the value. A no-op (no revision bump, no dependents
    /// invalidated) when `new_value` equals the current value.
    pub fn set(self: &Rc<Self>, new_value: T) {
        if *self.value.borrow() == new_value {
            return;
        }
        *self.value.borrow_mut() = new_value;
        self.changed_at.set(self.runtime.tick());
        tracing::trace!(revision = self.changed_at.get(), "signal changed");
    }
}

impl<T: 'static> Tracked for Signal<T> {
    fn ensure_current(&self) {}

    fn changed_at(&self) -> u64 {
        self.changed_at.get()
    }
}

/// A cached computation, re-run only when a recorded dependency has
/// actually changed, and backdated when the recomputed value equals the
/// cached one.
pub struct Memo<T> {
    runtime: Rc<Runtime>,
    compute: Box<dyn Fn() -> T>,
    cached: RefCell<Option<T>>,
    deps: RefCell<Vec<Dependency>>,
    changed_at: Cell<u64>,
    /// Number of times `recompute` actually ran the closure; exposed for
    /// tests and instrumentation, not part of the contract.
    recompute_count: Cell<u32>,
}

impl<T: Eq + Clone + 'static> Memo<T> {
    pub fn new(runtime: &Rc<Runtime>, compute: impl Fn() -> T + 'static) -> Rc<Memo<T>> {
        Rc::new(Memo {
            runtime: runtime.clone(),
            compute: Box::new(compute),
            cached: RefCell::new(None),
            deps: RefCell::new(Vec::new()),
            changed_at: Cell::new(runtime.tick()),
            recompute_count: Cell::new(0),
        })
    }

    fn is_stale(&self) -> bool {
        if self.cached.borrow().is_none() {
            return true;
        }
        self.deps.borrow().iter().any(|dep| {
            dep.tracked.ensure_current();
            dep.tracked.changed_at() != dep.observed_changed_at
        })
    }

    fn recompute(&self) {
        self.runtime.push_frame();
        let new_value = (self.compute)();
        let new_deps = self.runtime.pop_frame();
        self.recompute_count.set(self.recompute_count.get() + 1);

        let changed = match self.cached.borrow().as_ref() {
            Some(old) => *old != new_value,
            None => true,
        };
        *self.cached.borrow_mut() = Some(new_value);
        *self.deps.borrow_mut() = new_deps;
        if changed {
            self.changed_at.set(self.runtime.tick());
            tracing::debug!(revision = self.changed_at.get(), "memo recomputed with a changed value");
        } else {
            tracing::debug!("memo recomputed but backdated (value unchanged)");
        }
    }

    /// Force the memo, recomputing only if stale, and register it as a
    /// dependency of the enclosing memo recomputation (if any).
    pub fn get(self: &Rc<Self>) -> T {
        if self.is_stale() {
            self.recompute();
        }
        self.runtime.record_read(Dependency { tracked: self.clone(), observed_changed_at: self.changed_at.get() });
        self.cached.borrow().as_ref().expect("recompute always populates cached").clone()
    }

    /// How many times the closure has actually run. Backdated
    /// recomputations still count here — this tracks closure
    /// executions, not "changed revision" advances.
    pub fn recompute_count(&self) -> u32 {
        self.recompute_count.get()
    }
}

impl<T: Eq + 'static> Tracked for Memo<T> {
    fn ensure_current(&self) {
        if self.is_stale() {
            self.recompute();
        }
    }

    fn changed_at(&self) -> u64 {
        self.changed_at.get()
    }
}
