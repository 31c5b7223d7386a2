use std::{
    collections::{HashMap, HashSet},
    mem,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        value::{core::Value, function::Function},
    },
};

static NEXT_ARENA: AtomicU64 = AtomicU64::new(1);

/// Retained frames tolerated before [`Environment::push`] sweeps them.
const SWEEP_THRESHOLD: usize = 64;

/// Identifies one [`Environment`] arena.
///
/// Closures and modules record the arena their frame lives in, so a value
/// that travels to another process can be recognized as foreign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaId(u64);

impl ArenaId {
    fn next() -> Self {
        Self(NEXT_ARENA.fetch_add(1, Ordering::Relaxed))
    }
}

/// Index of a frame in an [`Environment`].
///
/// The generation guards against a released slot being reused: a stale id
/// never resolves to the frame that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId {
    index:      u32,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
struct Frame {
    store:     HashMap<String, Value>,
    immutable: HashSet<String>,
    outer:     Option<FrameId>,
    /// Still in scope: not yet passed to `release`.
    open:      bool,
    /// Never reclaimed (globals, modules).
    pinned:    bool,
    /// Live frames whose `outer` is this one.
    children:  usize,
    /// Closures created in this frame.
    closures:  Vec<Weak<Function>>,
}

impl Frame {
    /// Returns `true` if some closure of this frame is referenced from
    /// anywhere other than this frame's own bindings.
    fn has_live_closures(&self) -> bool {
        self.closures.iter().any(|closure| {
                                let Some(function) = closure.upgrade() else {
                                    return false;
                                };
                                let own = self.store
                                              .values()
                                              .filter(|v| matches!(v, Value::Function(f) if Arc::ptr_eq(f, &function)))
                                              .count();
                                Arc::strong_count(&function) > own + 1
                            })
    }

    fn reclaimable(&self) -> bool {
        !self.open && !self.pinned && self.children == 0 && !self.has_live_closures()
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    frame:      Option<Frame>,
}

/// The frames of one evaluator, stored in an arena and linked by index.
///
/// Every frame points at its enclosing frame by [`FrameId`]. Closures hold
/// the id of the frame they were created in, which breaks the reference
/// cycle between frames and the functions stored in them.
///
/// A frame is reclaimed once it is out of scope, no live frame encloses
/// through it and none of its closures is reachable from outside the frame
/// itself. Frames that are out of scope but still needed are retained and
/// swept again as allocation goes on.
///
/// Each evaluator owns its arena outright; a spawned process works on a
/// [`snapshot`](Self::snapshot), which keeps every frame id valid while
/// sharing nothing with the parent.
#[derive(Debug, Clone)]
pub struct Environment {
    id:       ArenaId,
    lineage:  Vec<ArenaId>,
    slots:    Vec<Slot>,
    free:     Vec<u32>,
    retained: Vec<FrameId>,
    sweep_at: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Creates an empty arena with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        let id = ArenaId::next();
        Self { id,
               lineage: vec![id],
               slots: Vec::new(),
               free: Vec::new(),
               retained: Vec::new(),
               sweep_at: SWEEP_THRESHOLD }
    }

    /// The id of this arena.
    #[must_use]
    pub const fn id(&self) -> ArenaId {
        self.id
    }

    /// Returns `true` if frames recorded against `arena` are valid here:
    /// either this arena or one it was snapshotted from.
    #[must_use]
    pub fn owns(&self, arena: ArenaId) -> bool {
        self.lineage.contains(&arena)
    }

    /// Allocates a new frame enclosed by `outer`.
    pub fn push(&mut self, outer: Option<FrameId>) -> FrameId {
        if let Some(f) = outer.and_then(|id| self.frame_mut(id)) {
            f.children += 1;
        }
        if self.retained.len() >= self.sweep_at {
            self.collect();
        }

        let frame = Frame { outer,
                            open: true,
                            ..Frame::default() };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.frame = Some(frame);
            return FrameId { index,
                             generation: slot.generation };
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot { generation: 0,
                               frame:      Some(frame), });
        FrameId { index,
                  generation: 0 }
    }

    /// Takes `frame` out of scope. It is reclaimed right away unless a
    /// closure or an enclosed frame still needs it. Stale ids are ignored.
    pub fn release(&mut self, frame: FrameId) {
        let Some(f) = self.frame_mut(frame) else {
            return;
        };
        f.open = false;
        if f.reclaimable() {
            self.reclaim(frame);
        } else {
            self.retained.push(frame);
        }
    }

    /// Keeps `frame` and everything enclosing it for the arena's lifetime.
    pub fn pin(&mut self, frame: FrameId) {
        if let Some(f) = self.frame_mut(frame) {
            f.pinned = true;
        }
    }

    /// Records that `function` closes over `frame`, keeping the frame alive
    /// for as long as the function is reachable.
    pub fn capture(&mut self, frame: FrameId, function: &Arc<Function>) {
        if let Some(f) = self.frame_mut(frame)
           && !f.pinned
        {
            f.closures.retain(|c| c.strong_count() > 0);
            f.closures.push(Arc::downgrade(function));
        }
    }

    /// Reclaims every retained frame that is no longer needed.
    pub fn collect(&mut self) {
        loop {
            let retained = mem::take(&mut self.retained);
            let mut reclaimed = false;
            for &id in &retained {
                if self.frame(id).is_some_and(Frame::reclaimable) {
                    self.reclaim(id);
                    reclaimed = true;
                }
            }
            self.retained = retained.into_iter().filter(|&id| self.is_live(id)).collect();
            if !reclaimed {
                break;
            }
        }
        self.sweep_at = (self.retained.len() * 2).max(SWEEP_THRESHOLD);
    }

    /// Frees `id`, then any enclosing frame that was only kept for it.
    fn reclaim(&mut self, id: FrameId) {
        let mut next = Some(id);
        while let Some(id) = next.take() {
            let Some(slot) = self.slots.get_mut(id.index as usize) else {
                break;
            };
            if slot.generation != id.generation {
                break;
            }
            let Some(frame) = slot.frame.take() else {
                break;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);

            if let Some(outer) = frame.outer {
                if let Some(f) = self.frame_mut(outer) {
                    f.children = f.children.saturating_sub(1);
                }
                if self.frame(outer).is_some_and(Frame::reclaimable) {
                    next = Some(outer);
                }
            }
        }
    }

    /// Returns `true` if `frame` still refers to a live frame.
    #[must_use]
    pub fn is_live(&self, frame: FrameId) -> bool {
        self.frame(frame).is_some()
    }

    /// Looks `name` up, starting at `frame` and walking outwards.
    #[must_use]
    pub fn get(&self, frame: FrameId, name: &str) -> Option<Value> {
        self.chain(frame).find_map(|f| f.store.get(name).cloned())
    }

    /// Rebinds `name` in the innermost frame that defines it, or creates it in
    /// `frame` if no frame does.
    ///
    /// # Errors
    /// Returns a `NameError` if the defining frame marks `name` immutable, or
    /// if `frame` is no longer live.
    pub fn set(&mut self, frame: FrameId, name: &str, value: Value) -> EvalResult<()> {
        let target = self.defining_frame(frame, name).unwrap_or(frame);
        let slot = self.frame_mut(target)
                       .ok_or_else(|| RuntimeError::name("scope is no longer live"))?;
        if slot.immutable.contains(name) {
            return Err(immutable_error(name));
        }
        slot.store.insert(name.to_string(), value);
        Ok(())
    }

    /// Binds `name` directly in `frame`, shadowing outer bindings.
    ///
    /// # Errors
    /// Returns a `NameError` if `frame` already holds an immutable binding
    /// for `name`, or if `frame` is no longer live.
    pub fn declare(&mut self, frame: FrameId, name: &str, value: Value) -> EvalResult<()> {
        let slot = self.frame_mut(frame)
                       .ok_or_else(|| RuntimeError::name("scope is no longer live"))?;
        if slot.immutable.contains(name) {
            return Err(immutable_error(name));
        }
        slot.store.insert(name.to_string(), value);
        Ok(())
    }

    /// Binds `name` in `frame` without any immutability check. Used for
    /// builtins, parameters and loop variables, whose frames are fresh.
    pub fn define(&mut self, frame: FrameId, name: &str, value: Value) {
        if let Some(f) = self.frame_mut(frame) {
            f.store.insert(name.to_string(), value);
        }
    }

    /// Marks `name` immutable in `frame`.
    pub fn mark_immutable(&mut self, frame: FrameId, name: &str) {
        if let Some(f) = self.frame_mut(frame) {
            f.immutable.insert(name.to_string());
        }
    }

    /// Returns `true` if the innermost frame defining `name`, as seen from
    /// `frame`, marks it immutable. Shadowing bindings are judged on their
    /// own.
    #[must_use]
    pub fn is_immutable(&self, frame: FrameId, name: &str) -> bool {
        self.defining_frame(frame, name)
            .and_then(|id| self.frame(id))
            .is_some_and(|f| f.immutable.contains(name))
    }

    /// Returns `true` if `frame` itself marks `name` immutable.
    #[must_use]
    pub fn is_immutable_local(&self, frame: FrameId, name: &str) -> bool {
        self.frame(frame).is_some_and(|f| f.immutable.contains(name))
    }

    /// Removes `name` from `frame` only; outer frames are untouched.
    pub fn remove(&mut self, frame: FrameId, name: &str) -> Option<Value> {
        let f = self.frame_mut(frame)?;
        f.immutable.remove(name);
        f.store.remove(name)
    }

    /// Returns `true` if `frame` itself binds `name`.
    #[must_use]
    pub fn contains_local(&self, frame: FrameId, name: &str) -> bool {
        self.frame(frame).is_some_and(|f| f.store.contains_key(name))
    }

    /// The bindings of `frame` itself, sorted by name.
    #[must_use]
    pub fn bindings(&self, frame: FrameId) -> Vec<(String, Value)> {
        let mut bindings = self.frame(frame)
                               .map(|f| {
                                   f.store
                                    .iter()
                                    .map(|(k, v)| (k.clone(), v.clone()))
                                    .collect::<Vec<_>>()
                               })
                               .unwrap_or_default();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    /// Deep-copies the arena under a new id.
    ///
    /// Frame ids minted by `self` stay valid in the copy, and the copy
    /// [`owns`](Self::owns) everything `self` owns.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        let id = ArenaId::next();
        let mut lineage = self.lineage.clone();
        lineage.push(id);
        Self { id,
               lineage,
               slots: self.slots.clone(),
               free: self.free.clone(),
               retained: self.retained.clone(),
               sweep_at: self.sweep_at }
    }

    /// Number of live frames.
    #[must_use]
    pub fn live_frames(&self) -> usize {
        self.slots.iter().filter(|s| s.frame.is_some()).count()
    }

    fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.frame.as_ref())
    }

    fn frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.frame.as_mut())
    }

    fn chain(&self, start: FrameId) -> impl Iterator<Item = &Frame> {
        let mut next = self.frame(start);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.outer.and_then(|id| self.frame(id));
            Some(current)
        })
    }

    fn defining_frame(&self, start: FrameId, name: &str) -> Option<FrameId> {
        let mut current = Some(start);
        while let Some(id) = current {
            let frame = self.frame(id)?;
            if frame.store.contains_key(name) {
                return Some(id);
            }
            current = frame.outer;
        }
        None
    }
}

fn immutable_error(name: &str) -> RuntimeError {
    RuntimeError::name(format!("cannot assign to immutable binding '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::evaluator::core::Evaluator;

    #[test]
    fn set_updates_the_defining_frame() {
        let mut env = Environment::new();
        let outer = env.push(None);
        let inner = env.push(Some(outer));
        env.declare(outer, "x", Value::Integer(1)).unwrap();
        env.set(inner, "x", Value::Integer(2)).unwrap();
        assert!(!env.contains_local(inner, "x"));
        assert!(matches!(env.get(outer, "x"), Some(Value::Integer(2))));
    }

    #[test]
    fn released_ids_go_stale() {
        let mut env = Environment::new();
        let root = env.push(None);
        let call = env.push(Some(root));
        env.release(call);
        let reused = env.push(Some(root));
        assert!(!env.is_live(call));
        assert!(env.is_live(reused));
    }

    #[test]
    fn enclosing_frames_outlive_their_children() {
        let mut env = Environment::new();
        let root = env.push(None);
        let call = env.push(Some(root));
        let block = env.push(Some(call));
        env.pin(block);
        env.release(call);
        assert!(env.is_live(call));
        env.release(block);
        env.collect();
        assert!(env.is_live(block) && env.is_live(call));
    }

    #[test]
    fn released_parents_go_with_their_last_child() {
        let mut env = Environment::new();
        let root = env.push(None);
        let call = env.push(Some(root));
        let block = env.push(Some(call));
        env.release(call);
        assert!(env.is_live(call));
        env.release(block);
        assert!(!env.is_live(block));
        assert!(!env.is_live(call));
        assert_eq!(env.live_frames(), 1);
    }

    fn evaluator_with(source: &str) -> Evaluator {
        let mut evaluator = Evaluator::default();
        evaluator.run(source, "test").unwrap();
        evaluator
    }

    #[test]
    fn discarded_closures_release_their_frames() {
        let mut evaluator = evaluator_with("fun mk(x) { fun() { x } }");
        let baseline = evaluator.env.live_frames();
        evaluator.run("var i = 0\nfor i < 1000 { mk(i); i += 1 }", "test").unwrap();
        assert_eq!(evaluator.env.live_frames(), baseline);
    }

    #[test]
    fn reachable_closures_keep_their_frames() {
        let mut evaluator = evaluator_with("fun mk(x) { fun() { x } }");
        let baseline = evaluator.env.live_frames();
        evaluator.run("val f = mk(7)\nvar i = 0\nfor i < 200 { mk(i); i += 1 }", "test").unwrap();
        assert_eq!(evaluator.env.live_frames(), baseline + 1);
        let v = evaluator.run("f()", "test").unwrap();
        assert_eq!(v.as_i64(), Some(7));
    }

    #[test]
    fn self_referencing_local_functions_do_not_leak() {
        let mut evaluator = Evaluator::default();
        let baseline = evaluator.env.live_frames();
        let v = evaluator.run("fun outer() { fun inner(n) { if n == 0 { 0 } else { inner(n - 1) } }; inner(3) }\nouter()",
                              "test")
                         .unwrap();
        assert_eq!(v.as_i64(), Some(0));
        assert_eq!(evaluator.env.live_frames(), baseline);
    }

    #[test]
    fn snapshots_are_independent() {
        let mut env = Environment::new();
        let root = env.push(None);
        env.declare(root, "x", Value::Integer(1)).unwrap();
        let mut copy = env.snapshot();
        copy.set(root, "x", Value::Integer(5)).unwrap();
        assert!(matches!(env.get(root, "x"), Some(Value::Integer(1))));
        assert!(copy.owns(env.id()));
        assert!(!env.owns(copy.id()));
    }

    #[test]
    fn immutability_follows_the_defining_frame() {
        let mut env = Environment::new();
        let root = env.push(None);
        let inner = env.push(Some(root));
        env.declare(root, "x", Value::Integer(1)).unwrap();
        env.mark_immutable(root, "x");
        assert!(env.is_immutable(inner, "x"));
        assert!(!env.is_immutable_local(inner, "x"));
        assert!(env.set(inner, "x", Value::Integer(2)).is_err());

        env.define(inner, "x", Value::Integer(3));
        assert!(!env.is_immutable(inner, "x"));
        env.set(inner, "x", Value::Integer(4)).unwrap();
        assert!(matches!(env.get(root, "x"), Some(Value::Integer(1))));
    }
}
