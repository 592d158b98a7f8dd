use std::ops::{Deref, DerefMut};

/// Lifecycle hooks for a per-frame controller.
///
/// `Ctx` is whatever the owner hands in each frame (world, camera, input...).
/// Ordering is enforced by [`Script`], not by implementors: `on_initialize`
/// runs before the first `on_start`, and `on_start` before the first
/// `on_update`.
pub trait ScriptComponent<Ctx: ?Sized> {
    fn name(&self) -> &str;

    fn on_initialize(&mut self, _ctx: &mut Ctx) {}

    fn on_start(&mut self, _ctx: &mut Ctx) {}

    fn on_update(&mut self, ctx: &mut Ctx, dt: f32);

    fn on_stop(&mut self, _ctx: &mut Ctx) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Initialized,
    Running,
    Stopped,
}

/// Owns a component and drives its hooks in order.
///
/// Derefs to the component so owners can reach its accessors directly.
#[derive(Debug)]
pub struct Script<T> {
    inner: T,
    phase: Phase,
}

impl<T> Script<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            phase: Phase::Created,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run `on_initialize` now if it has not run yet.
    pub fn initialize<Ctx: ?Sized>(&mut self, ctx: &mut Ctx)
    where
        T: ScriptComponent<Ctx>,
    {
        if self.phase == Phase::Created {
            tracing::debug!(component = self.inner.name(), "initialize");
            self.inner.on_initialize(ctx);
            self.phase = Phase::Initialized;
        }
    }

    /// One frame: catch up on pending hooks, then `on_update`.
    /// A stopped script is inert.
    pub fn update<Ctx: ?Sized>(&mut self, ctx: &mut Ctx, dt: f32)
    where
        T: ScriptComponent<Ctx>,
    {
        if self.phase == Phase::Stopped {
            return;
        }
        self.initialize(ctx);
        if self.phase == Phase::Initialized {
            tracing::debug!(component = self.inner.name(), "start");
            self.inner.on_start(ctx);
            self.phase = Phase::Running;
        }
        self.inner.on_update(ctx, dt);
    }

    pub fn stop<Ctx: ?Sized>(&mut self, ctx: &mut Ctx)
    where
        T: ScriptComponent<Ctx>,
    {
        if self.phase == Phase::Running {
            tracing::debug!(component = self.inner.name(), "stop");
            self.inner.on_stop(ctx);
        }
        self.phase = Phase::Stopped;
    }
}

impl<T> Deref for Script<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for Script<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}
