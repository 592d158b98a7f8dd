//! Publish/subscribe primitives for state-change notification.

/// A list of listener closures. `emit` calls every listener in connection order.
pub struct Signal<T> {
    listeners: Vec<Box<dyn FnMut(&T)>>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self { listeners: Vec::new() }
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, listener: impl FnMut(&T) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, value: &T) {
        for listener in &mut self.listeners {
            listener(value);
        }
    }

    pub fn disconnect_all(&mut self) {
        self.listeners.clear();
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A value with batched change notification.
///
/// `set` only stores the value. Listeners run from `update`, once per
/// frame at most, and only if the value changed since the previous `update`.
#[derive(Debug)]
pub struct InputStateProperty<T: Clone + PartialEq> {
    value: T,
    /// Value as of the last `update`.
    notified: T,
    changed: Signal<T>,
}

impl<T: Clone + PartialEq> InputStateProperty<T> {
    pub fn new(value: T) -> Self {
        Self {
            notified: value.clone(),
            value,
            changed: Signal::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    pub fn connect(&mut self, listener: impl FnMut(&T) + 'static) {
        self.changed.connect(listener);
    }

    /// Notify listeners if the value differs from the one seen at the previous
    /// `update`. Returns whether a notification went out.
    pub fn update(&mut self) -> bool {
        if self.value == self.notified {
            return false;
        }
        self.notified = self.value.clone();
        self.changed.emit(&self.value);
        true
    }
}
