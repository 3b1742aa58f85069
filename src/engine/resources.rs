//! Keyed store for process-wide singleton values shared among systems.
//!
//! Two storage modes exist:
//!
//! * **By value** — the store owns the instance. `get`/`get_mut` hand out
//!   references to that canonical instance, so mutations through the
//!   returned handle are observed by every later reader. Re-inserting the
//!   same type replaces the instance.
//! * **By reference** — the store records a pointer to an externally
//!   owned value (a graphics context, for example) under an unsafe
//!   insertion contract.
//!
//! Execution is single-threaded (one scheduler thread drives all
//! systems), so no locking is performed. A system reading an absent
//! resource receives `None` and is expected to skip its frame rather
//! than fail.

use std::any::{Any, TypeId};
use std::ptr::NonNull;

use fnv::FnvHashMap;


/// Container of by-value and by-reference singletons, keyed by type.
#[derive(Default)]
pub struct ResourceStore {
    values: FnvHashMap<TypeId, Box<dyn Any>>,
    references: FnvHashMap<TypeId, NonNull<()>>,
}

impl ResourceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an owned resource, replacing any previous instance of `T`.
    pub fn insert<T: 'static + Send + Sync>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns the canonical instance of `T`, if present.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Returns the canonical instance of `T` mutably.
    ///
    /// Mutations through this handle are visible to all later `get`
    /// calls; the store never hands out copies.

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<T>())
    }

    /// Removes and returns the owned instance of `T`.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Returns `true` if an owned instance of `T` is present.
    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    /// Records a reference to an externally owned resource.
    ///
    /// ## Safety
    /// The caller guarantees that `value` outlives every subsequent
    /// [`get_ref`](Self::get_ref) call for `T` — in practice, that the
    /// referent lives for the whole time it is registered and is removed
    /// with [`remove_ref`](Self::remove_ref) before it is dropped. The
    /// caller must also not mutate the referent while borrows obtained
    /// through `get_ref` are live.

    pub unsafe fn insert_ref<T: 'static>(&mut self, value: &T) {
        let ptr = NonNull::from(value).cast::<()>();
        self.references.insert(TypeId::of::<T>(), ptr);
    }

    /// Returns the externally owned resource registered for `T`.
    pub fn get_ref<T: 'static>(&self) -> Option<&T> {
        self.references
            .get(&TypeId::of::<T>())
            .map(|ptr| unsafe { ptr.cast::<T>().as_ref() })
    }

    /// Unregisters the external reference for `T`.
    pub fn remove_ref<T: 'static>(&mut self) -> bool {
        self.references.remove(&TypeId::of::<T>()).is_some()
    }

    /// Drops every owned resource and unregisters every reference.
    pub fn clear(&mut self) {
        self.values.clear();
        self.references.clear();
    }
}
