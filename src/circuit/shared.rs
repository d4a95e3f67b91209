use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared handle used for every node of the circuit graph.
pub struct Shr<T: ?Sized> {
    inner: Arc<RwLock<T>>,
}

impl<T> Shr<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }
}

impl<T: ?Sized> Shr<T> {
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        // ignore poisoning
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        // ignore poisoning
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: ?Sized> Clone for Shr<T> {
    fn clone(&self) -> Self {
        Shr {
            inner: Arc::clone(&self.inner),
        }
    }
}

// Nets and pins point at each other, so only the address is printed.
impl<T: ?Sized> std::fmt::Debug for Shr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Shr({:p})", Arc::as_ptr(&self.inner))
    }
}
