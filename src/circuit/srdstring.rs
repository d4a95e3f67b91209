use std::{borrow::Borrow, collections::HashSet, hash::{Hash, Hasher}, sync::{Arc, LazyLock, RwLock}};
use serde::{Serialize, Serializer};

/// Interned, cheaply clonable signal/cell name.
#[derive(Debug, Clone)]
pub struct ShrString(Arc<str>);

static POOL: LazyLock<RwLock<HashSet<Arc<str>>>> = LazyLock::new(|| {
    RwLock::new(HashSet::new())
});

impl ShrString {
    pub fn new(s: &str) -> Self {
        if let Some(existing) = POOL.read().ok().and_then(|pool| pool.get(s).cloned()) {
            return Self(existing);
        }

        let arc: Arc<str> = Arc::from(s);
        if let Ok(mut pool) = POOL.write() {
            // another thread may have interned it meanwhile
            if let Some(existing) = pool.get(s) {
                return Self(existing.clone());
            }
            pool.insert(arc.clone());
        }
        Self(arc)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ShrString {
    fn default() -> Self {
        Self::new("")
    }
}

impl std::ops::Deref for ShrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ShrString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq for ShrString {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for ShrString {}

impl PartialOrd for ShrString {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ShrString {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Hash for ShrString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialEq<&str> for ShrString {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl PartialEq<ShrString> for &str {
    fn eq(&self, other: &ShrString) -> bool {
        *self == &*other.0
    }
}

impl PartialEq<String> for ShrString {
    fn eq(&self, other: &String) -> bool {
        &*self.0 == other.as_str()
    }
}

impl From<&str> for ShrString {
    fn from(s: &str) -> Self {
        ShrString::new(s)
    }
}

impl From<String> for ShrString {
    fn from(s: String) -> Self {
        ShrString::new(&s)
    }
}

impl From<&ShrString> for ShrString {
    fn from(s: &ShrString) -> Self {
        s.clone()
    }
}

impl Borrow<str> for ShrString {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for ShrString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[macro_export]
macro_rules! format_shr {
    ($($arg:tt)*) => {{
        $crate::circuit::ShrString::from(format!($($arg)*))
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interned_strings_share_storage() {
        let a = ShrString::new("wl_0_3");
        let b: ShrString = format!("wl_{}_{}", 0, 3).into();
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, "wl_0_3");
    }
}
