//! Identifier management using string interning.
//!
//! Node, port, label, edge and section identifiers as well as property keys
//! are stored as [`Id`] values, which are cheap to copy, hash and compare.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner shared by every parsed document.
///
/// # Thread Safety
///
/// Access goes through a `Mutex`, so documents may be parsed from several
/// threads at once.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

/// Runs `f` with exclusive access to the global interner.
fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock");
    f(&mut interner)
}

/// Interned identifier.
///
/// # Examples
///
/// ```
/// use elkt_core::identifier::Id;
///
/// let node = Id::new("n1");
/// let port = Id::new("p1");
///
/// assert_eq!(node, "n1");
/// assert_eq!(node.join(port), "n1.p1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from its textual form.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Joins two identifiers with a `.` separator, as in qualified ids
    /// (`parent.child`) and dotted property keys (`elk.direction`).
    ///
    /// # Examples
    ///
    /// ```
    /// use elkt_core::identifier::Id;
    ///
    /// let key = Id::new("elk").join(Id::new("direction"));
    /// assert_eq!(key, "elk.direction");
    /// ```
    pub fn join(&self, child: Id) -> Self {
        let joined = with_interner(|interner| {
            let parent = interner
                .resolve(self.0)
                .expect("Parent ID should exist in interner");
            let child = interner
                .resolve(child.0)
                .expect("Child ID should exist in interner");
            format!("{parent}.{child}")
        });
        Self::new(&joined)
    }

    /// Returns an owned copy of the identifier text.
    pub fn to_text(&self) -> String {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("Symbol should exist in interner")
                .to_owned()
        })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "n1"`
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| interner.resolve(self.0) == Some(other))
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
