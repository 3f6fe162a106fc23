//! # Attribute Container
//!
//! An [`Attribute`] holds the value(s) of one directory attribute and enforces
//! the attribute's schema while doing so:
//!
//! | Schema says | Effect |
//! |-------------|--------|
//! | single-valued | at most one value, ever |
//! | constructed | `add`, `remove`, `set`, `set_at`, `unset`, `clear` all fail |
//! | DN syntax | [`Attribute::is_resolvable`] is true |
//! | (no schema) | multi-valued, mutable, not resolvable |
//!
//! ## Change Tracking
//!
//! An attribute may be bound to an owner implementing
//! [`ChangeTracker`](crate::directory::ChangeTracker). The owner is held
//! weakly and is told about every successful mutation except silent loads
//! ([`Attribute::add_silent`], used during construction). Clones are never
//! bound.
//!
//! ## Usage
//!
//! ```ignore
//! let mut attr = Attribute::builder("memberOf")
//!     .values(vec!["CN=Admins,DC=example,DC=com"])
//!     .owner(&object)
//!     .build(&store)?;
//!
//! attr.add("CN=Users,DC=example,DC=com")?;   // owner notified
//! attr.remove(Selector::Index(0))?;          // slot 0 emptied
//! let values = attr.values();                // compacted: one value at 0
//! ```

mod container;
mod cursor;
mod value;

pub use container::{Attribute, AttributeBuilder, Selector};
pub use cursor::Cursor;
pub use value::{AttrValue, IntoValues};
