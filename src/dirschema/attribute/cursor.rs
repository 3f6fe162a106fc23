use super::container::Attribute;
use super::value::AttrValue;

/// Forward-only position cursor over an attribute's slots.
///
/// The cursor walks slot positions from 0 and stops at the first empty slot,
/// so on an attribute with holes (after a removal, before the next reindex)
/// iteration ends early. Use [`Attribute::iter`] to visit every present value.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    attribute: &'a Attribute,
    position: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(attribute: &'a Attribute) -> Self {
        Self {
            attribute,
            position: 0,
        }
    }

    /// Restart from the first slot.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Whether a value is present at the current position.
    pub fn valid(&self) -> bool {
        self.attribute.exists(self.position)
    }

    pub fn key(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> Option<&'a AttrValue> {
        self.attribute.get(self.position)
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = (usize, &'a AttrValue);

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.current()?;
        let key = self.position;
        self.position += 1;
        Some((key, value))
    }
}
