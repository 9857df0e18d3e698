//! Value-or-absent wrapper tagged with the index of the original input element.

/// A pipeline entry: either a value or an explicit gap, both carrying an argument id.
///
/// The id is the zero-based position of the *original* input element this entry descends
/// from. Within one stream ids never decrease; they may repeat (one input spawned several
/// candidates) or skip ahead (an input spawned nothing).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaggedOption<T> {
    Value(T, usize),
    Empty(usize),
}

impl<T> TaggedOption<T> {
    pub fn value(value: T, id: usize) -> Self {
        Self::Value(value, id)
    }

    pub fn empty(id: usize) -> Self {
        Self::Empty(id)
    }

    /// Argument id of this entry.
    pub fn id(&self) -> usize {
        match self {
            Self::Value(_, id) | Self::Empty(id) => *id,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(v, _) => Some(v),
            Self::Empty(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(v, _) => Some(v),
            Self::Empty(_) => None,
        }
    }

    /// Same entry with a different id.
    #[must_use]
    pub fn with_id(self, id: usize) -> Self {
        match self {
            Self::Value(v, _) => Self::Value(v, id),
            Self::Empty(_) => Self::Empty(id),
        }
    }

    /// Drop the value but keep the position accounted for.
    #[must_use]
    pub fn to_empty(&self) -> Self {
        Self::Empty(self.id())
    }
}
