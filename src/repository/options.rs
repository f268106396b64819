use crate::store::Merge;

/// Options for reads. `timestamps` turns stored timestamps back into dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub timestamps: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { timestamps: true }
    }
}

/// Options for `add` and `update`. `timestamps` injects the creation and
/// modification fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub timestamps: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { timestamps: true }
    }
}

/// Options for `set`: timestamp injection plus how to combine with an
/// existing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOptions {
    pub timestamps: bool,
    pub merge: Merge,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            timestamps: true,
            merge: Merge::None,
        }
    }
}

impl SetOptions {
    pub fn merge(mut self, merge: Merge) -> Self {
        self.merge = merge;
        self
    }

    pub fn merge_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.merge(Merge::Fields(fields.into_iter().map(Into::into).collect()))
    }
}

impl From<WriteOptions> for SetOptions {
    fn from(options: WriteOptions) -> Self {
        Self {
            timestamps: options.timestamps,
            merge: Merge::None,
        }
    }
}
