//! Container markup carried through a load/save cycle without interpretation

/// Worksheet elements the model has no type for
///
/// A reader fills this with top-level worksheet children it does not
/// interpret (sheet views, protection, print setup, ...) and a writer puts
/// them back in place. Fragments are opaque: row and column edits do not
/// rewrite references inside them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreservedMarkup {
    /// Namespace declarations (and `mc:Ignorable`) of the root element that
    /// the fragments may rely on, as `(attribute, value)`
    pub root_attributes: Vec<(String, String)>,
    /// Top-level elements in file order, as `(local name, serialized XML)`
    pub elements: Vec<(String, String)>,
}

impl PreservedMarkup {
    /// Whether nothing was carried over
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Names of the carried elements, in file order
    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|(name, _)| name.as_str())
    }
}
