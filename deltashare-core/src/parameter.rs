use deltashare_math::ParamArray;

/// Ordered collection of named parameter arrays.
///
/// Iteration follows insertion order. That order is what every peer flattens
/// by, so models must register their parameters in the same sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSet {
    entries: Vec<(String, ParamArray)>,
}

/// One training step's gradient, keyed like the model's parameters.
pub type DeltaMap = ParameterSet;

/// Elementwise sum of a round's [`DeltaMap`]s.
pub type AccumulatedDelta = ParameterSet;

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`. A replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, array: ParamArray) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = array,
            None => self.entries.push((name, array)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, array: ParamArray) -> Self {
        self.insert(name, array);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamArray> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParamArray> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamArray)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), a))
    }

    /// Number of named arrays (not elements).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total element count across all arrays.
    pub fn numel(&self) -> usize {
        self.entries.iter().map(|(_, a)| a.len()).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, ParamArray)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (S, ParamArray)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, array) in iter {
            set.insert(name, array);
        }
        set
    }
}

impl IntoIterator for ParameterSet {
    type Item = (String, ParamArray);
    type IntoIter = std::vec::IntoIter<(String, ParamArray)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let set = ParameterSet::new()
            .with("conv.weight", ParamArray::zeros(vec![2, 2]))
            .with("conv.bias", ParamArray::zeros(vec![2]))
            .with("fc.weight", ParamArray::zeros(vec![3]));

        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["conv.weight", "conv.bias", "fc.weight"]);
        assert_eq!(set.numel(), 9);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut set = ParameterSet::new()
            .with("a", ParamArray::scalar(1.0))
            .with("b", ParamArray::scalar(2.0));
        set.insert("a", ParamArray::scalar(5.0));

        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(set.get("a").unwrap().data(), &[5.0]);
        assert_eq!(set.len(), 2);
    }
}
