use super::{DataSetError, Table, TableMetaData};
use crate::data::Value;

/// View that rewrites string values on read.
///
/// Whole-value replacements are checked first (`"[NULL]"` -> `Null` is the
/// usual one); substring replacements then apply, in registration order, to
/// any string value that is still a string.
pub struct ReplacementTable<'a> {
    inner: &'a dyn Table,
    objects: Vec<(String, Value)>,
    substrings: Vec<(String, String)>,
}

impl<'a> ReplacementTable<'a> {
    pub fn new(inner: &'a dyn Table) -> Self {
        Self {
            inner,
            objects: Vec::new(),
            substrings: Vec::new(),
        }
    }

    pub fn add_replacement_object(&mut self, from: impl Into<String>, to: Value) {
        let from = from.into();
        self.objects.retain(|(existing, _)| *existing != from);
        self.objects.push((from, to));
    }

    pub fn add_replacement_substring(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let from = from.into();
        if !from.is_empty() {
            self.substrings.push((from, to.into()));
        }
    }

    pub fn with_replacement_objects<'r, I>(mut self, replacements: I) -> Self
    where
        I: IntoIterator<Item = &'r (String, Value)>,
    {
        for (from, to) in replacements {
            self.add_replacement_object(from.clone(), to.clone());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.substrings.is_empty()
    }

    fn replace(&self, value: Value) -> Value {
        let Value::String(text) = value else {
            return value;
        };
        if let Some((_, replacement)) = self.objects.iter().find(|(from, _)| *from == text) {
            return replacement.clone();
        }
        let replaced = self
            .substrings
            .iter()
            .fold(text, |acc, (from, to)| {
                if acc.contains(from.as_str()) {
                    acc.replace(from.as_str(), to)
                } else {
                    acc
                }
            });
        Value::String(replaced)
    }
}

impl Table for ReplacementTable<'_> {
    fn metadata(&self) -> &TableMetaData {
        self.inner.metadata()
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn value(&self, row: usize, column: &str) -> Result<Value, DataSetError> {
        self.inner.value(row, column).map(|value| self.replace(value))
    }

    fn original(&self) -> Option<&dyn Table> {
        Some(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, DefaultTable};

    #[test]
    fn replaces_whole_values_before_substrings() {
        let table = DefaultTable::new(TableMetaData::new(
            "T",
            vec![Column::unknown("A"), Column::unknown("B")],
        ))
        .with_rows(vec![vec![Value::from("[NULL]"), Value::from("id-[ID]-[ID]")]])
        .unwrap();

        let mut view = ReplacementTable::new(&table);
        view.add_replacement_object("[NULL]", Value::Null);
        view.add_replacement_substring("[ID]", "42");

        assert_eq!(view.value(0, "A").unwrap(), Value::Null);
        assert_eq!(view.value(0, "B").unwrap(), Value::from("id-42-42"));
    }

    #[test]
    fn later_object_replacement_wins() {
        let table = DefaultTable::new(TableMetaData::new("T", vec![Column::unknown("A")]))
            .with_rows(vec![vec![Value::from("x")]])
            .unwrap();
        let mut view = ReplacementTable::new(&table);
        view.add_replacement_object("x", Value::from("first"));
        view.add_replacement_object("x", Value::from("second"));
        assert_eq!(view.value(0, "a").unwrap(), Value::from("second"));
    }
}
