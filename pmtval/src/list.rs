//! Cons lists built from [`Pair`](crate::Pair) cells.
use crate::{
    error::{ValueError, ValueResult},
    value::{Value, ValueTag},
};

/// Iterator over the `car`s of a pair chain.
///
/// Iteration stops at the first `cdr` that is not a pair; that terminating
/// value is available through [`ListIter::tail`] (it is `Null` for a proper
/// list).
pub struct ListIter<'a> {
    cursor: &'a Value,
}

impl<'a> ListIter<'a> {
    pub fn new(list: &'a Value) -> Self {
        Self { cursor: list }
    }

    /// What remains of the list: `Null`, an improper tail, or the unvisited pairs.
    pub fn tail(&self) -> &'a Value {
        self.cursor
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor {
            Value::Pair(pair) => {
                self.cursor = pair.cdr();
                Some(pair.car())
            }
            _ => None,
        }
    }
}

impl Value {
    /// Fold `items` right to left into a proper list.
    pub fn list<I>(items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(Value::Null, |tail, item| Value::pair(item, tail))
    }

    pub fn iter_list(&self) -> ListIter<'_> {
        ListIter::new(self)
    }

    pub fn car(&self) -> ValueResult<&Value> {
        match self {
            Value::Pair(pair) => Ok(pair.car()),
            other => Err(ValueError::WrongType {
                expected: ValueTag::Pair,
                found: other.tag(),
            }),
        }
    }

    pub fn cdr(&self) -> ValueResult<&Value> {
        match self {
            Value::Pair(pair) => Ok(pair.cdr()),
            other => Err(ValueError::WrongType {
                expected: ValueTag::Pair,
                found: other.tag(),
            }),
        }
    }

    /// `index`-th element of a list.
    pub fn nth(&self, index: usize) -> ValueResult<&Value> {
        let mut seen = 0;
        for item in self.iter_list() {
            if seen == index {
                return Ok(item);
            }
            seen += 1;
        }
        Err(ValueError::IndexOutOfBounds { index, len: seen })
    }

    /// Number of pairs in the chain starting at `self` (0 for anything else).
    pub fn list_length(&self) -> usize {
        self.iter_list().count()
    }

    /// Returns `true` for `Null` and for pair chains terminated by `Null`.
    pub fn is_proper_list(&self) -> bool {
        let mut iter = self.iter_list();
        let _ = iter.by_ref().count();
        iter.tail().is_null()
    }

    /// Elements of a proper list, or of an improper one followed by its tail.
    pub fn list_to_vec(&self) -> Vec<Value> {
        let mut iter = self.iter_list();
        let mut items: Vec<Value> = iter.by_ref().cloned().collect();
        if !iter.tail().is_null() {
            items.push(iter.tail().clone());
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_two_three() -> Value {
        Value::list(vec![Value::integer(1), Value::integer(2), Value::integer(3)])
    }

    #[test]
    fn list_is_built_from_nested_pairs() {
        let list = one_two_three();
        assert_eq!(list.car(), Ok(&Value::integer(1)));
        assert_eq!(list.cdr().and_then(|rest| rest.car()), Ok(&Value::integer(2)));
        assert_eq!(list.nth(2), Ok(&Value::integer(3)));
        assert_eq!(list.list_length(), 3);
        assert!(list.is_proper_list());
    }

    #[test]
    fn nth_past_the_end_fails() {
        assert_eq!(
            one_two_three().nth(5),
            Err(ValueError::IndexOutOfBounds { index: 5, len: 3 })
        );
    }

    #[test]
    fn improper_tail_is_kept() {
        let dotted = Value::pair(Value::integer(1), Value::integer(2));
        assert!(!dotted.is_proper_list());
        assert_eq!(dotted.list_to_vec(), vec![Value::integer(1), Value::integer(2)]);
    }

    #[test]
    fn shared_tails_are_not_copied() {
        let tail = one_two_three();
        let a = Value::pair(Value::symbol("a"), tail.clone());
        let b = Value::pair(Value::symbol("b"), tail.clone());
        match (a.cdr(), b.cdr(), &tail) {
            (Ok(Value::Pair(x)), Ok(Value::Pair(y)), Value::Pair(z)) => {
                assert!(std::sync::Arc::ptr_eq(x, y));
                assert!(std::sync::Arc::ptr_eq(x, z));
            }
            _ => panic!("expected pair tails"),
        }
    }
}
