use crate::objects::Object;

/// Ordered, owning sequence of objects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array {
    elements: Vec<Object>,
}

impl Array {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, object: impl Into<Object>) {
        self.elements.push(object.into());
    }

    pub fn pop(&mut self) -> Option<Object> {
        self.elements.pop()
    }

    pub fn get(&self, index: usize) -> Option<&Object> {
        self.elements.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Object> {
        self.elements.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Object> {
        self.elements.iter_mut()
    }

    pub fn as_slice(&self) -> &[Object] {
        &self.elements
    }
}

impl From<Vec<Object>> for Array {
    fn from(elements: Vec<Object>) -> Self {
        Self { elements }
    }
}

impl From<Array> for Vec<Object> {
    fn from(array: Array) -> Self {
        array.elements
    }
}

impl FromIterator<Object> for Array {
    fn from_iter<T: IntoIterator<Item = Object>>(iter: T) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl IntoIterator for Array {
    type Item = Object;
    type IntoIter = std::vec::IntoIter<Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut array = Array::new();
        array.push(1);
        array.push("two");
        array.push(Object::Null);

        assert_eq!(array.len(), 3);
        assert_eq!(array.get(0), Some(&Object::Integer(1)));
        assert_eq!(array.get(1), Some(&Object::String(b"two".to_vec())));
        assert_eq!(array.get(2), Some(&Object::Null));
        assert_eq!(array.get(3), None);
    }

    #[test]
    fn test_pop_and_mutate() {
        let mut array: Array = vec![Object::Integer(1), Object::Integer(2)].into();
        if let Some(Object::Integer(v)) = array.get_mut(0) {
            *v = 10;
        }
        assert_eq!(array.pop(), Some(Object::Integer(2)));
        assert_eq!(array.as_slice(), &[Object::Integer(10)]);
    }

    #[test]
    fn test_iteration() {
        let array: Array = (0..4).map(Object::Integer).collect();
        let sum: i64 = array.iter().filter_map(Object::as_integer).sum();
        assert_eq!(sum, 6);
        let back: Vec<Object> = array.into();
        assert_eq!(back.len(), 4);
    }
}
