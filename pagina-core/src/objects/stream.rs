use crate::objects::{Dictionary, Object};

/// A dictionary plus the raw bytes that followed it in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    dictionary: Dictionary,
    data: Vec<u8>,
}

impl Stream {
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_dictionary(Dictionary::new(), data)
    }

    /// Build a stream; `Length` is set to the payload size.
    pub fn with_dictionary(dictionary: Dictionary, data: Vec<u8>) -> Self {
        let mut dict = dictionary;
        dict.set("Length", data.len() as i64);

        Self {
            dictionary: dict,
            data,
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replace the payload and keep `Length` in step.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.dictionary.set("Length", data.len() as i64);
        self.data = data;
    }

    pub fn into_parts(self) -> (Dictionary, Vec<u8>) {
        (self.dictionary, self.data)
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.dictionary
            .set("Filter", Object::Name(filter.to_string()));
    }

    /// Filter names in application order; empty when unfiltered.
    pub fn filters(&self) -> Vec<&str> {
        match self.dictionary.get("Filter") {
            Some(Object::Name(name)) => vec![name.as_str()],
            Some(Object::Array(names)) => names.iter().filter_map(Object::as_name).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_new() {
        let data = vec![1, 2, 3, 4, 5];
        let stream = Stream::new(data.clone());

        assert_eq!(stream.data(), &data);
        assert_eq!(stream.dictionary().get("Length"), Some(&Object::Integer(5)));
    }

    #[test]
    fn test_stream_with_dictionary() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name("ObjStm".to_string()));
        dict.set("Length", 999);

        let stream = Stream::with_dictionary(dict, vec![0xFF, 0xD8, 0xFF]);

        assert_eq!(stream.dictionary().get_integer("Length"), Some(3));
        assert_eq!(stream.dictionary().get_name("Type"), Some("ObjStm"));
    }

    #[test]
    fn test_set_data_updates_length() {
        let mut stream = Stream::new(vec![1, 2, 3]);
        stream.set_data(vec![9; 10]);
        assert_eq!(stream.dictionary().get_integer("Length"), Some(10));

        let (dict, data) = stream.into_parts();
        assert_eq!(dict.get_integer("Length"), Some(10));
        assert_eq!(data.len(), 10);
    }

    #[test]
    fn test_filters() {
        let mut stream = Stream::new(vec![1, 2, 3]);
        assert!(stream.filters().is_empty());

        stream.set_filter("FlateDecode");
        assert_eq!(stream.filters(), vec!["FlateDecode"]);

        stream.dictionary_mut().set(
            "Filter",
            Object::Array(
                vec![
                    Object::Name("ASCIIHexDecode".to_string()),
                    Object::Name("FlateDecode".to_string()),
                ]
                .into(),
            ),
        );
        assert_eq!(stream.filters(), vec!["ASCIIHexDecode", "FlateDecode"]);
    }

    #[test]
    fn test_empty_stream() {
        let stream = Stream::new(vec![]);

        assert_eq!(stream.data(), &[] as &[u8]);
        assert_eq!(stream.dictionary().get("Length"), Some(&Object::Integer(0)));
    }
}
