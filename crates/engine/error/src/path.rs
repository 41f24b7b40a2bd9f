use std::fmt;

/// Position of a field in the response tree, as reported alongside errors.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Default, Hash)]
pub struct ErrorPath(Vec<ErrorPathSegment>);

impl std::ops::Deref for ErrorPath {
    type Target = Vec<ErrorPathSegment>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for ErrorPath {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub enum ErrorPathSegment {
    Field(Box<str>),
    Index(usize),
}

impl ErrorPath {
    #[must_use]
    pub fn child(&self, segment: impl InsertIntoErrorPath) -> Self {
        let mut path = self.clone();
        segment.insert_into(&mut path);
        path
    }
}

pub trait InsertIntoErrorPath {
    fn insert_into(self, path: &mut ErrorPath);
}

impl InsertIntoErrorPath for usize {
    fn insert_into(self, path: &mut ErrorPath) {
        path.0.push(ErrorPathSegment::Index(self));
    }
}

impl InsertIntoErrorPath for &str {
    fn insert_into(self, path: &mut ErrorPath) {
        path.0.push(ErrorPathSegment::Field(self.into()));
    }
}

impl InsertIntoErrorPath for String {
    fn insert_into(self, path: &mut ErrorPath) {
        path.0.push(ErrorPathSegment::Field(self.into_boxed_str()));
    }
}

impl From<&str> for ErrorPath {
    fn from(name: &str) -> Self {
        ErrorPath::default().child(name)
    }
}

impl From<String> for ErrorPath {
    fn from(name: String) -> Self {
        ErrorPath::default().child(name)
    }
}

impl serde::Serialize for ErrorPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for segment in &self.0 {
            match segment {
                ErrorPathSegment::Field(name) => seq.serialize_element(name)?,
                ErrorPathSegment::Index(index) => seq.serialize_element(index)?,
            }
        }
        seq.end()
    }
}

impl fmt::Display for ErrorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                ErrorPathSegment::Field(name) => f.write_str(name)?,
                ErrorPathSegment::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}
