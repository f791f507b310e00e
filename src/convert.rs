//! Conversion adapters between caller shapes and entities.
//!
//! Sources implement [`IntoEntity`] and are materialised once per call; sinks
//! implement [`FromEntity`] and receive query results one entity at a time.

use crate::error::ConvertError;

/// Yields the value a behavior writes.
pub trait IntoEntity<T> {
    fn into_entity(self) -> Result<T, ConvertError>;
}

/// Receives the entities a query returns.
pub trait FromEntity<T> {
    fn from_entity(&mut self, entity: T) -> Result<(), ConvertError>;
}

/// A value that is already converted.
#[derive(Debug, Clone, PartialEq)]
pub struct Ready<T>(pub T);

pub fn value<T>(value: T) -> Ready<T> {
    Ready(value)
}

impl<T> IntoEntity<T> for Ready<T> {
    fn into_entity(self) -> Result<T, ConvertError> {
        Ok(self.0)
    }
}

/// A conversion run when the behavior materialises its input.
pub struct FromFn<F>(F);

pub fn from_fn<T, F>(f: F) -> FromFn<F>
where
    F: FnOnce() -> Result<T, ConvertError>,
{
    FromFn(f)
}

impl<T, F> IntoEntity<T> for FromFn<F>
where
    F: FnOnce() -> Result<T, ConvertError>,
{
    fn into_entity(self) -> Result<T, ConvertError> {
        (self.0)()
    }
}

impl<T> FromEntity<T> for Vec<T> {
    fn from_entity(&mut self, entity: T) -> Result<(), ConvertError> {
        self.push(entity);
        Ok(())
    }
}

/// A sink that hands each entity to a callback; an error stops the query.
pub struct ForEach<F>(F);

pub fn for_each<T, F>(f: F) -> ForEach<F>
where
    F: FnMut(T) -> Result<(), ConvertError>,
{
    ForEach(f)
}

impl<T, F> FromEntity<T> for ForEach<F>
where
    F: FnMut(T) -> Result<(), ConvertError>,
{
    fn from_entity(&mut self, entity: T) -> Result<(), ConvertError> {
        (self.0)(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_value() {
        let batch: Vec<i32> = value(vec![1, 2]).into_entity().unwrap();
        assert_eq!(batch, vec![1, 2]);
    }

    #[test]
    fn test_from_fn_runs_lazily_and_propagates_errors() {
        let ok: i32 = from_fn(|| Ok::<_, ConvertError>(7)).into_entity().unwrap();
        assert_eq!(ok, 7);

        let failing = from_fn(|| -> Result<i32, ConvertError> {
            Err(ConvertError::invalid("age", "negative"))
        });
        let err = failing.into_entity().unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for age: negative");
    }

    #[test]
    fn test_for_each_stops_on_error() {
        let mut seen = Vec::new();
        let mut sink = for_each(|n: i32| {
            if n > 1 {
                return Err(ConvertError::rejected("full"));
            }
            seen.push(n);
            Ok(())
        });

        assert!(sink.from_entity(1).is_ok());
        assert!(matches!(sink.from_entity(2), Err(ConvertError::Rejected(_))));
        drop(sink);
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<&str> = Vec::new();
        sink.from_entity("a").unwrap();
        sink.from_entity("b").unwrap();
        assert_eq!(sink, vec!["a", "b"]);
    }
}
