//! Conversions from SDK response getters into owned values.
//!
//! SDK getters return `&str` for members the service model marks as required
//! and `Option<&str>` for everything else. `field()` accepts both so response
//! mapping reads the same either way.

use aws_sdk_dynamodb::primitives::{DateTime, DateTimeFormat};

pub trait IntoField<T> {
    fn field(self) -> T;
}

impl<S: AsRef<str> + ?Sized> IntoField<String> for &S {
    fn field(self) -> String {
        self.as_ref().to_string()
    }
}

impl<S: AsRef<str> + ?Sized> IntoField<String> for Option<&S> {
    fn field(self) -> String {
        self.map(|s| s.as_ref().to_string()).unwrap_or_default()
    }
}

impl<S: AsRef<str> + ?Sized> IntoField<Option<String>> for &S {
    fn field(self) -> Option<String> {
        Some(self.as_ref().to_string())
    }
}

impl<S: AsRef<str> + ?Sized> IntoField<Option<String>> for Option<&S> {
    fn field(self) -> Option<String> {
        self.map(|s| s.as_ref().to_string())
    }
}

macro_rules! scalar_field {
    ($($ty:ty),*) => {
        $(
            impl IntoField<$ty> for $ty {
                fn field(self) -> $ty {
                    self
                }
            }

            impl IntoField<$ty> for Option<$ty> {
                fn field(self) -> $ty {
                    self.unwrap_or_default()
                }
            }

            impl IntoField<Option<$ty>> for $ty {
                fn field(self) -> Option<$ty> {
                    Some(self)
                }
            }

            impl IntoField<Option<$ty>> for Option<$ty> {
                fn field(self) -> Option<$ty> {
                    self
                }
            }
        )*
    };
}

scalar_field!(i32, i64, bool);

pub trait IntoTimestamp {
    fn timestamp(self) -> Option<String>;
}

impl IntoTimestamp for &DateTime {
    fn timestamp(self) -> Option<String> {
        self.fmt(DateTimeFormat::DateTime).ok()
    }
}

impl IntoTimestamp for Option<&DateTime> {
    fn timestamp(self) -> Option<String> {
        self.and_then(IntoTimestamp::timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_accepts_required_and_optional_strings() {
        let required: String = "queue".field();
        let optional: String = Some("queue").field();
        let missing: String = None::<&str>.field();
        assert_eq!(required, "queue");
        assert_eq!(optional, "queue");
        assert_eq!(missing, "");

        let kept: Option<String> = Some("x").field();
        let absent: Option<String> = None::<&str>.field();
        assert_eq!(kept.as_deref(), Some("x"));
        assert!(absent.is_none());
    }

    #[test]
    fn test_field_scalars() {
        let count: i64 = Some(4_i64).field();
        let missing: i64 = None::<i64>.field();
        let flag: Option<bool> = true.field();
        assert_eq!(count, 4);
        assert_eq!(missing, 0);
        assert_eq!(flag, Some(true));
    }

    #[test]
    fn test_timestamp_formats_rfc3339() {
        let time = DateTime::from_secs(0);
        assert_eq!(time.timestamp().as_deref(), Some("1970-01-01T00:00:00Z"));
        assert!(None::<&DateTime>.timestamp().is_none());
    }
}
