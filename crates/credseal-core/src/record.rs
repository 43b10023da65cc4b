use std::fmt;

use serde::{Deserialize, Serialize};

/// Text-valued types that may be marked sensitive.
///
/// Only `String` and `Option<String>` implement this, so marking any other field
/// sensitive is rejected at compile time.
pub trait SensitiveText {
    /// `None` for an absent value; such fields are never protected.
    fn as_text(&self) -> Option<&str>;

    fn from_text(text: String) -> Self;
}

impl SensitiveText for String {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_str())
    }

    fn from_text(text: String) -> Self {
        text
    }
}

impl SensitiveText for Option<String> {
    fn as_text(&self) -> Option<&str> {
        self.as_deref()
    }

    fn from_text(text: String) -> Self {
        Some(text)
    }
}

/// Accessor pair for one sensitive field of `T`.
pub struct SensitiveField<T> {
    /// Name used in errors and logs (the serialized key, by convention).
    pub name: &'static str,
    pub get: fn(&T) -> Option<&str>,
    /// Consumes the record and returns it with the field replaced.
    pub replace: fn(T, String) -> T,
}

impl<T> SensitiveField<T> {
    pub fn read<'a>(&self, record: &'a T) -> Option<&'a str> {
        (self.get)(record)
    }

    pub fn write(&self, record: T, value: String) -> T {
        (self.replace)(record, value)
    }
}

impl<T> Clone for SensitiveField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SensitiveField<T> {}

impl<T> fmt::Debug for SensitiveField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensitiveField")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Records with fields that must be protected at rest.
///
/// The list is fixed per type, in declaration order. Implement it with
/// [`sensitive_fields!`](crate::sensitive_fields).
pub trait SensitiveFields: Sized + 'static {
    fn sensitive_fields() -> &'static [SensitiveField<Self>];

    fn sensitive_field_names() -> Vec<&'static str> {
        Self::sensitive_fields().iter().map(|f| f.name).collect()
    }
}

/// Implements [`SensitiveFields`] for a record type.
///
/// ```
/// use credseal_core::sensitive_fields;
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct ApiToken {
///     service: String,
///     token: Option<String>,
/// }
///
/// sensitive_fields!(ApiToken { token });
/// ```
///
/// A field may carry its serialized name:
/// `sensitive_fields!(Credential { password as "Password" })`.
#[macro_export]
macro_rules! sensitive_fields {
    (@name $field:ident) => {
        stringify!($field)
    };
    (@name $field:ident $name:literal) => {
        $name
    };
    ($record:ty { $($field:ident $(as $name:literal)?),+ $(,)? }) => {
        impl $crate::record::SensitiveFields for $record {
            fn sensitive_fields() -> &'static [$crate::record::SensitiveField<Self>] {
                const FIELDS: &[$crate::record::SensitiveField<$record>] = &[
                    $(
                        $crate::record::SensitiveField {
                            name: $crate::sensitive_fields!(@name $field $($name)?),
                            get: {
                                fn get(record: &$record) -> ::core::option::Option<&str> {
                                    $crate::record::SensitiveText::as_text(&record.$field)
                                }
                                get
                            },
                            replace: {
                                fn replace(
                                    record: $record,
                                    value: ::std::string::String,
                                ) -> $record {
                                    let mut record = record;
                                    record.$field = $crate::record::SensitiveText::from_text(value);
                                    record
                                }
                                replace
                            },
                        },
                    )+
                ];
                FIELDS
            }
        }
    };
}

/// User name / password pair. Only the password is protected at rest.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Credential {
    /// Stored as plain text.
    pub user_name: Option<String>,
    pub password: Option<String>,
}

crate::sensitive_fields!(Credential { password as "Password" });

impl Credential {
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: Some(user_name.into()),
            password: Some(password.into()),
        }
    }
}

// Keep the password out of logs and panic messages.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_name", &self.user_name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
