//! Stored documents, request payloads and their validation rules.
//!
//! Payloads are overlaid onto a base (defaults for a create, the stored document for
//! an update) and the merged state is validated by the same function in both cases.

use bson::Bson;
use bugdesk_store::query::{Expr, Filter};
use serde::{Deserialize, Deserializer};

pub mod bug;
pub mod user;

/// A closed set of string values stored in a document field.
pub trait FieldEnum: Sized + Copy + 'static {
    /// Field name reported in validation messages.
    const FIELD: &'static str;
    const VARIANTS: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|variant| variant.as_str() == value)
    }
}

/// Declares a kebab-case string enum stored in the given document field.
macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident in $field:literal {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $crate::model::FieldEnum for $name {
            const FIELD: &'static str = $field;
            const VARIANTS: &'static [Self] = &[$($name::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }
    };
}

pub(crate) use field_enum;

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Collects field rule violations while a payload is being validated.
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<String>);

impl Violations {
    /// Trims a required text field, recording `message` when it is absent or blank.
    pub fn required(&mut self, value: Option<String>, message: &str) -> String {
        let value = trimmed(value.unwrap_or_default());

        if value.is_empty() {
            self.0.push(message.to_string());
        }

        value
    }

    /// Length is counted in UTF-16 code units.
    pub fn max_chars(&mut self, value: &str, max: usize, message: &str) {
        if value.encode_utf16().count() > max {
            self.0.push(message.to_string());
        }
    }

    pub fn check(&mut self, valid: bool, message: &str) {
        if !valid {
            self.0.push(message.to_string());
        }
    }

    /// Parses an enum field, falling back to `default` when absent.
    pub fn one_of<E: FieldEnum>(&mut self, value: Option<String>, default: E) -> E {
        let Some(value) = value else {
            return default;
        };

        E::parse(&value).unwrap_or_else(|| {
            self.0.push(format!("`{value}` is not a valid enum value for path `{}`.", E::FIELD));
            default
        })
    }

    pub fn finish<T>(self, validated: T) -> Result<T, Vec<String>> {
        if self.0.is_empty() {
            Ok(validated)
        } else {
            Err(self.0)
        }
    }
}

pub(crate) fn trimmed(value: String) -> String {
    let trimmed = value.trim();

    if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn trimmed_all(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(trimmed).collect()
}

/// A query-string parameter. Repeating a parameter turns it into `Many`, which is
/// matched against the field as a whole array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    One(String),
    Many(Vec<String>),
}

impl ParamValue {
    fn is_empty(&self) -> bool {
        matches!(self, ParamValue::One(value) if value.is_empty())
    }

    fn to_bson(&self) -> Bson {
        match self {
            ParamValue::One(value) => Bson::String(value.clone()),
            ParamValue::Many(values) => Bson::Array(values.iter().cloned().map(Bson::String).collect()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::One(value.to_string())
    }
}

/// Records one occurrence of a query parameter.
pub(crate) fn append_param(slot: &mut Option<ParamValue>, value: String) {
    *slot = Some(match slot.take() {
        None => ParamValue::One(value),
        Some(ParamValue::One(first)) => ParamValue::Many(vec![first, value]),
        Some(ParamValue::Many(mut values)) => {
            values.push(value);
            ParamValue::Many(values)
        }
    });
}

/// Builds a conjunction of equality filters, skipping absent and empty values.
pub(crate) fn equality_filter<'a>(
    constraints: impl IntoIterator<Item = (&'static str, Option<&'a ParamValue>)>,
) -> Option<Expr> {
    let exprs = constraints
        .into_iter()
        .filter_map(|(field, value)| {
            value
                .filter(|value| !value.is_empty())
                .map(|value| Filter::eq(field, value.to_bson()))
        })
        .collect::<Vec<_>>();

    (!exprs.is_empty()).then(|| Filter::and(exprs))
}

#[cfg(test)]
mod tests {
    use super::*;

    field_enum! {
        pub enum Shade in "shade" {
            Light => "light",
            DarkGrey => "dark-grey",
        }
    }

    #[test]
    fn field_enum_parses_declared_values_only() {
        assert_eq!(Shade::parse("dark-grey"), Some(Shade::DarkGrey));
        assert_eq!(Shade::parse("Dark-Grey"), None);
    }

    #[test]
    fn one_of_reports_the_offending_value() {
        let mut violations = Violations::default();
        let shade = violations.one_of(Some("purple".into()), Shade::Light);

        assert_eq!(shade, Shade::Light);
        assert_eq!(
            violations.finish(()).unwrap_err(),
            vec!["`purple` is not a valid enum value for path `shade`.".to_string()]
        );
    }

    #[test]
    fn required_rejects_blank_text() {
        let mut violations = Violations::default();
        let value = violations.required(Some("   ".into()), "Name is required");

        assert_eq!(value, "");
        assert_eq!(violations.finish(()).unwrap_err(), vec!["Name is required".to_string()]);
    }

    #[test]
    fn equality_filter_skips_empty_values() {
        let empty = ParamValue::from("");
        let open = ParamValue::from("open");

        assert_eq!(equality_filter([("status", Some(&empty)), ("role", None)]), None);
        assert_eq!(
            equality_filter([("status", Some(&open)), ("project", None)]),
            Some(Filter::and([Filter::eq("status", "open")]))
        );
    }

    #[test]
    fn repeated_parameter_filters_on_an_array() {
        let mut status = None;
        append_param(&mut status, "open".into());
        append_param(&mut status, "closed".into());

        assert_eq!(status, Some(ParamValue::Many(vec!["open".into(), "closed".into()])));
        assert_eq!(
            equality_filter([("status", status.as_ref())]),
            Some(Filter::and([Filter::eq("status", vec!["open", "closed"])]))
        );
    }

    #[test]
    fn length_limit_counts_utf16_units() {
        let mut violations = Violations::default();
        violations.max_chars(&"\u{1F600}".repeat(3), 5, "Too long");
        violations.max_chars(&"é".repeat(5), 5, "Not reported");

        assert_eq!(violations.finish(()).unwrap_err(), vec!["Too long".to_string()]);
    }
}
