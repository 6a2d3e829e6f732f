//! Delimited list codec for the `nuisanceTypes` column.
//!
//! A list is stored as its members joined with [`DELIMITER`]. Members may
//! contain the delimiter or the escape character; both are escaped with a
//! leading [`ESCAPE`]:
//!
//! | Member text | Encoded |
//! |---|---|
//! | `;` | `\;` |
//! | `\` | `\\` |
//! | (one empty member) | empty field |
//!
//! Decoding splits on unescaped delimiters only. An escape followed by
//! any other character, or a trailing lone escape, is rejected. The
//! empty string decodes to the empty list, so a list holding a single
//! empty member does not round-trip. Type lists never hit this: an empty
//! label is not a nuisance type.
//!
//! Canonical nuisance type labels contain neither character, so stored
//! values look like `Noise;Odor`.

use std::str::FromStr as _;

use nuisance_map_nuisance_models::{NuisanceType, NuisanceTypes, NuisanceTypesError};

/// Separator between list members.
pub const DELIMITER: char = ';';

/// Escape character for [`DELIMITER`] and itself.
pub const ESCAPE: char = '\\';

/// Errors decoding a delimited list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListDecodeError {
    /// The field ends with a lone escape character.
    #[error("dangling escape at end of field")]
    DanglingEscape,

    /// An escape character precedes something other than `;` or `\`.
    #[error("invalid escape sequence '\\{character}'")]
    InvalidEscape {
        /// The escaped character.
        character: char,
    },
}

/// Errors decoding a nuisance type list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesDecodeError {
    /// The delimited structure is malformed.
    #[error(transparent)]
    List(#[from] ListDecodeError),

    /// A member is not a known nuisance type.
    #[error("unknown nuisance type '{value}'")]
    UnknownType {
        /// The unrecognised member.
        value: String,
    },

    /// The decoded members do not form a valid type list.
    #[error(transparent)]
    Types(#[from] NuisanceTypesError),
}

/// Joins `items` with [`DELIMITER`], escaping each member.
pub fn encode_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        for c in item.as_ref().chars() {
            if c == DELIMITER || c == ESCAPE {
                out.push(ESCAPE);
            }
            out.push(c);
        }
    }
    out
}

/// Splits `field` on unescaped [`DELIMITER`]s and unescapes each member.
///
/// # Errors
///
/// Returns [`ListDecodeError`] on a malformed escape sequence.
pub fn decode_list(field: &str) -> Result<Vec<String>, ListDecodeError> {
    if field.is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = field.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(escaped @ (DELIMITER | ESCAPE)) => current.push(escaped),
                Some(character) => return Err(ListDecodeError::InvalidEscape { character }),
                None => return Err(ListDecodeError::DanglingEscape),
            },
            DELIMITER => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);

    Ok(items)
}

/// Encodes a type list using canonical labels.
#[must_use]
pub fn encode_types(types: &NuisanceTypes) -> String {
    encode_list(types.iter().map(AsRef::<str>::as_ref))
}

/// Decodes a stored type list, accepting canonical and legacy labels.
///
/// # Errors
///
/// Returns [`TypesDecodeError`] if the field is malformed, names an
/// unknown type, is empty, or repeats a type.
pub fn decode_types(field: &str) -> Result<NuisanceTypes, TypesDecodeError> {
    let types = decode_list(field)?
        .into_iter()
        .map(|value| {
            NuisanceType::from_str(&value).map_err(|_| TypesDecodeError::UnknownType { value })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NuisanceTypes::new(types)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_types_encode_plainly() {
        let types = NuisanceTypes::new(vec![NuisanceType::Noise, NuisanceType::HealthEffect]).unwrap();
        assert_eq!(encode_types(&types), "Noise;Health effect");
        assert_eq!(decode_types("Noise;Health effect").unwrap(), types);
    }

    #[test]
    fn delimiter_and_escape_survive() {
        let items = ["a;b", "back\\slash", "", "plain"];
        let encoded = encode_list(items);
        assert_eq!(encoded, "a\\;b;back\\\\slash;;plain");
        assert_eq!(decode_list(&encoded).unwrap(), items);
    }

    #[test]
    fn empty_field_is_empty_list() {
        assert!(decode_list("").unwrap().is_empty());
        assert_eq!(encode_list(Vec::<String>::new()), "");
    }

    #[test]
    fn single_empty_member_collides_with_empty_list() {
        assert_eq!(encode_list([""]), "");
        assert!(decode_list(&encode_list([""])).unwrap().is_empty());
        assert_eq!(encode_list(["", ""]), ";");
        assert_eq!(decode_list(";").unwrap(), ["", ""]);
    }

    #[test]
    fn malformed_escapes_are_rejected() {
        assert_eq!(decode_list("Noise\\"), Err(ListDecodeError::DanglingEscape));
        assert_eq!(
            decode_list("No\\ise"),
            Err(ListDecodeError::InvalidEscape { character: 'i' })
        );
    }

    #[test]
    fn legacy_labels_decode() {
        let types = decode_types("Bruit;Odeur").unwrap();
        assert_eq!(types.as_slice(), &[NuisanceType::Noise, NuisanceType::Odor]);
        assert_eq!(encode_types(&types), "Noise;Odor");
    }

    #[test]
    fn bad_type_fields_are_errors() {
        assert_eq!(
            decode_types("Noise;Smoke"),
            Err(TypesDecodeError::UnknownType {
                value: "Smoke".to_string()
            })
        );
        assert_eq!(
            decode_types(""),
            Err(TypesDecodeError::Types(NuisanceTypesError::Empty))
        );
        assert_eq!(
            decode_types("Noise;"),
            Err(TypesDecodeError::UnknownType {
                value: String::new()
            })
        );
        assert_eq!(
            decode_types("Light;Light"),
            Err(TypesDecodeError::Types(NuisanceTypesError::Duplicate {
                nuisance_type: NuisanceType::Light
            }))
        );
    }
}
