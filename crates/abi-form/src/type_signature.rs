use serde::{Deserialize, Serialize};

/// Words that qualify a type rather than name a field.
pub const TYPE_QUALIFIERS: &[&str] = &[
    "memory", "storage", "calldata", "payable", "internal", "external",
];

/// One `type name` entry of a parenthesized type signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

impl Field {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }

    /// Key under which this field's value is stored inside a tuple value.
    ///
    /// Unnamed members are keyed by their position.
    pub fn value_key(&self, index: usize) -> String {
        if self.name.is_empty() {
            index.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// Parse a parenthesized type signature such as `(uint256 a, (bool b) c)`
/// into its ordered top-level fields.
///
/// Input that is not wrapped in parentheses is not a tuple and yields no fields.
pub fn parse_type_signature(signature: &str) -> Vec<Field> {
    let signature = signature.trim();
    let Some(content) = signature
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in content.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                push_field(&mut fields, &content[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_field(&mut fields, &content[start..]);

    fields
}

fn push_field(fields: &mut Vec<Field>, raw: &str) {
    let raw = raw.trim();
    if !raw.is_empty() {
        fields.push(parse_type_and_name(raw));
    }
}

/// Split a single `type name` item into its type and (possibly empty) name.
pub fn parse_type_and_name(item: &str) -> Field {
    let item = item.trim();

    if item.starts_with('(') {
        let Some(close) = matching_paren(item) else {
            return Field::new(item, "");
        };
        let mut ty = item[..=close].to_string();
        let (suffix, rest) = take_array_suffix(&item[close + 1..]);
        ty.push_str(&suffix);
        return Field::new(ty, rest.trim());
    }

    let words: Vec<&str> = item.split_whitespace().collect();
    match words.as_slice() {
        [] => Field::new("", ""),
        [ty] => Field::new(*ty, ""),
        [head @ .., last] => {
            if TYPE_QUALIFIERS.contains(last) || last.starts_with('[') {
                Field::new(join_type_words(&words), "")
            } else {
                Field::new(join_type_words(head), *last)
            }
        }
    }
}

/// Join type words with single spaces, gluing detached array suffixes
/// (`uint256 [3]`) back onto the preceding word.
fn join_type_words(words: &[&str]) -> String {
    let mut ty = String::new();
    for word in words {
        if !ty.is_empty() && !word.starts_with('[') {
            ty.push(' ');
        }
        ty.push_str(word);
    }
    ty
}

/// Byte index of the `)` closing the `(` at the start of `s`.
pub(crate) fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Consume any array suffixes (`[]`, `[3]`, `[][2]`) at the start of `s`,
/// returning the suffix and the remaining text.
fn take_array_suffix(s: &str) -> (String, &str) {
    let mut suffix = String::new();
    let mut rest = s.trim_start();

    while rest.starts_with('[') {
        let mut depth = 0usize;
        let mut end = None;
        for (i, c) in rest.char_indices() {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        end = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(end) = end else {
            break;
        };
        suffix.push_str(&rest[..=end]);
        rest = rest[end + 1..].trim_start();
    }

    (suffix, rest)
}

/// Split a type into its base and its full trailing array suffix.
///
/// `"(uint256 a)[2][]"` → `("(uint256 a)", "[2][]")`.
pub fn split_array_suffix(ty: &str) -> (&str, &str) {
    let ty = ty.trim();
    let mut base_end = ty.len();
    while ty[..base_end].ends_with(']') {
        match ty[..base_end].rfind('[') {
            Some(open) => base_end = open,
            None => break,
        }
    }
    (&ty[..base_end], &ty[base_end..])
}

/// A type with every trailing array suffix removed.
pub fn base_type(ty: &str) -> &str {
    split_array_suffix(ty).0
}

/// The element type of an array type: one trailing dimension removed.
///
/// Non-array types are returned unchanged.
pub fn element_type(ty: &str) -> &str {
    let ty = ty.trim();
    if ty.ends_with(']') {
        if let Some(open) = ty.rfind('[') {
            return &ty[..open];
        }
    }
    ty
}

/// Length of the outermost dimension of a fixed-size array type.
pub fn fixed_array_len(ty: &str) -> Option<usize> {
    let ty = ty.trim();
    let inner = ty.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    inner[open + 1..].trim().parse().ok()
}

pub fn is_array_type(ty: &str) -> bool {
    ty.trim().ends_with(']')
}

/// Whether the base of this type is a tuple, in either the expanded
/// `( ... )` spelling or the `tuple` keyword spelling.
pub fn is_tuple_type(ty: &str) -> bool {
    let base = base_type(ty);
    base.starts_with('(') || base == "tuple" || base.starts_with("tuple(")
}

/// Inverse of [`parse_type_signature`]: join fields as `(type name, ...)`.
pub fn format_type_signature(fields: &[Field]) -> String {
    let inner = fields
        .iter()
        .map(|f| {
            if f.name.is_empty() {
                f.ty.clone()
            } else {
                format!("{} {}", f.ty, f.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("({inner})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_fields() {
        assert_eq!(
            parse_type_signature("(uint256 a, address b)"),
            vec![Field::new("uint256", "a"), Field::new("address", "b")]
        );
    }

    #[test]
    fn test_unnamed_fields() {
        assert_eq!(
            parse_type_signature("(uint256, address)"),
            vec![Field::new("uint256", ""), Field::new("address", "")]
        );
    }

    #[test]
    fn test_empty_and_non_tuple() {
        assert!(parse_type_signature("()").is_empty());
        assert!(parse_type_signature("(   )").is_empty());
        assert!(parse_type_signature("uint256 a").is_empty());
        assert!(parse_type_signature("").is_empty());
    }

    #[test]
    fn test_nested_tuple() {
        assert_eq!(
            parse_type_signature("(uint256 a, (uint256 b, address c) nestedTuple, bool flag)"),
            vec![
                Field::new("uint256", "a"),
                Field::new("(uint256 b, address c)", "nestedTuple"),
                Field::new("bool", "flag"),
            ]
        );
    }

    #[test]
    fn test_array_suffixes() {
        assert_eq!(
            parse_type_signature("(uint256[3] fixedArray, address[][] dynamicArray)"),
            vec![
                Field::new("uint256[3]", "fixedArray"),
                Field::new("address[][]", "dynamicArray"),
            ]
        );
    }

    #[test]
    fn test_tuple_array_field() {
        assert_eq!(
            parse_type_signature("((uint256 x, bool y)[] points, (address z)[2][] grid)"),
            vec![
                Field::new("(uint256 x, bool y)[]", "points"),
                Field::new("(address z)[2][]", "grid"),
            ]
        );
    }

    #[test]
    fn test_unnamed_nested_tuple() {
        assert_eq!(
            parse_type_signature("((uint256, bool), address)"),
            vec![Field::new("(uint256, bool)", ""), Field::new("address", "")]
        );
    }

    #[test]
    fn test_irregular_whitespace() {
        assert_eq!(
            parse_type_signature("(  uint256    a ,address\tb,   ( bool  c )   [2]   d  )"),
            vec![
                Field::new("uint256", "a"),
                Field::new("address", "b"),
                Field::new("( bool  c )[2]", "d"),
            ]
        );
    }

    #[test]
    fn test_qualifiers() {
        assert_eq!(
            parse_type_and_name("address payable"),
            Field::new("address payable", "")
        );
        assert_eq!(
            parse_type_and_name("address payable owner"),
            Field::new("address payable", "owner")
        );
        assert_eq!(
            parse_type_and_name("bytes memory"),
            Field::new("bytes memory", "")
        );
        assert_eq!(
            parse_type_and_name("uint256[] calldata ids"),
            Field::new("uint256[] calldata", "ids")
        );
    }

    #[test]
    fn test_detached_array_suffix() {
        assert_eq!(
            parse_type_and_name("uint256 [3] values"),
            Field::new("uint256[3]", "values")
        );
    }

    #[test]
    fn test_matching_paren() {
        assert_eq!(matching_paren("(a, (b, c)) d"), Some(10));
        assert_eq!(matching_paren("f((a)[] x)"), Some(9));
        assert_eq!(matching_paren("((a)"), None);
        assert_eq!(matching_paren(")("), None);
    }

    #[test]
    fn test_array_helpers() {
        assert_eq!(split_array_suffix("(uint256 a)[2][]"), ("(uint256 a)", "[2][]"));
        assert_eq!(split_array_suffix("uint8"), ("uint8", ""));
        assert_eq!(base_type("address[][]"), "address");
        assert_eq!(element_type("address[][3]"), "address[]");
        assert_eq!(element_type("bool"), "bool");
        assert_eq!(fixed_array_len("uint256[4]"), Some(4));
        assert_eq!(fixed_array_len("uint256[]"), None);
        assert!(is_tuple_type("(uint256 a)[]"));
        assert!(is_tuple_type("tuple[2]"));
        assert!(!is_tuple_type("uint256[]"));
    }

    #[test]
    fn test_format_then_parse_is_stable() {
        let fields = vec![
            Field::new("uint256", "a"),
            Field::new("(bool b, (address c) d)[]", "e"),
            Field::new("string", ""),
        ];
        let sig = format_type_signature(&fields);
        assert_eq!(sig, "(uint256 a, (bool b, (address c) d)[] e, string)");
        assert_eq!(parse_type_signature(&sig), fields);
    }
}
