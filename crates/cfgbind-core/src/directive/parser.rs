//! Parser for per-field directive strings such as `required,min:1,oneof:a,b`

use std::collections::BTreeSet;

/// Directive names recognised by the parser
const KNOWN_DIRECTIVES: &[&str] = &[
    "required", "secret", "default", "min", "max", "oneof", "name", "prefix",
];

/// Structured form of a field's directive string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveSet {
    /// Absolute key overriding the derived key path (`name:`)
    pub explicit_key: Option<String>,
    /// Key segment used for a nested group (`prefix:`)
    pub group_prefix: Option<String>,
    /// Literal used when no source supplies the key (`default:`)
    pub default: Option<String>,
    /// Lower bound literal (`min:`)
    pub min: Option<String>,
    /// Upper bound literal (`max:`)
    pub max: Option<String>,
    /// Allowed values, sorted and deduplicated (`oneof:`)
    pub allowed: BTreeSet<String>,
    pub required: bool,
    /// Value must not be shown in dumps or logs
    pub secret: bool,
}

impl DirectiveSet {
    /// Allowed values joined for messages, e.g. `dev, prod, staging`
    pub fn allowed_list(&self) -> String {
        self.allowed.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

/// Parse a directive string into a [`DirectiveSet`]
///
/// Tokens are separated by commas. Each token is either `name` or
/// `name:value`; the value is everything after the first colon and is kept
/// verbatim. `oneof` keeps consuming tokens as further allowed values until
/// a token naming a known directive appears.
pub fn parse(directives: &str) -> DirectiveSet {
    let mut set = DirectiveSet::default();
    if directives.is_empty() {
        return set;
    }

    let tokens: Vec<&str> = directives.split(',').collect();
    let mut i = 0;
    while i < tokens.len() {
        let (name, value) = split_token(tokens[i]);
        i += 1;

        match name {
            "required" => set.required = parse_flag(value),
            "secret" => set.secret = parse_flag(value),
            "default" => set.default = Some(value.unwrap_or_default().to_string()),
            "min" => set.min = value.map(str::to_string),
            "max" => set.max = value.map(str::to_string),
            "name" => set.explicit_key = value.map(str::to_string),
            "prefix" => set.group_prefix = value.map(str::to_string),
            "oneof" => {
                let mut values = Vec::new();
                if let Some(first) = value {
                    values.push(first);
                }
                while i < tokens.len() && !is_directive(tokens[i]) {
                    values.push(tokens[i]);
                    i += 1;
                }
                set.allowed.extend(
                    values.into_iter().filter(|v| !v.is_empty()).map(str::to_string),
                );
            }
            _ => {}
        }
    }

    set
}

fn split_token(token: &str) -> (&str, Option<&str>) {
    match token.split_once(':') {
        Some((name, value)) => (name.trim(), Some(value)),
        None => (token.trim(), None),
    }
}

fn is_directive(token: &str) -> bool {
    let (name, _) = split_token(token);
    KNOWN_DIRECTIVES.contains(&name)
}

fn parse_flag(value: Option<&str>) -> bool {
    !matches!(value, Some("false"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(parse(""), DirectiveSet::default());
    }

    #[test]
    fn test_flags() {
        let set = parse("required,secret");
        assert!(set.required);
        assert!(set.secret);

        let set = parse("required:false,secret:true");
        assert!(!set.required);
        assert!(set.secret);

        // Unrecognised literals fail safe to true
        assert!(parse("required:nope").required);
    }

    #[test]
    fn test_values_split_on_first_colon() {
        let set = parse("default:http://localhost:8080/x,min:1");
        assert_eq!(set.default.as_deref(), Some("http://localhost:8080/x"));
        assert_eq!(set.min.as_deref(), Some("1"));
    }

    #[test]
    fn test_values_not_trimmed() {
        let set = parse("default: padded ");
        assert_eq!(set.default.as_deref(), Some(" padded "));
    }

    #[test]
    fn test_oneof_consumes_until_known_directive() {
        let set = parse("oneof:prod,staging,dev,required,max:10");
        assert_eq!(set.allowed_list(), "dev, prod, staging");
        assert!(set.required);
        assert_eq!(set.max.as_deref(), Some("10"));
    }

    #[test]
    fn test_oneof_dedups_and_sorts() {
        let set = parse("oneof:b,a,b,c,a");
        assert_eq!(set.allowed.iter().cloned().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_oneof_drops_empty_entries() {
        let set = parse("oneof:,a,b");
        assert_eq!(set.allowed_list(), "a, b");
    }

    #[test]
    fn test_name_and_prefix() {
        let set = parse("name:http.listen,prefix:db");
        assert_eq!(set.explicit_key.as_deref(), Some("http.listen"));
        assert_eq!(set.group_prefix.as_deref(), Some("db"));
    }

    #[test]
    fn test_unknown_directives_ignored() {
        let set = parse("deprecated,frobnicate:3,required");
        assert!(set.required);
        assert_eq!(set.min, None);
    }

    #[test]
    fn test_empty_default_is_present() {
        let set = parse("default");
        assert_eq!(set.default.as_deref(), Some(""));
    }
}
