//! URI patterns for templated resources
//!
//! A pattern such as `users://{user_id}/profile` is split into literal and
//! placeholder segments. Each placeholder captures one or more characters
//! other than `/`, as few as possible, and the whole URI must be consumed.

/// One piece of a parsed pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled resource URI pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    pattern: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Compile a pattern
    ///
    /// A `{` without a closing `}` is kept as literal text.
    pub fn parse(pattern: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if close > 0 => {
                    literal.push_str(&rest[..open]);
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Param(after[..close].to_string()));
                    rest = &after[close + 1..];
                }
                _ => {
                    literal.push_str(&rest[..=open]);
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// The pattern text this template was compiled from
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Placeholder names in declaration order
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| {
                match segment {
                    Segment::Param(name) => Some(name.as_str()),
                    Segment::Literal(_) => None,
                }
            })
            .collect()
    }

    /// Whether the pattern has no placeholders
    pub fn is_static(&self) -> bool {
        self.segments.iter().all(|segment| matches!(segment, Segment::Literal(_)))
    }

    /// Match a concrete URI, returning captures in declaration order
    pub fn matches(&self, uri: &str) -> Option<Vec<String>> {
        let mut captures = Vec::new();
        if match_segments(&self.segments, uri, &mut captures) {
            Some(captures)
        } else {
            None
        }
    }
}

fn match_segments(segments: &[Segment], input: &str, captures: &mut Vec<String>) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return input.is_empty();
    };

    match first {
        Segment::Literal(literal) =>
            match input.strip_prefix(literal.as_str()) {
                Some(remaining) => match_segments(rest, remaining, captures),
                None => false,
            }
        Segment::Param(_) => {
            // Shortest capture first, growing until a `/` is reached
            for (index, ch) in input.char_indices() {
                if ch == '/' {
                    break;
                }
                let end = index + ch.len_utf8();
                captures.push(input[..end].to_string());
                if match_segments(rest, &input[end..], captures) {
                    return true;
                }
                captures.pop();
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_placeholder() {
        let template = UriTemplate::parse("greet://{name}");
        assert_eq!(template.matches("greet://world"), Some(vec!["world".to_string()]));
        assert_eq!(template.matches("farewell://world"), None);
        assert_eq!(template.param_names(), vec!["name"]);
    }

    #[test]
    fn test_placeholder_needs_at_least_one_char() {
        let template = UriTemplate::parse("test://{id}");
        assert_eq!(template.matches("test://"), None);
        assert_eq!(template.matches("test://123"), Some(vec!["123".to_string()]));
    }

    #[test]
    fn test_placeholder_does_not_cross_slash() {
        let template = UriTemplate::parse("users://{user_id}/profile");
        assert_eq!(template.matches("users://42/profile"), Some(vec!["42".to_string()]));
        assert_eq!(template.matches("users://42/extra/profile"), None);
        assert_eq!(template.matches("users://42/profile/more"), None);
    }

    #[test]
    fn test_multiple_placeholders_in_order() {
        let template = UriTemplate::parse("repo://{owner}/{name}");
        assert_eq!(
            template.matches("repo://rust-lang/cargo"),
            Some(vec!["rust-lang".to_string(), "cargo".to_string()])
        );
        assert_eq!(template.param_names(), vec!["owner", "name"]);
    }

    #[test]
    fn test_capture_is_non_greedy_up_to_next_literal() {
        let template = UriTemplate::parse("file://{stem}.{ext}");
        assert_eq!(
            template.matches("file://archive.tar.gz"),
            Some(vec!["archive".to_string(), "tar.gz".to_string()])
        );
    }

    #[test]
    fn test_static_pattern_matches_exactly() {
        let template = UriTemplate::parse("test://static");
        assert!(template.is_static());
        assert_eq!(template.matches("test://static"), Some(vec![]));
        assert_eq!(template.matches("test://static2"), None);
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        let template = UriTemplate::parse("odd://{oops");
        assert!(template.is_static());
        assert_eq!(template.matches("odd://{oops"), Some(vec![]));
    }

    #[test]
    fn test_multibyte_captures() {
        let template = UriTemplate::parse("echo://{message}");
        assert_eq!(template.matches("echo://héllo"), Some(vec!["héllo".to_string()]));
    }
}
