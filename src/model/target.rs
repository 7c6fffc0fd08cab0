//! Resolution of workspace target specifiers such as `"3"`, `"last"`,
//! `"right"` or `"Mail"`, as used by keybindings and commands.
//!
//! Rules are tried in this order:
//! 1. a positive decimal number is a 1-based position,
//! 2. the keywords `current`, `last`, `left` and `right` (any case),
//! 3. a workspace name (any case).

use serde::{Deserialize, Serialize};
use strum::EnumString;
use tracing::error;

use super::workspace::{WorkspaceId, WorkspaceRegistry};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Index next to `i` in a sequence of `len`. Stepping off either end
    /// yields `None` unless `wrap` is set.
    pub fn step(self, i: usize, len: usize, wrap: bool) -> Option<usize> {
        if len == 0 {
            return None;
        }
        match self {
            Direction::Left if i == 0 => wrap.then(|| len - 1),
            Direction::Left => Some(i - 1),
            Direction::Right if i + 1 >= len => wrap.then_some(0),
            Direction::Right => Some(i + 1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
pub enum Keyword {
    Current,
    Last,
    Left,
    Right,
}

/// A parsed target specifier, before it is looked up in a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target<'a> {
    Ordinal(usize),
    Keyword(Keyword),
    Name(&'a str),
}

impl<'a> Target<'a> {
    pub fn parse(spec: &'a str) -> Target<'a> {
        if let Some(ordinal) = parse_workspace_index(spec) {
            Target::Ordinal(ordinal)
        } else if let Ok(keyword) = spec.parse::<Keyword>() {
            Target::Keyword(keyword)
        } else {
            Target::Name(spec)
        }
    }
}

/// Accepts only strings made entirely of ASCII digits whose value is
/// positive and fits in a `usize`.
///
/// | input           | result     |
/// |-----------------|------------|
/// | `"124"`         | `Some(124)`|
/// | `"0"`           | `None`     |
/// | `"-50"`         | `None`     |
/// | `"1.24"`        | `None`     |
/// | `"2nd desktop"` | `None`     |
pub fn parse_workspace_index(spec: &str) -> Option<usize> {
    if spec.is_empty() || !spec.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    spec.parse::<usize>().ok().filter(|&index| index > 0)
}

/// Resolves `spec` relative to `anchor`. `wrap` only affects `left` and
/// `right`. A missing or empty spec never matches. Failed lookups are logged
/// and return `None`; callers treat that as "don't switch".
pub fn find(
    registry: &WorkspaceRegistry,
    anchor: WorkspaceId,
    spec: Option<&str>,
    wrap: bool,
) -> Option<WorkspaceId> {
    let Some(spec) = spec.filter(|spec| !spec.is_empty()) else {
        error!("Empty workspace name");
        return None;
    };
    let found = match Target::parse(spec) {
        Target::Ordinal(ordinal) => registry.by_ordinal(ordinal),
        Target::Keyword(Keyword::Current) => Some(anchor),
        // `last` can legitimately be unset before the first switch.
        Target::Keyword(Keyword::Last) => return registry.last(),
        Target::Keyword(Keyword::Left) => return registry.neighbor(anchor, Direction::Left, wrap),
        Target::Keyword(Keyword::Right) => {
            return registry.neighbor(anchor, Direction::Right, wrap);
        }
        Target::Name(name) => registry.by_name(name),
    };
    if found.is_none() {
        error!("Workspace '{spec}' not found");
    }
    found
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing::Level;
    use tracing_subscriber::layer::{self, Layer, SubscriberExt};

    use super::*;
    use crate::sys::scene::{HeadlessScene, Scene};

    fn registry(names: &[&str]) -> WorkspaceRegistry {
        let mut scene = HeadlessScene::new();
        let root = scene.root();
        WorkspaceRegistry::new(names.iter().copied(), &mut scene, root)
    }

    fn nth(registry: &WorkspaceRegistry, ordinal: usize) -> WorkspaceId {
        registry.by_ordinal(ordinal).unwrap()
    }

    #[test]
    fn index_rule_accepts_only_whole_positive_numbers() {
        assert_eq!(parse_workspace_index("124"), Some(124));
        assert_eq!(parse_workspace_index("007"), Some(7));
        assert_eq!(parse_workspace_index("-50"), None);
        assert_eq!(parse_workspace_index("+5"), None);
        assert_eq!(parse_workspace_index("0"), None);
        assert_eq!(parse_workspace_index("1.24"), None);
        assert_eq!(parse_workspace_index("2nd desktop"), None);
        assert_eq!(parse_workspace_index(" 3"), None);
        assert_eq!(parse_workspace_index(""), None);
        assert_eq!(parse_workspace_index("99999999999999999999999999"), None);
    }

    #[test]
    fn parse_precedence() {
        assert_eq!(Target::parse("2"), Target::Ordinal(2));
        assert_eq!(Target::parse("LaSt"), Target::Keyword(Keyword::Last));
        assert_eq!(Target::parse("RIGHT"), Target::Keyword(Keyword::Right));
        assert_eq!(Target::parse("0"), Target::Name("0"));
        assert_eq!(Target::parse("rightmost"), Target::Name("rightmost"));
    }

    #[test]
    fn ordinals_resolve_by_position() {
        let reg = registry(&["1", "2", "3"]);
        let anchor = nth(&reg, 1);
        assert_eq!(find(&reg, anchor, Some("3"), false), Some(nth(&reg, 3)));
        assert_eq!(find(&reg, anchor, Some("124"), false), None);
    }

    #[test]
    fn numeric_looking_specs_fall_through_to_names() {
        let reg = registry(&["main", "-50", "1.24", "2nd desktop", "0"]);
        let anchor = nth(&reg, 1);
        assert_eq!(find(&reg, anchor, Some("-50"), false), Some(nth(&reg, 2)));
        assert_eq!(find(&reg, anchor, Some("1.24"), false), Some(nth(&reg, 3)));
        assert_eq!(find(&reg, anchor, Some("2nd desktop"), false), Some(nth(&reg, 4)));
        assert_eq!(find(&reg, anchor, Some("0"), false), Some(nth(&reg, 5)));

        let plain = registry(&["1", "2"]);
        let anchor = nth(&plain, 1);
        for spec in ["-50", "0", "1.24", "2nd desktop"] {
            assert_eq!(find(&plain, anchor, Some(spec), false), None, "{spec}");
        }
    }

    #[test]
    fn current_is_always_the_anchor() {
        let reg = registry(&["1", "2", "3"]);
        for anchor in reg.ids() {
            assert_eq!(find(&reg, anchor, Some("current"), false), Some(anchor));
            assert_eq!(find(&reg, anchor, Some("CURRENT"), true), Some(anchor));
        }
    }

    #[test]
    fn last_follows_the_registry() {
        let mut reg = registry(&["1", "2", "3"]);
        let first = nth(&reg, 1);
        assert_eq!(find(&reg, first, Some("last"), false), None);
        reg.set_current(nth(&reg, 3));
        assert_eq!(find(&reg, nth(&reg, 3), Some("Last"), false), Some(first));
    }

    #[test]
    fn left_and_right_respect_wrap() {
        let reg = registry(&["1", "2", "3"]);
        let (one, two, three) = (nth(&reg, 1), nth(&reg, 2), nth(&reg, 3));

        assert_eq!(find(&reg, one, Some("right"), false), Some(two));
        assert_eq!(find(&reg, three, Some("right"), false), None);
        assert_eq!(find(&reg, three, Some("right"), true), Some(one));

        assert_eq!(find(&reg, two, Some("left"), false), Some(one));
        assert_eq!(find(&reg, one, Some("left"), false), None);
        assert_eq!(find(&reg, one, Some("Left"), true), Some(three));
    }

    #[test]
    fn single_workspace_wraps_onto_itself() {
        let reg = registry(&["only"]);
        let only = nth(&reg, 1);
        assert_eq!(find(&reg, only, Some("left"), false), None);
        assert_eq!(find(&reg, only, Some("right"), true), Some(only));
    }

    #[test]
    fn names_match_case_insensitively() {
        let reg = registry(&["workspace-1", "workspace-2"]);
        let anchor = nth(&reg, 2);
        assert_eq!(find(&reg, anchor, Some("WORKSPACE-1"), false), Some(nth(&reg, 1)));
        assert_eq!(find(&reg, anchor, Some("workspace-9"), false), None);
    }

    #[derive(Clone, Default)]
    struct ErrorCount(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for ErrorCount {
        fn on_event(&self, event: &tracing::Event<'_>, _: layer::Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn errors_logged(f: impl FnOnce()) -> usize {
        let count = ErrorCount::default();
        let subscriber = tracing_subscriber::registry().with(count.clone());
        tracing::subscriber::with_default(subscriber, f);
        count.0.load(Ordering::SeqCst)
    }

    #[test]
    fn missing_or_empty_spec_never_matches() {
        let reg = registry(&["", "1"]);
        let anchor = nth(&reg, 2);
        assert_eq!(errors_logged(|| assert_eq!(find(&reg, anchor, None, false), None)), 1);
        assert_eq!(errors_logged(|| assert_eq!(find(&reg, anchor, Some(""), false), None)), 1);
    }

    #[test]
    fn failed_lookups_are_logged() {
        let reg = registry(&["mail", "web"]);
        let anchor = nth(&reg, 1);
        assert_eq!(errors_logged(|| assert_eq!(find(&reg, anchor, Some("chat"), false), None)), 1);
        assert_eq!(errors_logged(|| assert_eq!(find(&reg, anchor, Some("3"), false), None)), 1);
        let web = nth(&reg, 2);
        assert_eq!(errors_logged(|| assert_eq!(find(&reg, anchor, Some("WEB"), false), Some(web))), 0);
    }

    #[test]
    fn direction_step() {
        assert_eq!(Direction::Left.step(0, 3, true), Some(2));
        assert_eq!(Direction::Right.step(2, 3, true), Some(0));
        assert_eq!(Direction::Right.step(1, 3, false), Some(2));
        assert_eq!(Direction::Right.step(0, 0, true), None);
    }
}
