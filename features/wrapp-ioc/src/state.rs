/// Chain of binding names walked while validating dependencies
///
/// The first entry is the binding validation started from,
/// the last entry is the binding whose dependencies are currently checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    chain: Vec<String>,
}

impl State {
    pub fn new(target: impl Into<String>) -> Self {
        State {
            chain: vec![target.into()],
        }
    }

    /// The binding validation started from
    pub fn target(&self) -> &str {
        self.chain.first().map(String::as_str).unwrap_or_default()
    }

    /// The binding currently being validated
    pub fn top(&self) -> &str {
        self.chain.last().map(String::as_str).unwrap_or_default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.chain.iter().any(|entry| entry == name)
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.chain.push(name.into());
    }

    /// Independent copy, so sibling dependencies do not see each others paths
    pub fn fork(&self) -> State {
        self.clone()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Renders the chain followed by `last`
    ///
    /// Entries before the first occurrence of `last` are joined with `→`,
    /// entries from there on with `⇄`: `Client → A ⇄ B ⇄ A`
    pub fn path(&self, last: &str) -> String {
        let mut in_cycle = false;
        let mut parts = Vec::with_capacity(self.chain.len() + 1);

        for name in &self.chain {
            in_cycle |= name == last;
            let arrow = if in_cycle { "⇄" } else { "→" };
            parts.push(format!("{name} {arrow}"));
        }
        parts.push(last.to_string());

        parts.join(" ")
    }
}

impl<S: Into<String>> FromIterator<S> for State {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        State {
            chain: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behaves_like_a_stack() {
        let mut first = State::new("target1");
        assert!(first.has("target1"));
        assert!(!first.has("target2"));

        first.push("target2");
        assert!(first.has("target2"));
        assert_eq!(first.target(), "target1");
        assert_eq!(first.top(), "target2");

        let mut second = first.fork();
        second.push("target3");

        assert!(second.has("target1"));
        assert!(second.has("target3"));
        assert!(!first.has("target3"));
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn renders_a_full_cycle() {
        let mut state: State = ["target1", "target2"].into_iter().collect();
        state.push("target3");

        assert_eq!(
            state.path("target1"),
            "target1 ⇄ target2 ⇄ target3 ⇄ target1"
        );
    }

    #[test]
    fn renders_the_lead_in_before_a_cycle() {
        let state: State = ["Client", "A", "B"].into_iter().collect();

        assert_eq!(state.path("A"), "Client → A ⇄ B ⇄ A");
    }
}
