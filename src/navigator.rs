use crate::search::MatchSet;

/// Cyclic cursor over a match set. The cursor is absent while there are no
/// matches and returns to the first match whenever the set is replaced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchNavigator {
    len: usize,
    cursor: usize,
}

#[allow(clippy::should_implement_trait)]
impl MatchNavigator {
    pub fn new(matches: &MatchSet) -> Self {
        Self {
            len: matches.len(),
            cursor: 0,
        }
    }

    /// Track a freshly computed match set.
    pub fn reset(&mut self, matches: &MatchSet) {
        *self = Self::new(matches);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cursor(&self) -> Option<usize> {
        (self.len > 0).then_some(self.cursor)
    }

    pub fn next(&mut self) {
        if self.len == 0 {
            return;
        }
        self.cursor = (self.cursor + 1) % self.len;
    }

    pub fn prev(&mut self) {
        if self.len == 0 {
            return;
        }
        self.cursor = (self.cursor + self.len - 1) % self.len;
    }

    /// Jump to a match; out-of-range indices clamp to the last match.
    pub fn select(&mut self, index: usize) {
        if self.len > 0 {
            self.cursor = index.min(self.len - 1);
        }
    }

    /// `"{cursor+1}/{len}"`, or `None` when there is nothing to count.
    pub fn position_label(&self) -> Option<String> {
        self.cursor()
            .map(|cursor| format!("{}/{}", cursor + 1, self.len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::search;

    fn navigator(text: &str, query: &str) -> MatchNavigator {
        MatchNavigator::new(&search(text, query))
    }

    #[test]
    fn test_next_cycles_back_to_start() {
        let mut nav = navigator("a b a b a", "a");
        assert_eq!(nav.len(), 3);
        for start in 0..3 {
            nav.select(start);
            for _ in 0..3 {
                nav.next();
            }
            assert_eq!(nav.cursor(), Some(start));
        }
    }

    #[test]
    fn test_prev_from_first_wraps_to_last() {
        let mut nav = navigator("x x x x", "x");
        assert_eq!(nav.cursor(), Some(0));
        nav.prev();
        assert_eq!(nav.cursor(), Some(3));
        nav.next();
        assert_eq!(nav.cursor(), Some(0));
    }

    #[test]
    fn test_single_match_stays_put() {
        let mut nav = navigator("only one", "one");
        nav.next();
        assert_eq!(nav.cursor(), Some(0));
        nav.prev();
        assert_eq!(nav.cursor(), Some(0));
    }

    #[test]
    fn test_empty_set_is_noop() {
        let mut nav = navigator("text", "");
        assert!(nav.is_empty());
        nav.next();
        nav.prev();
        nav.select(4);
        assert_eq!(nav.cursor(), None);
        assert_eq!(nav.position_label(), None);
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let mut nav = navigator("c c c", "c");
        nav.select(2);
        assert_eq!(nav.position_label().as_deref(), Some("3/3"));

        nav.reset(&search("c c c", "c c c"));
        assert_eq!(nav.cursor(), Some(0));
        assert_eq!(nav.position_label().as_deref(), Some("1/1"));
    }

    #[test]
    fn test_select_clamps() {
        let mut nav = navigator("a a", "a");
        nav.select(10);
        assert_eq!(nav.cursor(), Some(1));
    }
}
