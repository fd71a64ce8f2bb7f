// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Search box state: the query text, whether the suggestion popover is open,
/// and which suggestion is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchState {
    pub query: String,
    pub open: bool,
    pub active: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCommand {
    Insert(char),
    Backspace,
    ClearQuery,
    MoveUp,
    MoveDown,
    Submit,
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// State changed (or not), nothing to act on.
    None,
    /// Commit the suggestion at this index as the new selection.
    Commit(usize),
    /// The popover was dismissed; the selection is untouched.
    Dismissed,
}

impl SearchState {
    /// Apply one keyboard command against the current suggestion count.
    ///
    /// The suggestion list itself is recomputed by the caller from the query
    /// on every keystroke; this state machine only tracks the cursor.
    pub fn apply(&mut self, command: SearchCommand, suggestion_count: usize) -> SearchOutcome {
        match command {
            SearchCommand::Insert(ch) => {
                self.query.push(ch);
                self.open = true;
                self.active = 0;
                SearchOutcome::None
            }
            SearchCommand::Backspace => {
                self.query.pop();
                self.open = true;
                self.active = 0;
                SearchOutcome::None
            }
            SearchCommand::ClearQuery => {
                self.query.clear();
                self.open = true;
                self.active = 0;
                SearchOutcome::None
            }
            SearchCommand::MoveUp => {
                if self.open && suggestion_count > 0 {
                    self.active = self.active.saturating_sub(1);
                }
                SearchOutcome::None
            }
            SearchCommand::MoveDown => {
                if self.open && suggestion_count > 0 {
                    self.active = (self.active + 1).min(suggestion_count - 1);
                }
                SearchOutcome::None
            }
            SearchCommand::Submit => {
                if !self.open {
                    self.open = true;
                    self.active = 0;
                    return SearchOutcome::None;
                }
                if suggestion_count == 0 {
                    return SearchOutcome::None;
                }
                // Fall back to the first entry when the cursor ran past the
                // (shrunken) suggestion list.
                let index = if self.active < suggestion_count {
                    self.active
                } else {
                    0
                };
                self.open = false;
                SearchOutcome::Commit(index)
            }
            SearchCommand::Dismiss => {
                self.open = false;
                SearchOutcome::Dismissed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SearchCommand, SearchOutcome, SearchState};

    #[test]
    fn typing_opens_popover_and_resets_cursor() {
        let mut search = SearchState::default();
        search.apply(SearchCommand::Insert('h'), 3);
        search.apply(SearchCommand::MoveDown, 3);
        assert_eq!(search.active, 1);

        search.apply(SearchCommand::Insert('a'), 2);
        assert_eq!(search.query, "ha");
        assert!(search.open);
        assert_eq!(search.active, 0);

        search.apply(SearchCommand::MoveDown, 2);
        search.apply(SearchCommand::Backspace, 3);
        assert_eq!(search.query, "h");
        assert_eq!(search.active, 0);
    }

    #[test]
    fn cursor_clamps_without_wraparound() {
        let mut search = SearchState {
            query: "a".to_owned(),
            open: true,
            active: 0,
        };
        search.apply(SearchCommand::MoveUp, 3);
        assert_eq!(search.active, 0);

        search.apply(SearchCommand::MoveDown, 3);
        search.apply(SearchCommand::MoveDown, 3);
        search.apply(SearchCommand::MoveDown, 3);
        assert_eq!(search.active, 2);

        search.apply(SearchCommand::MoveUp, 3);
        assert_eq!(search.active, 1);
    }

    #[test]
    fn cursor_is_inert_when_closed_or_empty() {
        let mut closed = SearchState {
            query: "a".to_owned(),
            open: false,
            active: 0,
        };
        closed.apply(SearchCommand::MoveDown, 3);
        assert_eq!(closed.active, 0);

        let mut empty = SearchState {
            query: "zzz".to_owned(),
            open: true,
            active: 0,
        };
        empty.apply(SearchCommand::MoveDown, 0);
        assert_eq!(empty.active, 0);
    }

    #[test]
    fn submit_opens_when_closed_then_commits_when_open() {
        let mut search = SearchState {
            query: "h".to_owned(),
            open: false,
            active: 0,
        };
        assert_eq!(search.apply(SearchCommand::Submit, 3), SearchOutcome::None);
        assert!(search.open);

        search.apply(SearchCommand::MoveDown, 3);
        assert_eq!(
            search.apply(SearchCommand::Submit, 3),
            SearchOutcome::Commit(1)
        );
        assert!(!search.open);
    }

    #[test]
    fn submit_falls_back_to_first_when_cursor_is_out_of_range() {
        let mut search = SearchState {
            query: "h".to_owned(),
            open: true,
            active: 2,
        };
        // The list shrank under the cursor between keystrokes.
        assert_eq!(
            search.apply(SearchCommand::Submit, 1),
            SearchOutcome::Commit(0)
        );
    }

    #[test]
    fn submit_with_no_suggestions_commits_nothing() {
        let mut search = SearchState {
            query: "zzz".to_owned(),
            open: true,
            active: 0,
        };
        assert_eq!(search.apply(SearchCommand::Submit, 0), SearchOutcome::None);
        assert!(search.open);
    }

    #[test]
    fn dismiss_closes_without_committing() {
        let mut search = SearchState {
            query: "h".to_owned(),
            open: true,
            active: 1,
        };
        assert_eq!(
            search.apply(SearchCommand::Dismiss, 3),
            SearchOutcome::Dismissed
        );
        assert!(!search.open);
        assert_eq!(search.query, "h");
    }
}
