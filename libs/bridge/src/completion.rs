//! Completion candidates as the host sees them: byte ranges into the buffer
//! the sender typed, plus the text that would replace each range.

use std::ops::Range;

use azalea_brigadier::prelude::CommandDispatcher;
use azalea_brigadier::string_reader::StringReader;

use crate::source::CommandSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub range: Range<usize>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completions {
    /// Where the list as a whole is anchored
    pub range: Range<usize>,
    pub list: Vec<Completion>,
}

impl Completions {
    pub fn new(range: Range<usize>, list: Vec<Completion>) -> Self {
        Self { range, list }
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.list.iter().map(|c| c.text.as_str()).collect()
    }

    /// Move every candidate range from `from..` in the parsed input onto
    /// `to..` in the buffer the sender typed
    pub fn rebased(self, from: usize, to: usize) -> Self {
        let shift = |position: usize| (position + to).saturating_sub(from);
        let list = self
            .list
            .into_iter()
            .map(|completion| Completion {
                range: shift(completion.range.start)..shift(completion.range.end),
                text: completion.text,
            })
            .collect();
        Self {
            range: shift(self.range.start)..shift(self.range.end),
            list,
        }
    }

    /// Re-anchor the list at `position`
    pub fn anchored_at(mut self, position: usize) -> Self {
        self.range = position..position;
        self
    }
}

/// Parse `input` against `dispatcher` and collect the candidates for its end,
/// anchored at the end of `input`
pub fn complete_input(
    dispatcher: &CommandDispatcher<CommandSource>,
    input: &str,
    source: CommandSource,
) -> Completions {
    let parse = dispatcher.parse(StringReader::from(input.to_string()), source);
    let suggestions = CommandDispatcher::get_completion_suggestions(parse);
    let list = suggestions
        .list()
        .iter()
        .map(|suggestion| Completion {
            range: suggestion.range.start()..suggestion.range.end(),
            text: suggestion.text().to_string(),
        })
        .collect();
    Completions::new(input.len()..input.len(), list)
}
