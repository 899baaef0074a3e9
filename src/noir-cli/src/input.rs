//! Single-line text entry with prefix suggestions.

use std::rc::Rc;

use crossterm::event::KeyCode;

#[derive(Debug, Clone, Default)]
struct Suggestions {
    /// Original spelling, shown and accepted.
    names: Rc<[String]>,
    /// Lowercased copies used for matching.
    folded: Rc<[String]>,
}

/// An editable line of text. The cursor counts characters, not bytes.
#[derive(Debug, Clone)]
pub struct TextInput {
    value: String,
    cursor: usize,
    char_limit: usize,
    suggestions: Suggestions,
    /// Indices into `suggestions` matching the current value.
    matches: Vec<usize>,
    selected_match: usize,
}

impl TextInput {
    pub fn new(char_limit: usize) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            char_limit,
            suggestions: Suggestions::default(),
            matches: Vec::new(),
            selected_match: 0,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The text left of the cursor.
    pub fn before_cursor(&self) -> &str {
        &self.value[..self.byte_offset(self.cursor)]
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.chars().take(self.char_limit).collect();
        self.cursor = self.len();
        self.refresh_matches();
    }

    pub fn set_suggestions(&mut self, names: Vec<String>) {
        let folded: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        self.suggestions = Suggestions {
            names: names.into(),
            folded: folded.into(),
        };
        self.refresh_matches();
    }

    pub fn suggestion_count(&self) -> usize {
        self.suggestions.names.len()
    }

    /// The highlighted suggestion for the current value, if any.
    pub fn current_suggestion(&self) -> Option<&str> {
        self.matches
            .get(self.selected_match)
            .map(|&i| self.suggestions.names[i].as_str())
    }

    /// The part of the current suggestion not typed yet, for ghost rendering.
    pub fn completion_hint(&self) -> Option<String> {
        let suggestion = self.current_suggestion()?;
        let rest: String = suggestion.chars().skip(self.len()).collect();
        (!rest.is_empty()).then_some(rest)
    }

    /// Handle an editing key. Returns false for keys the input ignores.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char(c) => {
                if self.len() < self.char_limit {
                    let at = self.byte_offset(self.cursor);
                    self.value.insert(at, c);
                    self.cursor += 1;
                    self.refresh_matches();
                }
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                    self.refresh_matches();
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                    self.refresh_matches();
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => {
                if self.cursor < self.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            KeyCode::Tab => {
                if let Some(suggestion) = self.current_suggestion().map(str::to_string) {
                    self.set_value(&suggestion);
                }
            }
            KeyCode::Down => {
                if !self.matches.is_empty() {
                    self.selected_match = (self.selected_match + 1) % self.matches.len();
                }
            }
            KeyCode::Up => {
                if !self.matches.is_empty() {
                    let count = self.matches.len();
                    self.selected_match = (self.selected_match + count - 1) % count;
                }
            }
            _ => return false,
        }
        true
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn refresh_matches(&mut self) {
        self.selected_match = 0;
        self.matches.clear();
        if self.value.is_empty() {
            return;
        }
        let needle = self.value.to_lowercase();
        self.matches.extend(
            self.suggestions
                .folded
                .iter()
                .enumerate()
                .filter(|(_, name)| name.starts_with(&needle))
                .map(|(i, _)| i),
        );
    }
}
