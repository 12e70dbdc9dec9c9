use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewType {
    Journal,
    Habits,
    Lists,
    Goals,
    Stats,
}

/// One back-navigation checkpoint. Pushed and popped whole, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub view: ViewType,
    pub scroll_position: usize,
    pub entry_id: Option<i64>,
}

/// Plain LIFO stack of navigation checkpoints. No deduplication and no
/// size cap.
#[derive(Debug, Clone, Default)]
pub struct NavigationHistory {
    stack: Vec<NavigationState>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, state: NavigationState) {
        self.stack.push(state);
    }

    pub fn go_back(&mut self) -> Option<NavigationState> {
        self.stack.pop()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    pub fn can_go_back(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn current(&self) -> Option<&NavigationState> {
        self.stack.last()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
