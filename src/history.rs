//! Browsing history for `back`, `forward` and `reload`.

use crate::http::RequestContext;

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<RequestContext>,
    position: Option<usize>,
}

impl History {
    /// Record a request, discarding any entries ahead of the current one.
    pub fn push(&mut self, request: RequestContext) {
        let keep = self.position.map_or(0, |pos| pos + 1);
        self.entries.truncate(keep);
        self.entries.push(request);
        self.position = Some(self.entries.len() - 1);
    }

    pub fn current(&self) -> Option<&RequestContext> {
        self.position.and_then(|pos| self.entries.get(pos))
    }

    /// The entry `back` would move to, without moving.
    pub fn peek_back(&self) -> Option<&RequestContext> {
        match self.position {
            Some(pos) if pos > 0 => self.entries.get(pos - 1),
            _ => None,
        }
    }

    pub fn peek_forward(&self) -> Option<&RequestContext> {
        self.position.and_then(|pos| self.entries.get(pos + 1))
    }

    pub fn back(&mut self) -> Option<&RequestContext> {
        match self.position {
            Some(pos) if pos > 0 => {
                self.position = Some(pos - 1);
                self.entries.get(pos - 1)
            }
            _ => None,
        }
    }

    pub fn forward(&mut self) -> Option<&RequestContext> {
        match self.position {
            Some(pos) if pos + 1 < self.entries.len() => {
                self.position = Some(pos + 1);
                self.entries.get(pos + 1)
            }
            _ => None,
        }
    }

    pub fn entries(&self) -> &[RequestContext] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = None;
    }
}
