//! Crawl frontier
//!
//! `todo` is a stack: the most recently discovered link is visited next,
//! which makes the traversal depth-leaning. Replacing it with a queue changes
//! the visit order and is not an equivalent implementation.

use std::collections::HashSet;
use url::Url;

/// URLs waiting to be visited plus URLs already visited
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    /// Pending URLs; the last element is visited next
    todo: Vec<Url>,

    /// Visited URLs in visit order
    done: Vec<Url>,

    /// Membership index for `done`
    done_set: HashSet<Url>,

    /// Every URL ever pushed, visited, or requested before a redirect
    seen: HashSet<Url>,
}

impl Frontier {
    /// Creates a frontier holding only the seed
    ///
    /// The seed is pushed as-is; it is never run through the link filter.
    pub fn new(seed: Url) -> Self {
        let mut frontier = Self::default();
        frontier.seen.insert(seed.clone());
        frontier.todo.push(seed);
        frontier
    }

    /// Takes the most recently pushed URL
    pub fn pop(&mut self) -> Option<Url> {
        self.todo.pop()
    }

    /// Pushes every URL not already pending, visited, or requested
    ///
    /// URLs are pushed in iteration order, so the last new one is popped first.
    /// Returns the number of URLs pushed.
    pub fn push_new<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = Url>,
    {
        let mut added = 0;
        for url in urls {
            if self.seen.insert(url.clone()) {
                self.todo.push(url);
                added += 1;
            }
        }
        added
    }

    /// Records that a URL was requested without adding it to `done`
    ///
    /// Used for the original URL of a redirected fetch, so it is never
    /// requested again.
    pub fn mark_seen(&mut self, url: Url) {
        self.seen.insert(url);
    }

    /// Moves a URL into `done`
    ///
    /// Returns false if it was already there.
    pub fn mark_done(&mut self, url: Url) -> bool {
        if !self.done_set.insert(url.clone()) {
            return false;
        }
        self.seen.insert(url.clone());
        self.done.push(url);
        true
    }

    pub fn is_done(&self, url: &Url) -> bool {
        self.done_set.contains(url)
    }

    pub fn is_empty(&self) -> bool {
        self.todo.is_empty()
    }

    /// Pending URLs, bottom of the stack first
    pub fn todo(&self) -> &[Url] {
        &self.todo
    }

    /// Visited URLs in visit order
    pub fn done(&self) -> &[Url] {
        &self.done
    }
}
