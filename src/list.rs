//! Doubly linked list over an index arena
//!
//! Nodes live in a [`GrowableSequence`] and link to each other by slot
//! index. Freed slots are chained through their `next` field and reused,
//! so unlinking never allocates. `reverse` toggles a flag; the logical
//! front is the physical `first` node unless the list is reversed, in
//! which case every walk follows `prev` instead of `next`.

use crate::error::Result;
use crate::sequence::GrowableSequence;
use std::fmt;

struct Node<T> {
    value: Option<T>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly linked list with O(1) operations at both ends and O(1) reversal.
pub struct DoublyLinkedList<T> {
    nodes: GrowableSequence<Node<T>>,
    /// Head of the chain of vacant slots
    free: Option<usize>,
    first: Option<usize>,
    last: Option<usize>,
    len: usize,
    reversed: bool,
}

impl<T> DoublyLinkedList<T> {
    pub fn new() -> Self {
        Self {
            nodes: GrowableSequence::new(),
            free: None,
            first: None,
            last: None,
            len: 0,
            reversed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn front_slot(&self) -> Option<usize> {
        if self.reversed { self.last } else { self.first }
    }

    #[inline]
    fn back_slot(&self) -> Option<usize> {
        if self.reversed { self.first } else { self.last }
    }

    /// Slot after `node` in logical order.
    #[inline]
    fn step(&self, node: &Node<T>) -> Option<usize> {
        if self.reversed { node.prev } else { node.next }
    }

    fn alloc(&mut self, node: Node<T>) -> Result<usize> {
        if let Some(slot) = self.free {
            if let Some(vacant) = self.nodes.get_mut(slot) {
                self.free = vacant.next;
                *vacant = node;
                return Ok(slot);
            }
        }
        self.nodes.push_back(node)?;
        Ok(self.nodes.len() - 1)
    }

    fn link_first(&mut self, value: T) -> Result<()> {
        let slot = self.alloc(Node {
            value: Some(value),
            prev: None,
            next: self.first,
        })?;
        match self.first.and_then(|old| self.nodes.get_mut(old)) {
            Some(old) => old.prev = Some(slot),
            None => self.last = Some(slot),
        }
        self.first = Some(slot);
        self.len += 1;
        Ok(())
    }

    fn link_last(&mut self, value: T) -> Result<()> {
        let slot = self.alloc(Node {
            value: Some(value),
            prev: self.last,
            next: None,
        })?;
        match self.last.and_then(|old| self.nodes.get_mut(old)) {
            Some(old) => old.next = Some(slot),
            None => self.first = Some(slot),
        }
        self.last = Some(slot);
        self.len += 1;
        Ok(())
    }

    /// Detach the node in `slot`, return its value and recycle the slot.
    fn unlink(&mut self, slot: usize) -> Option<T> {
        let node = self.nodes.get_mut(slot)?;
        let value = node.value.take()?;
        let (prev, next) = (node.prev, node.next);
        node.prev = None;
        node.next = self.free;
        self.free = Some(slot);

        match prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(before) => before.next = next,
            None => self.first = next,
        }
        match next.and_then(|n| self.nodes.get_mut(n)) {
            Some(after) => after.prev = prev,
            None => self.last = prev,
        }
        self.len -= 1;
        Some(value)
    }

    /// Insert at the logical front. O(1) amortized.
    pub fn push_front(&mut self, value: T) -> Result<()> {
        if self.reversed {
            self.link_last(value)
        } else {
            self.link_first(value)
        }
    }

    /// Insert at the logical back. O(1) amortized.
    pub fn push_back(&mut self, value: T) -> Result<()> {
        if self.reversed {
            self.link_first(value)
        } else {
            self.link_last(value)
        }
    }

    /// Remove and return the front value. O(1).
    pub fn pop_front(&mut self) -> Option<T> {
        let slot = self.front_slot()?;
        self.unlink(slot)
    }

    /// Remove and return the back value. O(1).
    pub fn pop_back(&mut self) -> Option<T> {
        let slot = self.back_slot()?;
        self.unlink(slot)
    }

    pub fn front(&self) -> Option<&T> {
        self.front_slot()
            .and_then(|slot| self.nodes.get(slot))
            .and_then(|node| node.value.as_ref())
    }

    pub fn back(&self) -> Option<&T> {
        self.back_slot()
            .and_then(|slot| self.nodes.get(slot))
            .and_then(|node| node.value.as_ref())
    }

    /// Replace the front value. Returns `false` on an empty list.
    pub fn set_front(&mut self, value: T) -> bool {
        self.replace(self.front_slot(), value)
    }

    /// Replace the back value. Returns `false` on an empty list.
    pub fn set_back(&mut self, value: T) -> bool {
        self.replace(self.back_slot(), value)
    }

    fn replace(&mut self, slot: Option<usize>, value: T) -> bool {
        match slot.and_then(|slot| self.nodes.get_mut(slot)) {
            Some(node) => {
                node.value = Some(value);
                true
            }
            None => false,
        }
    }

    /// Toggle the logical order. O(1).
    pub fn reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free = None;
        self.first = None;
        self.last = None;
        self.len = 0;
        self.reversed = false;
    }

    /// Iterate front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.front_slot(),
            remaining: self.len,
        }
    }
}

impl<T: PartialEq> DoublyLinkedList<T> {
    /// Whether any value equals `value`. O(N).
    pub fn contains(&self, value: &T) -> bool {
        self.iter().any(|item| item == value)
    }

    /// Unlink the first value (front to back) equal to `value`. O(N).
    pub fn remove_first(&mut self, value: &T) -> bool {
        let mut cursor = self.front_slot();
        let mut found = None;
        while let Some(node) = cursor.and_then(|slot| self.nodes.get(slot)) {
            if node.value.as_ref() == Some(value) {
                found = cursor;
                break;
            }
            cursor = self.step(node);
        }
        match found {
            Some(slot) => self.unlink(slot).is_some(),
            None => false,
        }
    }
}

/// Front-to-back iterator over a [`DoublyLinkedList`].
pub struct Iter<'a, T> {
    list: &'a DoublyLinkedList<T>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.nodes.get(self.cursor?)?;
        self.cursor = self.list.step(node);
        self.remaining -= 1;
        node.value.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> Default for DoublyLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for DoublyLinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Renders as `a <-> b <-> c`.
impl<T: fmt::Display> fmt::Display for DoublyLinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, item) in self.iter().enumerate() {
            if index > 0 {
                write!(f, " <-> ")?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &DoublyLinkedList<i32>) -> Vec<i32> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_push_and_pop_both_ends() {
        let mut list = DoublyLinkedList::new();
        list.push_back(2).unwrap();
        list.push_back(3).unwrap();
        list.push_front(1).unwrap();
        assert_eq!(collect(&list), vec![1, 2, 3]);
        assert_eq!(list.len(), 3);

        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), None);
        assert_eq!(list.pop_front(), None);
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
    }

    #[test]
    fn test_head_and_tail_access() {
        let mut list = DoublyLinkedList::new();
        assert!(!list.set_front(9));
        assert!(!list.set_back(9));

        for value in 1..=4 {
            list.push_back(value).unwrap();
        }
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&4));

        assert!(list.set_front(10));
        assert!(list.set_back(40));
        assert_eq!(collect(&list), vec![10, 2, 3, 40]);
    }

    #[test]
    fn test_reverse_is_logical() {
        let mut list = DoublyLinkedList::new();
        for value in 1..=3 {
            list.push_back(value).unwrap();
        }
        list.reverse();
        assert_eq!(collect(&list), vec![3, 2, 1]);
        assert_eq!(list.front(), Some(&3));

        list.push_front(4).unwrap();
        list.push_back(0).unwrap();
        assert_eq!(collect(&list), vec![4, 3, 2, 1, 0]);
        assert_eq!(list.pop_back(), Some(0));

        list.reverse();
        assert_eq!(collect(&list), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_find_and_remove() {
        let mut list = DoublyLinkedList::new();
        for value in [5, 7, 5, 9] {
            list.push_back(value).unwrap();
        }
        assert!(list.contains(&9));
        assert!(!list.contains(&6));

        assert!(list.remove_first(&5));
        assert_eq!(collect(&list), vec![7, 5, 9]);

        list.reverse();
        assert!(list.remove_first(&9));
        assert!(list.remove_first(&7));
        assert_eq!(collect(&list), vec![5]);
        assert!(!list.remove_first(&7));
        assert_eq!(list.front(), list.back());
    }

    #[test]
    fn test_slots_are_reused() {
        let mut list = DoublyLinkedList::new();
        for value in 0..4 {
            list.push_back(value).unwrap();
        }
        let capacity = list.nodes.capacity();
        for round in 0..10 {
            list.pop_front();
            list.push_back(round).unwrap();
        }
        assert_eq!(list.nodes.len(), 4);
        assert_eq!(list.nodes.capacity(), capacity);
        assert_eq!(collect(&list), vec![6, 7, 8, 9]);
    }

    #[test]
    fn test_display_and_clear() {
        let mut list = DoublyLinkedList::new();
        assert_eq!(list.to_string(), "");
        for value in 1..=3 {
            list.push_back(value).unwrap();
        }
        assert_eq!(list.to_string(), "1 <-> 2 <-> 3");
        assert_eq!(format!("{:?}", list), "[1, 2, 3]");

        list.reverse();
        list.clear();
        assert!(list.is_empty());
        list.push_back(1).unwrap();
        list.push_back(2).unwrap();
        assert_eq!(list.to_string(), "1 <-> 2");
    }
}
