//! Singly linked list holding the snake's body, head first.

use std::{io::{self, Write}, mem};

use crate::snake::Position;

pub struct Segment {
    pos: Position,
    next: Option<Box<Segment>>,
}

impl Segment {
    fn new(pos: Position, next: Option<Box<Segment>>) -> Self {
        Segment { pos, next }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn next(&self) -> Option<&Segment> {
        self.next.as_deref()
    }
}

#[derive(Default)]
pub struct SegmentList {
    head: Option<Box<Segment>>,
}

impl SegmentList {
    pub fn new() -> Self {
        SegmentList { head: None }
    }

    /// O(1) time, O(1) space.
    pub fn insert_at_head(&mut self, pos: Position) {
        let old_head = self.head.take();
        self.head = Some(Box::new(Segment::new(pos, old_head)));
    }

    /// O(1).
    pub fn head(&self) -> Option<&Segment> {
        self.head.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// O(n) time, O(1) space.
    pub fn count_nodes(&self) -> usize {
        self.iter().count()
    }

    /// Writes every segment's coordinates, head to tail, one per line. O(n).
    pub fn print_nodes<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for pos in self.iter() {
            writeln!(out, "{}", pos)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter { next: self.head() }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.iter().any(|p| p == pos)
    }

    /// Shifts the body one step: the head takes `new_head` and every other
    /// segment takes the position of the one in front of it. With `grow` the
    /// old tail position survives as a new tail segment.
    ///
    /// O(n) time, O(1) extra space. No-op on an empty list.
    pub fn update_positions(&mut self, new_head: Position, grow: bool) {
        if self.is_empty() {
            return;
        }

        let mut carried = new_head;
        let mut link = &mut self.head;
        while let Some(node) = link {
            carried = mem::replace(&mut node.pos, carried);
            link = &mut node.next;
        }

        // `carried` now holds the pre-shift tail position
        if grow {
            *link = Some(Box::new(Segment::new(carried, None)));
        }
    }

    /// Drops the last segment. Lists of zero or one segment are left alone, so
    /// the head is never removed this way. O(n) time, no tail pointer is kept.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn remove_tail(&mut self) {
        let len = self.count_nodes();
        if len < 2 {
            return;
        }
        self.remove_node_at(len - 1);
    }

    /// Unlinks and frees the segment at `index` (0 = head). Out of range
    /// indices are ignored. O(n) time, O(1) space.
    pub fn remove_node_at(&mut self, index: usize) {
        let mut link = &mut self.head;
        for _ in 0..index {
            match link {
                Some(node) => link = &mut node.next,
                None => return,
            }
        }

        if let Some(removed) = link.take() {
            *link = removed.next;
        }
    }
}

impl Drop for SegmentList {
    // Unlink one node at a time; the default recursive drop could overflow
    // the stack on a very long body.
    fn drop(&mut self) {
        let mut link = self.head.take();
        while let Some(mut node) = link {
            link = node.next.take();
        }
    }
}

pub struct Iter<'a> {
    next: Option<&'a Segment>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        self.next.map(|seg| {
            self.next = seg.next();
            seg.pos
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    /// Builds a list whose head is the first element of `positions`.
    fn list_of(positions: &[Position]) -> SegmentList {
        let mut list = SegmentList::new();
        for pos in positions.iter().rev() {
            list.insert_at_head(*pos);
        }
        list
    }

    fn positions(list: &SegmentList) -> Vec<Position> {
        list.iter().collect()
    }

    #[test]
    fn empty_list() {
        let mut list = SegmentList::new();
        assert!(list.is_empty());
        assert!(list.head().is_none());
        assert_eq!(list.count_nodes(), 0);

        list.remove_tail();
        list.remove_node_at(0);
        list.update_positions(p(1, 1), true);
        assert_eq!(list.count_nodes(), 0);
    }

    #[test]
    fn insert_at_head_orders_newest_first() {
        let mut list = SegmentList::new();
        for i in 0..5 {
            list.insert_at_head(p(i, 0));
            assert_eq!(list.count_nodes(), i as usize + 1);
        }

        assert_eq!(positions(&list), vec![p(4, 0), p(3, 0), p(2, 0), p(1, 0), p(0, 0)]);
        assert_eq!(list.head().map(Segment::position), Some(p(4, 0)));
        assert_eq!(list.head().and_then(Segment::next).map(Segment::position), Some(p(3, 0)));
    }

    #[test]
    fn update_positions_shifts_without_growing() {
        let mut list = list_of(&[p(10, 0), p(11, 0), p(12, 0)]);
        list.update_positions(p(9, 0), false);

        assert_eq!(positions(&list), vec![p(9, 0), p(10, 0), p(11, 0)]);
    }

    #[test]
    fn update_positions_grow_keeps_old_tail() {
        let mut list = list_of(&[p(10, 0), p(11, 0), p(12, 0)]);
        list.update_positions(p(9, 0), true);

        assert_eq!(list.count_nodes(), 4);
        assert_eq!(positions(&list), vec![p(9, 0), p(10, 0), p(11, 0), p(12, 0)]);
    }

    #[test]
    fn update_positions_single_segment() {
        let mut list = list_of(&[p(3, 3)]);
        list.update_positions(p(4, 3), false);
        assert_eq!(positions(&list), vec![p(4, 3)]);

        list.update_positions(p(5, 3), true);
        assert_eq!(positions(&list), vec![p(5, 3), p(4, 3)]);
    }

    #[test]
    fn remove_node_at_out_of_range_is_noop() {
        let body = [p(1, 1), p(1, 2), p(1, 3)];
        let mut list = list_of(&body);

        list.remove_node_at(3);
        list.remove_node_at(100);
        list.remove_node_at(usize::MAX);

        assert_eq!(positions(&list), body.to_vec());
    }

    #[test]
    fn remove_node_at_unlinks_target() {
        let mut list = list_of(&[p(1, 1), p(1, 2), p(1, 3), p(1, 4)]);

        list.remove_node_at(2);
        assert_eq!(positions(&list), vec![p(1, 1), p(1, 2), p(1, 4)]);

        list.remove_node_at(0);
        assert_eq!(positions(&list), vec![p(1, 2), p(1, 4)]);

        list.remove_node_at(1);
        assert_eq!(positions(&list), vec![p(1, 2)]);
    }

    #[test]
    fn remove_tail_drops_last_segment() {
        let mut list = list_of(&[p(0, 0), p(0, 1), p(0, 2)]);

        list.remove_tail();
        assert_eq!(list.count_nodes(), 2);
        assert_eq!(list.iter().last(), Some(p(0, 1)));

        list.remove_tail();
        assert_eq!(positions(&list), vec![p(0, 0)]);
    }

    #[test]
    fn remove_tail_keeps_lone_head() {
        let mut list = list_of(&[p(7, 7)]);
        list.remove_tail();
        assert_eq!(positions(&list), vec![p(7, 7)]);
    }

    #[test]
    fn print_nodes_head_to_tail() {
        let list = list_of(&[p(5, 5), p(5, 6), p(5, 7)]);
        let mut out = Vec::new();
        list.print_nodes(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "(5, 5)\n(5, 6)\n(5, 7)\n");
    }

    #[test]
    fn contains_checks_every_segment() {
        let list = list_of(&[p(5, 5), p(5, 6), p(5, 7)]);
        assert!(list.contains(p(5, 5)));
        assert!(list.contains(p(5, 7)));
        assert!(!list.contains(p(6, 6)));
    }

    #[test]
    fn long_list_drops_without_overflow() {
        let mut list = SegmentList::new();
        for i in 0..200_000 {
            list.insert_at_head(p(i, 0));
        }
        assert_eq!(list.count_nodes(), 200_000);
        drop(list);
    }
}
