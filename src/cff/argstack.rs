use crate::Error::MalformedFont;
use crate::Result;

/// The maximum number of operands allowed during parsing.
const MAX_OPERANDS_LEN: usize = 48;

/// An arguments stack for interpreting charstrings.
///
/// The subsetter never draws anything, so it only tracks values that matter
/// for finding subroutine calls. Results of computations it does not perform
/// are stored as `None`.
#[derive(Clone, Debug, Default)]
pub(crate) struct ArgumentsStack {
    data: Vec<Option<i32>>,
}

impl ArgumentsStack {
    /// Create a new argument stack.
    pub fn new() -> Self {
        Self { data: Vec::with_capacity(MAX_OPERANDS_LEN) }
    }

    /// The current length of the arguments stack.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Push a new value onto the stack.
    #[inline]
    pub fn push(&mut self, n: Option<i32>) -> Result<()> {
        if self.len() == MAX_OPERANDS_LEN {
            Err(MalformedFont)
        } else {
            self.data.push(n);
            Ok(())
        }
    }

    /// Pop a value from the stack. Returns `None` if the stack is empty or
    /// the value is unknown.
    #[inline]
    pub fn pop(&mut self) -> Option<i32> {
        self.data.pop().flatten()
    }

    /// Pop the topmost `n` values, bottom-most first.
    pub fn pop_n(&mut self, n: usize) -> Vec<Option<i32>> {
        let at = self.len().saturating_sub(n);
        self.data.split_off(at)
    }

    /// Remove all values.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// The value `i` places below the top, where 0 is the top.
    pub fn get_from_top(&self, i: usize) -> Option<i32> {
        let index = self.len().checked_sub(i.checked_add(1)?)?;
        self.data.get(index).copied().flatten()
    }

    /// Duplicate the top value.
    pub fn dup(&mut self) -> Result<()> {
        let top = self.data.last().copied().flatten();
        self.push(top)
    }

    /// Swap the two topmost values.
    pub fn exch(&mut self) {
        let len = self.len();
        if len >= 2 {
            self.data.swap(len - 1, len - 2);
        }
    }

    /// Rotate the topmost `n` values by `j` places towards the top.
    pub fn roll(&mut self, n: usize, j: i32) {
        if n == 0 || n > self.len() {
            return;
        }

        let at = self.len() - n;
        let shift = j.rem_euclid(n as i32) as usize;
        self.data[at..].rotate_right(shift);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(values: &[i32]) -> ArgumentsStack {
        let mut stack = ArgumentsStack::new();
        for &v in values {
            stack.push(Some(v)).unwrap();
        }
        stack
    }

    #[test]
    fn overflow() {
        let mut stack = stack(&[0; MAX_OPERANDS_LEN]);
        assert_eq!(stack.push(Some(1)), Err(MalformedFont));
        assert_eq!(stack.len(), MAX_OPERANDS_LEN);
    }

    #[test]
    fn unknown_values() {
        let mut stack = stack(&[1]);
        stack.push(None).unwrap();
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn roll_moves_values_up() {
        let mut s = stack(&[9, 1, 2, 3]);
        s.roll(3, 1);
        assert_eq!(s.pop_n(4), vec![Some(9), Some(3), Some(1), Some(2)]);

        let mut s = stack(&[1, 2, 3]);
        s.roll(3, -1);
        assert_eq!(s.pop_n(3), vec![Some(2), Some(3), Some(1)]);

        let mut s = stack(&[1, 2]);
        s.roll(3, 1);
        assert_eq!(s.pop_n(5), vec![Some(1), Some(2)]);
    }

    #[test]
    fn index_dup_and_exch() {
        let mut s = stack(&[1, 2, 3]);
        assert_eq!(s.get_from_top(0), Some(3));
        assert_eq!(s.get_from_top(2), Some(1));
        assert_eq!(s.get_from_top(3), None);

        s.exch();
        s.dup().unwrap();
        assert_eq!(s.pop_n(4), vec![Some(1), Some(3), Some(2), Some(2)]);
    }
}
