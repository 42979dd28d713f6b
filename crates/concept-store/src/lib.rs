//! Storage primitives for the concept dictionary.
//!
//! The dictionary workload is dominated by short byte strings: lowercase
//! words used as hash keys, short phrases kept in their original casing, and
//! tiny ordered sets of word counts. Everything here is allocation-conscious:
//! one small-buffer core ([`SmallBytes`], crate-private) backs both the
//! growable [`ByteBuf`] and the terminated [`TextValue`], keeping short
//! values inline and spilling to the heap only when they outgrow the inline
//! window.
//!
//! Storage transitions are one-way: once a value has spilled to the heap it
//! never moves back inline, even after shrinking. Capacity is monotonic
//! non-decreasing and `len <= capacity` holds at all times.
//!
//! Borrowed data has no special type here. A zero-copy view of a buffer is an
//! ordinary `&[u8]` or `&str`, which carries the read-only guarantee in the
//! type system instead of silently ignoring mutation.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

/// Inline capacity of [`ByteBuf`], in bytes.
pub const BUF_INLINE_CAP: usize = 8;

/// Inline capacity of [`TextValue`]: content up to a pointer's width, plus
/// the trailing terminator.
pub const TEXT_INLINE_CAP: usize = size_of::<usize>() + 1;

#[derive(Clone)]
enum Repr<const N: usize> {
    Inline { len: u8, data: [u8; N] },
    Heap(Vec<u8>),
}

/// Shared small-buffer core. Inline up to `N` bytes, heap `Vec` beyond.
/// Promotion to the heap is irreversible.
#[derive(Clone)]
struct SmallBytes<const N: usize> {
    repr: Repr<N>,
}

impl<const N: usize> SmallBytes<N> {
    const fn new() -> Self {
        Self {
            repr: Repr::Inline {
                len: 0,
                data: [0; N],
            },
        }
    }

    /// Pre-size the storage: inline when the request fits, otherwise a heap
    /// buffer of exactly the requested capacity.
    fn with_exact_capacity(cap: usize) -> Self {
        if cap <= N {
            Self::new()
        } else {
            Self {
                repr: Repr::Heap(Vec::with_capacity(cap)),
            }
        }
    }

    fn len(&self) -> usize {
        match &self.repr {
            Repr::Inline { len, .. } => *len as usize,
            Repr::Heap(v) => v.len(),
        }
    }

    fn capacity(&self) -> usize {
        match &self.repr {
            Repr::Inline { .. } => N,
            Repr::Heap(v) => v.capacity(),
        }
    }

    fn is_heap(&self) -> bool {
        matches!(self.repr, Repr::Heap(_))
    }

    fn as_slice(&self) -> &[u8] {
        match &self.repr {
            Repr::Inline { len, data } => &data[..*len as usize],
            Repr::Heap(v) => v.as_slice(),
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match &mut self.repr {
            Repr::Inline { len, data } => &mut data[..*len as usize],
            Repr::Heap(v) => v.as_mut_slice(),
        }
    }

    /// Grow capacity to at least `total` bytes, preserving content. Promotes
    /// inline storage to the heap when `total` exceeds the inline window.
    fn reserve(&mut self, total: usize) {
        match &mut self.repr {
            Repr::Inline { len, data } => {
                if total > N {
                    let mut v = Vec::with_capacity(total);
                    v.extend_from_slice(&data[..*len as usize]);
                    self.repr = Repr::Heap(v);
                }
            }
            Repr::Heap(v) => {
                v.reserve(total.saturating_sub(v.len()));
            }
        }
    }

    fn push(&mut self, byte: u8) {
        self.extend_from_slice(&[byte]);
    }

    fn extend_from_slice(&mut self, bytes: &[u8]) {
        let needed = self.len() + bytes.len();
        if needed > N && !self.is_heap() {
            self.reserve(needed);
        }
        match &mut self.repr {
            // Only reachable when `needed <= N`.
            Repr::Inline { len, data } => {
                let at = *len as usize;
                data[at..at + bytes.len()].copy_from_slice(bytes);
                *len = needed as u8;
            }
            Repr::Heap(v) => v.extend_from_slice(bytes),
        }
    }

    /// Shorten to `new_len` bytes. Capacity and heap/inline state are kept.
    fn truncate(&mut self, new_len: usize) {
        match &mut self.repr {
            Repr::Inline { len, .. } => {
                if new_len < *len as usize {
                    *len = new_len as u8;
                }
            }
            Repr::Heap(v) => v.truncate(new_len),
        }
    }
}

/// Growable owned byte buffer with an inline fast path for short content.
///
/// This is the owning side of the buffer abstraction; zero-copy overlays of
/// a `ByteBuf` are plain `&[u8]` slices obtained through [`Deref`] or
/// [`ByteBuf::as_slice`]. `Clone` always deep-copies.
#[derive(Clone)]
pub struct ByteBuf {
    bytes: SmallBytes<BUF_INLINE_CAP>,
}

impl ByteBuf {
    pub const fn new() -> Self {
        Self {
            bytes: SmallBytes::new(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            bytes: SmallBytes::with_exact_capacity(cap),
        }
    }

    /// Owned copy of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut buf = Self::with_capacity(bytes.len());
        buf.bytes.extend_from_slice(bytes);
        buf
    }

    pub fn from_text(text: &TextValue) -> Self {
        Self::from_slice(text.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Whether the content has spilled to the heap.
    pub fn is_heap(&self) -> bool {
        self.bytes.is_heap()
    }

    /// Grow capacity to at least `cap` bytes, preserving content. Capacity
    /// never decreases.
    pub fn reserve(&mut self, cap: usize) {
        self.bytes.reserve(cap);
    }

    pub fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    pub fn clear(&mut self) {
        self.bytes.truncate(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.bytes.as_mut_slice()
    }
}

impl Default for ByteBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for ByteBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl PartialEq for ByteBuf {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for ByteBuf {}

impl PartialEq<[u8]> for ByteBuf {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl PartialEq<&[u8]> for ByteBuf {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_slice() == *other
    }
}

impl From<&str> for ByteBuf {
    fn from(text: &str) -> Self {
        Self::from_slice(text.as_bytes())
    }
}

impl fmt::Debug for ByteBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteBuf({:?})", String::from_utf8_lossy(self.as_slice()))
    }
}

/// Owned, always-terminated text value.
///
/// Short values live inline (up to a pointer's width of content); longer ones
/// get a heap buffer sized exactly to `len + 1`. A trailing NUL byte is
/// maintained at all times so the value can be handed to terminator-oriented
/// consumers without copying. Equality and ordering are byte-wise over the
/// stored length; the terminator never participates.
#[derive(Clone)]
pub struct TextValue {
    bytes: SmallBytes<TEXT_INLINE_CAP>,
}

impl TextValue {
    pub fn new() -> Self {
        let mut bytes = SmallBytes::new();
        bytes.push(0);
        Self { bytes }
    }

    pub fn from_str(text: &str) -> Self {
        let mut bytes = SmallBytes::with_exact_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        Self { bytes }
    }

    /// Replace the content. A value that has already spilled to the heap
    /// keeps its heap buffer even when the new content would fit inline.
    pub fn assign(&mut self, text: &str) {
        self.bytes.truncate(0);
        self.bytes.reserve(text.len() + 1);
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.push(0);
    }

    /// Content length, excluding the terminator.
    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usable content capacity, excluding the terminator slot.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity() - 1
    }

    pub fn is_heap(&self) -> bool {
        self.bytes.is_heap()
    }

    /// Content bytes, without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        let all = self.bytes.as_slice();
        &all[..all.len() - 1]
    }

    /// Content bytes including the trailing NUL.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).expect("text value holds valid utf8")
    }
}

impl Default for TextValue {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TextValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for TextValue {}

impl PartialOrd for TextValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialEq<&str> for TextValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl From<&str> for TextValue {
    fn from(text: &str) -> Self {
        Self::from_str(text)
    }
}

impl fmt::Display for TextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for TextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextValue({:?})", self.as_str())
    }
}

/// Vec-backed set with explicit insertion policies.
///
/// [`push`](OrderedSet::push) appends unordered;
/// [`insert_sorted`](OrderedSet::insert_sorted) keeps ascending order via a
/// linear scan and shift; [`insert_unique`](OrderedSet::insert_unique)
/// additionally skips values already present, returning the existing
/// position. Iteration is in storage order, which after sorted insertion is
/// ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedSet<T> {
    items: Vec<T>,
}

impl<T: Ord> OrderedSet<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append without maintaining any order.
    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    /// Insert keeping ascending order; duplicates are allowed. Returns the
    /// insertion position.
    pub fn insert_sorted(&mut self, value: T) -> usize {
        let pos = self
            .items
            .iter()
            .position(|item| *item > value)
            .unwrap_or(self.items.len());
        self.items.insert(pos, value);
        pos
    }

    /// Insert keeping ascending order, skipping values already present.
    /// Returns the position of the inserted or pre-existing value.
    pub fn insert_unique(&mut self, value: T) -> usize {
        for (pos, item) in self.items.iter().enumerate() {
            if *item == value {
                return pos;
            }
            if *item > value {
                self.items.insert(pos, value);
                return pos;
            }
        }
        self.items.push(value);
        self.items.len() - 1
    }

    pub fn contains(&self, value: &T) -> bool {
        self.items.contains(value)
    }

    /// Linear search with a caller-supplied predicate.
    pub fn find_by(&self, mut is_match: impl FnMut(&T) -> bool) -> Option<&T> {
        self.items.iter().find(|item| is_match(item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        self.items.as_slice()
    }
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<'a, T> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_buffer_stays_inline() {
        let buf = ByteBuf::from_slice(b"thai");
        assert!(!buf.is_heap());
        assert_eq!(buf.capacity(), BUF_INLINE_CAP);
        assert_eq!(buf.as_slice(), b"thai");
    }

    #[test]
    fn long_buffer_promotes_and_never_reverts() {
        let mut buf = ByteBuf::from_slice(b"which restaurants do east asian food");
        assert!(buf.is_heap());
        let cap = buf.capacity();
        buf.truncate(3);
        assert!(buf.is_heap());
        assert_eq!(buf.capacity(), cap);
        assert_eq!(buf.as_slice(), b"whi");
    }

    #[test]
    fn reserve_is_monotonic_and_preserves_content() {
        let mut buf = ByteBuf::from_slice(b"bbq");
        buf.reserve(64);
        assert!(buf.capacity() >= 64);
        assert_eq!(buf.as_slice(), b"bbq");
        let cap = buf.capacity();
        buf.reserve(16);
        assert!(buf.capacity() >= cap);
    }

    #[test]
    fn growth_across_inline_boundary_keeps_bytes() {
        let mut buf = ByteBuf::new();
        for byte in b"east european".iter() {
            buf.push(*byte);
        }
        assert!(buf.is_heap());
        assert_eq!(buf.as_slice(), b"east european");
    }

    #[test]
    fn buffer_equality_is_element_wise() {
        assert_eq!(ByteBuf::from_slice(b"pub"), ByteBuf::from_slice(b"pub"));
        assert_ne!(ByteBuf::from_slice(b"pub"), ByteBuf::from_slice(b"pubs"));
        assert_ne!(ByteBuf::from_slice(b"pub"), ByteBuf::from_slice(b"pob"));
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let original = ByteBuf::from_slice(b"portuguese cuisine");
        let mut copy = original.clone();
        copy.as_mut_slice()[0] = b'P';
        assert_eq!(original.as_slice(), b"portuguese cuisine");
        assert_eq!(copy.as_slice(), b"Portuguese cuisine");
    }

    #[test]
    fn text_value_keeps_terminator() {
        let text = TextValue::from_str("Sushi");
        assert_eq!(text.len(), 5);
        assert_eq!(text.as_bytes_with_nul(), b"Sushi\0");
        assert_eq!(text.as_str(), "Sushi");

        let empty = TextValue::new();
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.as_bytes_with_nul(), b"\0");
    }

    #[test]
    fn text_value_inline_threshold_is_pointer_width() {
        let at_limit = TextValue::from_str(&"x".repeat(size_of::<usize>()));
        assert!(!at_limit.is_heap());
        let over = TextValue::from_str(&"x".repeat(size_of::<usize>() + 1));
        assert!(over.is_heap());
        assert_eq!(over.capacity(), over.len());
    }

    #[test]
    fn text_value_assign_never_reverts_to_inline() {
        let mut text = TextValue::from_str("West Indian");
        assert!(text.is_heap());
        text.assign("ok");
        assert!(text.is_heap());
        assert_eq!(text.as_str(), "ok");
        assert_eq!(text.as_bytes_with_nul(), b"ok\0");
    }

    #[test]
    fn text_value_compares_byte_wise() {
        assert_eq!(TextValue::from_str("Thai"), TextValue::from_str("Thai"));
        assert_ne!(TextValue::from_str("Thai"), TextValue::from_str("thai"));
        assert!(TextValue::from_str("bbq") < TextValue::from_str("pub"));
        assert!(TextValue::from_str("pub") < TextValue::from_str("pubs"));
    }

    #[test]
    fn ordered_unique_insertion() {
        let mut set = OrderedSet::new();
        assert_eq!(set.insert_unique(3), 0);
        assert_eq!(set.insert_unique(1), 0);
        assert_eq!(set.insert_unique(2), 1);
        assert_eq!(set.insert_unique(2), 1);
        assert_eq!(set.as_slice(), &[1, 2, 3]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn sorted_insertion_allows_duplicates() {
        let mut set = OrderedSet::new();
        set.insert_sorted(2);
        set.insert_sorted(1);
        set.insert_sorted(2);
        assert_eq!(set.as_slice(), &[1, 2, 2]);
    }

    #[test]
    fn find_by_uses_caller_predicate() {
        let mut set = OrderedSet::new();
        set.push(10);
        set.push(20);
        assert_eq!(set.find_by(|v| *v > 15), Some(&20));
        assert_eq!(set.find_by(|v| *v > 25), None);
        assert!(set.contains(&10));
    }
}
