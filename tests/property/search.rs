//! Windowed search against a naive in-memory reference.

use std::io::Write as _;

use carve_rs::{Dir, EngineError, FileView};
use proptest::prelude::*;

fn view(content: &[u8]) -> FileView {
    let mut f = tempfile::tempfile().unwrap();
    f.write_all(content).unwrap();
    FileView::from_file(f).unwrap()
}

/// Leftmost match of `needle` fully inside `[lo, hi)`, by brute force.
fn naive_forward(hay: &[u8], needle: &[u8], lo: usize, hi: usize) -> Option<usize> {
    if needle.is_empty() || lo >= hi {
        return None;
    }
    let win = &hay[lo..hi];
    win.windows(needle.len())
        .position(|w| w == needle)
        .map(|i| lo + i)
}

/// Rightmost match of `needle` fully inside `[lo, hi)`, by brute force.
fn naive_backward(hay: &[u8], needle: &[u8], lo: usize, hi: usize) -> Option<usize> {
    if needle.is_empty() || lo >= hi {
        return None;
    }
    let win = &hay[lo..hi];
    if win.len() < needle.len() {
        return None;
    }
    (0..=win.len() - needle.len())
        .rev()
        .find(|&i| &win[i..i + needle.len()] == needle)
        .map(|i| lo + i)
}

fn haystack_strategy() -> impl Strategy<Value = Vec<u8>> {
    // Small alphabet so needles actually occur, often more than once.
    prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'c', b'\n']), 0..512)
}

proptest! {
    #[test]
    fn forward_search_matches_naive(
        hay in haystack_strategy(),
        needle in prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'c']), 1..5),
        lo_frac in 0.0f64..1.0,
        hi_frac in 0.0f64..1.0,
    ) {
        let lo = (hay.len() as f64 * lo_frac) as usize;
        let hi = (hay.len() as f64 * hi_frac) as usize;
        let (lo, hi) = (lo.min(hi), lo.max(hi));

        let mut io = view(&hay);
        let got = io.find_window(lo as i64, hi as i64, &needle, Dir::Fwd);
        match naive_forward(&hay, &needle, lo, hi) {
            Some(ms) => {
                let (s, e) = got.unwrap();
                prop_assert_eq!(s, ms as i64);
                prop_assert_eq!(e, (ms + needle.len()) as i64);
            }
            None => prop_assert!(matches!(got, Err(EngineError::NoMatch))),
        }
    }

    #[test]
    fn backward_search_matches_naive(
        hay in haystack_strategy(),
        needle in prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'c']), 1..5),
        lo_frac in 0.0f64..1.0,
        hi_frac in 0.0f64..1.0,
    ) {
        let lo = (hay.len() as f64 * lo_frac) as usize;
        let hi = (hay.len() as f64 * hi_frac) as usize;
        let (lo, hi) = (lo.min(hi), lo.max(hi));

        let mut io = view(&hay);
        let got = io.find_window(lo as i64, hi as i64, &needle, Dir::Bwd);
        match naive_backward(&hay, &needle, lo, hi) {
            Some(ms) => {
                let (s, e) = got.unwrap();
                prop_assert_eq!(s, ms as i64);
                prop_assert_eq!(e, (ms + needle.len()) as i64);
            }
            None => prop_assert!(matches!(got, Err(EngineError::NoMatch))),
        }
    }

    #[test]
    fn empty_needle_is_rejected(hay in haystack_strategy()) {
        let mut io = view(&hay);
        let got = io.find_window(0, hay.len() as i64, b"", Dir::Fwd);
        prop_assert!(matches!(got, Err(EngineError::BadNeedle)));
    }
}

#[test]
fn backward_match_straddling_many_block_seams() {
    // Big enough to span several backward blocks; the needle sits in the
    // first block so every block must be visited to find it.
    let mut hay = vec![b'.'; 300 * 1024];
    hay[100..106].copy_from_slice(b"target");
    let mut io = view(&hay);
    let (s, e) = io
        .find_window(0, hay.len() as i64, b"target", Dir::Bwd)
        .unwrap();
    assert_eq!((s, e), (100, 106));
}
