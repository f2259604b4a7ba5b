//! Incremental cursor walk over a channel's sorted key stream.
//!
//! The bracket cache is a `2 * num_tracks` array of stream positions: entry
//! `track` holds the track's penultimate key, entry `track + num_tracks` its
//! last key. The walk moves the channel cursor forward or backward until, for
//! every track, `penultimate.ratio <= query ratio <= last.ratio`, touching
//! only the entries whose brackets actually change. Cost is amortized by the
//! number of brackets crossed, not by the stream length.

use crate::animation::CompressedKey;
use crate::context::OutdatedGroups;

/// Advance or rewind one channel's cursor to the query ratio, updating the
/// bracket cache and marking every touched track group outdated.
///
/// `cursor == 0` means uninitialized: the cache is seeded straight from the
/// stream's fixed leading region, no search needed.
pub(crate) fn update_cache_cursor<K: CompressedKey>(
    ratio: f32,
    num_soa_tracks: usize,
    keys: &[K],
    cursor: &mut usize,
    entries: &mut [u32],
    outdated: &mut OutdatedGroups,
) {
    debug_assert!(num_soa_tracks >= 1);
    let num_tracks = num_soa_tracks * 4;
    let num_keys = keys.len();
    debug_assert!(num_keys >= num_tracks * 2);
    debug_assert!(entries.len() >= num_tracks * 2);

    let mut cur = *cursor;
    if cur == 0 {
        // The first two keys of every track occupy the first 2 * num_tracks
        // stream entries, interleaved by track: the bracket cache is the
        // identity mapping.
        for (pos, entry) in entries.iter_mut().enumerate().take(num_tracks * 2) {
            *entry = pos as u32;
        }
        cur = num_tracks * 2;
        outdated.mark_all(num_soa_tracks);
    }
    debug_assert!(cur >= num_tracks * 2 && cur <= num_keys);

    // Hint shared by both walks: consecutive stream entries tend to belong to
    // nearby tracks.
    let mut track = 0;

    // Forward: consume an entry as soon as its predecessor (the track's
    // current last key) stops being the upper bracket. The stream ordering
    // guarantees everything before the cursor is up to date, so the loop can
    // stop at the first entry whose predecessor is still ahead of the ratio.
    while cur < num_keys && keys[cur - keys[cur].previous() as usize].ratio() <= ratio {
        track = track_forward(entries, keys, cur, track, num_tracks);
        outdated.mark(track / 4);

        let penultimate = track;
        let last = track + num_tracks;
        debug_assert!(
            entries[last] as usize == cur - keys[cur].previous() as usize,
            "bracket cache does not own the consumed entry's predecessor"
        );
        entries[penultimate] = entries[last];
        entries[last] = cur as u32;
        cur += 1;
    }

    // Rewind: undo the most recent consumption while the penultimate of the
    // entry right behind the cursor is ahead of the ratio. Terminates at the
    // seed region boundary, where every penultimate sits at ratio 0.
    while keys[(cur - 1) - keys[cur - 1].previous() as usize].ratio() > ratio {
        debug_assert!(cur - 1 >= num_tracks * 2);

        track = track_backward(entries, (cur - 1) as u32, track, num_tracks);
        outdated.mark(track / 4);

        let penultimate = track;
        let last = track + num_tracks;
        debug_assert!(
            entries[last] as usize == cur - 1,
            "bracket cache does not own the entry being rewound"
        );
        entries[last] = entries[penultimate];
        let previous = keys[entries[penultimate] as usize].previous() as u32;
        debug_assert!(entries[penultimate] >= previous);
        entries[penultimate] -= previous;
        cur -= 1;
    }

    debug_assert!(cur >= num_tracks * 2 && cur <= num_keys);
    *cursor = cur;
}

/// Recover the track owning stream entry `key`: its predecessor position is
/// `key - previous`, and the bracket cache's "last" window is the only place
/// that position can currently live. Searches up from the hint, wrapping once.
fn track_forward<K: CompressedKey>(
    entries: &[u32],
    keys: &[K],
    key: usize,
    last_track: usize,
    num_tracks: usize,
) -> usize {
    debug_assert!(key < keys.len());
    debug_assert!(last_track < num_tracks);

    let target = (key - keys[key].previous() as usize) as u32;
    let start = last_track + num_tracks;
    for entry in start..num_tracks * 2 {
        if entries[entry] == target {
            return entry - num_tracks;
        }
    }
    for entry in num_tracks..start {
        if entries[entry] == target {
            return entry - num_tracks;
        }
    }
    debug_assert!(false, "stream entry's predecessor is not in the bracket cache");
    last_track
}

/// Backward counterpart of [`track_forward`]: searches down from the hint.
fn track_backward(entries: &[u32], target: u32, last_track: usize, num_tracks: usize) -> usize {
    debug_assert!(last_track < num_tracks);

    let start = last_track + num_tracks;
    for entry in (num_tracks..=start).rev() {
        if entries[entry] == target {
            return entry - num_tracks;
        }
    }
    for entry in (start + 1..num_tracks * 2).rev() {
        if entries[entry] == target {
            return entry - num_tracks;
        }
    }
    debug_assert!(false, "rewound stream entry is not in the bracket cache");
    last_track
}
