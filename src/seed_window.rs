//! Seed window (C4): a bounded ring of (hash, box-ids) batches plus a
//! concurrent box→seed map. Owned by the service root and injected into the
//! bus subscriber task and the HTTP handlers — not a process-wide singleton
//! (spec.md §9 DESIGN NOTES, "global mutable state").

use std::collections::HashMap;
use std::sync::Mutex;

/// Open question (i): the offset between the slot a batch is written to and
/// the slot whose boxes it settles, and the hash slice used as the seed,
/// vary across source variants. Carried as config; defaults to the
/// currently-adopted behavior (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct SeedWindowConfig {
    pub size: usize,
    pub prev_offset: usize,
    pub seed_slice_start: usize,
    pub seed_slice_len: usize,
}

impl Default for SeedWindowConfig {
    fn default() -> Self {
        Self {
            size: 20,
            prev_offset: 1,
            seed_slice_start: 0,
            seed_slice_len: 8,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    hash: String,
    boxes: Vec<String>,
    occupied: bool,
}

struct Inner {
    ring: Vec<Slot>,
    index: usize,
    box_to_seed: HashMap<String, String>,
}

pub struct SeedWindow {
    config: SeedWindowConfig,
    inner: Mutex<Inner>,
}

impl SeedWindow {
    pub fn new(config: SeedWindowConfig) -> Self {
        let ring = vec![Slot::default(); config.size];
        Self {
            inner: Mutex::new(Inner {
                ring,
                index: 0,
                box_to_seed: HashMap::new(),
            }),
            config,
        }
    }

    /// Ingest one `{hash, boxes[]}` batch (spec.md §4.4 steps 1-4).
    pub fn ingest(&self, hash: &str, boxes: &[String]) {
        let n = self.config.size;
        let mut inner = self.inner.lock().unwrap();
        let index = inner.index;

        // Step 1: write into slot `index mod N`.
        let slot_idx = index % n;
        inner.ring[slot_idx] = Slot {
            hash: hash.to_string(),
            boxes: boxes.to_vec(),
            occupied: true,
        };

        // Step 2: assign the seed to the *previous* batch's boxes.
        if index >= self.config.prev_offset {
            let prev_idx = (index - self.config.prev_offset) % n;
            let prev_boxes = inner.ring[prev_idx].boxes.clone();
            let seed = slice_seed(hash, self.config.seed_slice_start, self.config.seed_slice_len);
            for b in prev_boxes {
                inner.box_to_seed.insert(b, seed.clone());
            }
        }

        // Step 3: evict the batch about to be overwritten next tick.
        if index + 1 >= n {
            let next_idx = (index + 1) % n;
            let evicted_boxes = inner.ring[next_idx].boxes.clone();
            for b in evicted_boxes {
                inner.box_to_seed.remove(&b);
            }
        }

        // Step 4.
        inner.index = index + 1;
    }

    /// O(1) concurrent-safe lookup; the only state HTTP `random-number`
    /// handlers read.
    pub fn get(&self, box_id: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.box_to_seed.get(box_id).cloned()
    }

    #[cfg(test)]
    fn map_len(&self) -> usize {
        self.inner.lock().unwrap().box_to_seed.len()
    }
}

fn slice_seed(hash: &str, start: usize, len: usize) -> String {
    hash.chars().skip(start).take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn second_batch_assigns_seed_to_first_batch_boxes() {
        let w = SeedWindow::new(SeedWindowConfig::default());
        w.ingest("aaaaaaaaaa", &boxes(&["BOX1"]));
        assert_eq!(w.get("BOX1"), None);
        w.ingest("bbbbbbbbbb", &boxes(&["BOX2"]));
        assert_eq!(w.get("BOX1"), Some("bbbbbbbb".to_string()));
        assert_eq!(w.get("BOX2"), None);
    }

    #[test]
    fn eviction_on_wraparound() {
        let mut config = SeedWindowConfig::default();
        config.size = 3;
        let w = SeedWindow::new(config);
        // index 0: writes slot0=BOX_A
        w.ingest("h0000000", &boxes(&["BOX_A"]));
        // index 1: writes slot1=BOX_B, assigns seed(h1) to BOX_A (prev_offset=1)
        w.ingest("h1111111", &boxes(&["BOX_B"]));
        assert_eq!(w.get("BOX_A"), Some("h1111111".to_string()));
        // index 2 (== size-1): writes slot2=BOX_C, assigns seed(h2) to BOX_B;
        // index+1 >= n (3>=3) evicts slot (index+1)%n == slot0 == BOX_A
        w.ingest("h2222222", &boxes(&["BOX_C"]));
        assert_eq!(w.get("BOX_A"), None);
        assert_eq!(w.get("BOX_B"), Some("h2222222".to_string()));
    }

    #[test]
    fn replaying_same_stream_is_idempotent() {
        let make = || {
            let w = SeedWindow::new(SeedWindowConfig::default());
            for i in 0..25u32 {
                let hash = format!("{:08x}{:08x}", i, i.wrapping_mul(7));
                w.ingest(&hash, &boxes(&[&format!("BOX{i}")]));
            }
            w
        };
        let w1 = make();
        let w2 = make();
        assert_eq!(w1.map_len(), w2.map_len());
        for i in 0..25u32 {
            let key = format!("BOX{i}");
            assert_eq!(w1.get(&key), w2.get(&key));
        }
    }
}
