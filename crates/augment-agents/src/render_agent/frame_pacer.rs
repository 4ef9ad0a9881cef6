// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Hands out ring slots to frames, never to a slot the GPU may still read.

use crossbeam_channel::{Receiver, Sender};
use std::time::Duration;

/// A frame allowed to encode, and the ring slot it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSlot {
    /// Monotonic frame number.
    pub frame_index: u64,
    /// Ring slot of every module's uniform buffers for this frame.
    pub buffer_index: usize,
}

/// Tracks which ring slots are in flight.
///
/// Slot `n` is reused by frame `n + max_in_flight_frames` only after frame `n`
/// was reported complete through a [`completion_sender`](Self::completion_sender).
#[derive(Debug)]
pub struct FramePacer {
    slots: Vec<Option<u64>>,
    next_frame: u64,
    completions_tx: Sender<u64>,
    completions_rx: Receiver<u64>,
}

impl FramePacer {
    /// A pacer for a ring of `max_in_flight_frames` slots (at least one).
    pub fn new(max_in_flight_frames: usize) -> Self {
        let (completions_tx, completions_rx) = crossbeam_channel::unbounded();
        Self {
            slots: vec![None; max_in_flight_frames.max(1)],
            next_frame: 0,
            completions_tx,
            completions_rx,
        }
    }

    /// A handle the GPU completion handler reports finished frame indices on.
    /// It may be used from any thread.
    pub fn completion_sender(&self) -> Sender<u64> {
        self.completions_tx.clone()
    }

    /// Frames encoded but not yet reported complete.
    pub fn in_flight(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// The next frame number to be handed out.
    pub fn next_frame(&self) -> u64 {
        self.next_frame
    }

    #[allow(missing_docs)]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn release(&mut self, frame_index: u64) {
        match self.slots.iter_mut().find(|s| **s == Some(frame_index)) {
            Some(slot) => *slot = None,
            None => log::debug!("FramePacer: completion for unknown frame {frame_index}"),
        }
    }

    fn drain(&mut self) {
        while let Ok(frame_index) = self.completions_rx.try_recv() {
            self.release(frame_index);
        }
    }

    /// Claims the slot of the next frame, or `None` while its previous user is in flight.
    pub fn try_acquire(&mut self) -> Option<FrameSlot> {
        self.drain();
        let buffer_index = (self.next_frame % self.slots.len() as u64) as usize;
        if self.slots[buffer_index].is_some() {
            return None;
        }
        let frame_index = self.next_frame;
        self.slots[buffer_index] = Some(frame_index);
        self.next_frame += 1;
        Some(FrameSlot {
            frame_index,
            buffer_index,
        })
    }

    /// Like [`try_acquire`](Self::try_acquire), but waits up to `timeout` for a completion.
    pub fn acquire_timeout(&mut self, timeout: Duration) -> Option<FrameSlot> {
        if let Some(slot) = self.try_acquire() {
            return Some(slot);
        }
        let frame_index = self.completions_rx.recv_timeout(timeout).ok()?;
        self.release(frame_index);
        self.try_acquire()
    }

    /// Gives back a slot whose frame was abandoned before submission.
    pub fn cancel(&mut self, slot: FrameSlot) {
        self.release(slot.frame_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_rotate_through_the_ring() {
        let mut pacer = FramePacer::new(3);
        let indices: Vec<_> = (0..3).map(|_| pacer.try_acquire().unwrap().buffer_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(pacer.in_flight(), 3);
    }

    #[test]
    fn a_slot_is_reused_only_after_completion() {
        let mut pacer = FramePacer::new(2);
        let first = pacer.try_acquire().unwrap();
        let _second = pacer.try_acquire().unwrap();
        assert!(pacer.try_acquire().is_none());

        pacer.completion_sender().send(first.frame_index).unwrap();
        let third = pacer.try_acquire().unwrap();
        assert_eq!(third.frame_index, 2);
        assert_eq!(third.buffer_index, first.buffer_index);
    }

    #[test]
    fn completions_from_another_thread_unblock_acquire() {
        let mut pacer = FramePacer::new(1);
        let first = pacer.try_acquire().unwrap();
        let sender = pacer.completion_sender();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            sender.send(first.frame_index).unwrap();
        });
        let next = pacer.acquire_timeout(Duration::from_secs(5));
        worker.join().unwrap();
        assert_eq!(next.map(|s| s.frame_index), Some(1));
    }

    #[test]
    fn cancelled_slot_is_free_again() {
        let mut pacer = FramePacer::new(1);
        let slot = pacer.try_acquire().unwrap();
        pacer.cancel(slot);
        assert_eq!(pacer.in_flight(), 0);
        assert!(pacer.try_acquire().is_some());
    }
}
