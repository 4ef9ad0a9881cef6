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

//! Per-frame counters reported to the host.

use std::time::Duration;

/// What the last encoded frame cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames encoded since the agent was created.
    pub frames_encoded: u64,
    /// Frames refused because no ring slot was free.
    pub frames_skipped: u64,
    /// Draw calls encoded for the last frame, across passes.
    pub draw_calls: usize,
    /// Instances written by the modules for the last frame.
    pub instances: usize,
    /// Entries written by the precalculation pass for the last frame.
    pub precalculated: usize,
    /// CPU time spent encoding the last frame.
    pub last_encode_time: Duration,
}

impl FrameStats {
    pub(crate) fn record(
        &mut self,
        draw_calls: usize,
        instances: usize,
        precalculated: usize,
        encode_time: Duration,
    ) {
        self.frames_encoded += 1;
        self.draw_calls = draw_calls;
        self.instances = instances;
        self.precalculated = precalculated;
        self.last_encode_time = encode_time;
    }

    pub(crate) fn skip(&mut self) {
        self.frames_skipped += 1;
    }
}

impl std::fmt::Display for FrameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frame={} draws={} instances={} precalc={} encode={:.2}ms skipped={}",
            self.frames_encoded,
            self.draw_calls,
            self.instances,
            self.precalculated,
            self.last_encode_time.as_secs_f32() * 1000.0,
            self.frames_skipped
        )
    }
}
