//! Frame capture state machine.
//!
//! The 3D engine keeps two polygon buffers. Games submit commands to the back
//! buffer while the front buffer is being rendered, and a flush swaps them.
//! [`Ripper`] mirrors that with two rips: commands are recorded into the back
//! rip as they are submitted, the back rip becomes the front rip when the
//! buffers swap, and the front rip is finished off with the VRAM and register
//! state once the front buffer is actually rendered.
//!
//! A request that arrives in the middle of a frame only takes effect at the
//! next swap, so a rip never holds a partial frame.

use crate::{
    artifact::ArtifactSink,
    command::{write_command, write_magic, CommandRecord, Polygon},
    config::{RipperConfig, DEFAULT_RESERVE_BYTES},
    snapshot::{write_snapshot, RenderState},
};

/// What happened to the front rip on a render notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOutcome {
    /// No captured frame was waiting to be rendered.
    Idle,
    /// The dump was handed to the sink under this name.
    Emitted(String),
    /// The sink failed; the dump was discarded.
    Failed,
}

/// Records requested frames and hands each finished dump to a sink.
#[derive(Debug)]
pub struct Ripper<S> {
    sink: S,
    reserve_bytes: usize,
    /// Rips requested but not yet swapped out of the back buffer.
    pending: u32,
    /// Whether commands are currently recorded into `back`.
    dumping: bool,
    back: Vec<u8>,
    front: Vec<u8>,
}

impl<S: ArtifactSink> Ripper<S> {
    pub fn new(sink: S) -> Self {
        Self::with_reserve(sink, DEFAULT_RESERVE_BYTES)
    }

    pub fn from_config(sink: S, config: &RipperConfig) -> Self {
        Self::with_reserve(sink, config.reserve_bytes)
    }

    fn with_reserve(sink: S, reserve_bytes: usize) -> Self {
        Self {
            sink,
            reserve_bytes,
            pending: 0,
            dumping: false,
            back: Vec::new(),
            front: Vec::new(),
        }
    }

    /// Drops any in-flight capture and forgets outstanding requests.
    pub fn reset(&mut self) {
        self.pending = 0;
        self.dumping = false;
        self.back.clear();
        self.front.clear();
    }

    /// Asks for the next `count` frames to be ripped, starting at the next
    /// buffer swap.
    pub fn request_rip(&mut self, count: u32) {
        self.pending = self.pending.saturating_add(count);
        tracing::debug!(count, pending = self.pending, "rip requested");
    }

    pub fn is_dumping(&self) -> bool {
        self.dumping
    }

    pub fn pending(&self) -> u32 {
        self.pending
    }

    pub fn back_len(&self) -> usize {
        self.back.len()
    }

    pub fn front_len(&self) -> usize {
        self.front.len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Records a command submitted to the back buffer.
    pub fn on_command(&mut self, record: &CommandRecord) {
        if self.dumping {
            write_command(&mut self.back, record);
        }
    }

    pub fn polygon(&mut self, poly: Polygon) {
        self.on_command(&CommandRecord::Polygon(poly));
    }

    pub fn tex_param(&mut self, tex_param: u32) {
        self.on_command(&CommandRecord::TexParam(tex_param));
    }

    pub fn tex_palette(&mut self, tex_palette: u32) {
        self.on_command(&CommandRecord::TexPalette(tex_palette));
    }

    pub fn polygon_attr(&mut self, attr: u32) {
        self.on_command(&CommandRecord::PolygonAttr(attr));
    }

    /// The engine swapped its front and back polygon buffers.
    pub fn on_buffer_swap(&mut self) {
        if self.dumping {
            if !self.front.is_empty() {
                tracing::debug!(
                    bytes = self.front.len(),
                    "front rip was never rendered, dropping it"
                );
            }
            std::mem::swap(&mut self.back, &mut self.front);
            self.back.clear();
            self.pending = self.pending.saturating_sub(1);
        }

        self.dumping = false;

        if self.pending > 0 {
            self.init_back_rip();
            self.dumping = true;
        }
    }

    /// The front buffer is being rendered with `state` in effect.
    pub fn on_display(&mut self, state: &RenderState<'_>) -> DisplayOutcome {
        if self.front.is_empty() {
            return DisplayOutcome::Idle;
        }

        write_snapshot(&mut self.front, state);
        let outcome = match self.sink.emit(&self.front) {
            Ok(name) => DisplayOutcome::Emitted(name),
            Err(err) => {
                tracing::warn!(error = %err, bytes = self.front.len(), "failed to save rip");
                DisplayOutcome::Failed
            }
        };
        self.front.clear();
        outcome
    }

    fn init_back_rip(&mut self) {
        self.back.clear();
        self.back.reserve(self.reserve_bytes);
        write_magic(&mut self.back);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        artifact::MemorySink,
        command::{Vertex, MAGIC_LEN},
        decode::decode,
        snapshot::{VramBank, VramBanks, SNAPSHOT_LEN},
        Result, RipError,
    };

    struct FailingSink;

    impl ArtifactSink for FailingSink {
        fn emit(&mut self, _rip: &[u8]) -> Result<String> {
            Err(RipError::msg("disk full"))
        }
    }

    fn triangle() -> Polygon {
        Polygon::Triangle([Vertex::default(); 3])
    }

    fn with_state<T>(f: impl FnOnce(&RenderState<'_>) -> T) -> T {
        let banks: Vec<Vec<u8>> = VramBank::ALL.iter().map(|b| vec![0; b.size()]).collect();
        let state = RenderState {
            texture_map: [0; 4],
            tex_pal_map: [0; 8],
            banks: VramBanks::new(std::array::from_fn(|i| banks[i].as_slice())).unwrap(),
            disp_cnt: 0,
            toon_table: [0; 32],
        };
        f(&state)
    }

    #[test]
    fn request_waits_for_next_swap() {
        let mut ripper = Ripper::new(MemorySink::new());
        ripper.request_rip(1);
        ripper.polygon(triangle());

        assert!(!ripper.is_dumping());
        assert_eq!(ripper.back_len(), 0);

        ripper.on_buffer_swap();
        assert!(ripper.is_dumping());
        assert_eq!(ripper.back_len(), MAGIC_LEN);
        assert_eq!(ripper.front_len(), 0);
        assert_eq!(ripper.pending(), 1);
    }

    #[test]
    fn swap_promotes_back_rip() {
        let mut ripper = Ripper::new(MemorySink::new());
        ripper.request_rip(1);
        ripper.on_buffer_swap();
        ripper.tex_param(1);
        let recorded = ripper.back_len();

        ripper.on_buffer_swap();
        assert!(!ripper.is_dumping());
        assert_eq!(ripper.pending(), 0);
        assert_eq!(ripper.back_len(), 0);
        assert_eq!(ripper.front_len(), recorded);

        ripper.tex_param(2);
        assert_eq!(ripper.back_len(), 0);
    }

    #[test]
    fn display_emits_and_clears_front_rip() {
        let mut ripper = Ripper::new(MemorySink::new());
        ripper.request_rip(1);
        ripper.on_buffer_swap();
        ripper.polygon_attr(0x1f);
        ripper.on_buffer_swap();
        let front = ripper.front_len();

        let outcome = with_state(|state| ripper.on_display(state));
        assert_eq!(outcome, DisplayOutcome::Emitted("memory-0".to_string()));
        assert_eq!(ripper.front_len(), 0);
        assert_eq!(ripper.sink().dumps()[0].len(), front + SNAPSHOT_LEN);
    }

    #[test]
    fn display_without_front_rip_is_a_no_op() {
        let mut ripper = Ripper::new(MemorySink::new());
        ripper.request_rip(3);

        let outcome = with_state(|state| ripper.on_display(state));
        assert_eq!(outcome, DisplayOutcome::Idle);
        assert_eq!(ripper.pending(), 3);
        assert!(!ripper.is_dumping());
        assert!(ripper.sink().dumps().is_empty());
    }

    #[test]
    fn display_while_recording_leaves_back_rip_alone() {
        let mut ripper = Ripper::new(MemorySink::new());
        ripper.request_rip(2);
        ripper.on_buffer_swap();

        let commands = [
            CommandRecord::PolygonAttr(0x1f),
            CommandRecord::Polygon(triangle()),
            CommandRecord::TexParam(9),
        ];
        for command in &commands {
            ripper.on_command(command);
        }
        let back = ripper.back_len();

        let outcome = with_state(|state| ripper.on_display(state));
        assert_eq!(outcome, DisplayOutcome::Idle);
        assert_eq!(ripper.back_len(), back);
        assert_eq!(ripper.front_len(), 0);
        assert_eq!(ripper.pending(), 2);
        assert!(ripper.is_dumping());
        assert!(ripper.sink().dumps().is_empty());

        ripper.on_buffer_swap();
        with_state(|state| ripper.on_display(state));
        let artifact = decode(&ripper.sink().dumps()[0]).unwrap();
        assert_eq!(artifact.commands, commands);
    }

    #[derive(Clone, Copy)]
    enum Step {
        Request(u32),
        Swap,
        Display,
    }

    #[test]
    fn pending_tracks_requests_minus_recorded_swaps() {
        use Step::*;

        let cases: &[&[Step]] = &[
            &[Request(1), Swap, Swap, Swap],
            &[Swap, Request(2), Display, Swap, Request(1), Swap, Swap, Swap],
            &[Request(3), Swap, Display, Swap, Request(2), Swap, Display, Swap],
            &[Request(0), Swap, Request(1), Request(1), Swap, Swap, Display, Swap, Swap],
            &[Swap, Swap, Request(4), Display, Swap, Swap, Display, Swap, Swap, Swap, Swap],
        ];

        for (case, steps) in cases.iter().enumerate() {
            let mut ripper = Ripper::new(MemorySink::new());
            let mut requested = 0u32;
            let mut recorded_swaps = 0u32;

            for (i, step) in steps.iter().enumerate() {
                match *step {
                    Request(count) => {
                        requested += count;
                        ripper.request_rip(count);
                    }
                    Swap => {
                        if ripper.is_dumping() {
                            recorded_swaps += 1;
                        }
                        ripper.on_buffer_swap();
                    }
                    Display => {
                        with_state(|state| ripper.on_display(state));
                    }
                }
                assert_eq!(
                    ripper.pending(),
                    requested - recorded_swaps,
                    "case {case}, step {i}"
                );
                if matches!(step, Swap) {
                    assert_eq!(
                        ripper.is_dumping(),
                        ripper.pending() > 0,
                        "case {case}, step {i}"
                    );
                }
            }
        }
    }

    #[test]
    fn sink_failure_discards_rip_and_keeps_going() {
        let mut ripper = Ripper::new(FailingSink);
        ripper.request_rip(2);
        ripper.on_buffer_swap();
        ripper.tex_palette(4);
        ripper.on_buffer_swap();

        let outcome = with_state(|state| ripper.on_display(state));
        assert_eq!(outcome, DisplayOutcome::Failed);
        assert_eq!(ripper.front_len(), 0);
        assert_eq!(ripper.pending(), 1);
        assert!(ripper.is_dumping());
    }

    #[test]
    fn unrendered_front_rip_is_overwritten() {
        let mut ripper = Ripper::new(MemorySink::new());
        ripper.request_rip(2);
        ripper.on_buffer_swap();
        ripper.tex_param(1);
        ripper.on_buffer_swap();
        ripper.tex_param(2);
        ripper.tex_param(3);
        let second = ripper.back_len();
        ripper.on_buffer_swap();

        assert_eq!(ripper.front_len(), second);
        with_state(|state| ripper.on_display(state));
        assert_eq!(ripper.sink().dumps().len(), 1);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut ripper = Ripper::new(MemorySink::new());
        ripper.request_rip(2);
        ripper.on_buffer_swap();
        ripper.tex_param(1);
        ripper.on_buffer_swap();

        ripper.reset();
        assert_eq!(ripper.pending(), 0);
        assert!(!ripper.is_dumping());
        assert_eq!(ripper.back_len(), 0);
        assert_eq!(ripper.front_len(), 0);

        ripper.on_buffer_swap();
        assert!(!ripper.is_dumping());
        assert_eq!(with_state(|state| ripper.on_display(state)), DisplayOutcome::Idle);
    }

    #[test]
    fn request_count_saturates() {
        let mut ripper = Ripper::new(MemorySink::new());
        ripper.request_rip(u32::MAX);
        ripper.request_rip(5);
        assert_eq!(ripper.pending(), u32::MAX);
    }
}
