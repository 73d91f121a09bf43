//! The preferred backend (spec.md 4.2): captures a real native backtrace at
//! the interception point. Unlike a scripting host's interpreter-level
//! stack walk, this cannot be "tampered with" by user-space code the way a
//! redefined `Error.prepareStackTrace` hook can — there is no equivalent
//! fallback backend to distrust in a compiled binary, so `tampering_detected`
//! from spec.md 4.2 has no Rust counterpart. What *can* happen is incomplete
//! symbolication (stripped binaries, missing debug info), which is reported
//! instead — see `CaptureOutcome::symbolication_incomplete`.

use crate::frame::Frame;

const MAX_FRAMES: usize = 128;

pub struct CaptureOutcome {
    pub frames: Vec<Frame>,
    pub symbolication_incomplete: bool,
}

/// Capture a backtrace, skipping `skip_frames` innermost frames (the
/// capture call itself and its immediate caller inside the mediator).
pub fn capture(skip_frames: usize) -> CaptureOutcome {
    let mut frames = Vec::new();
    let mut symbolication_incomplete = false;
    let mut seen = 0usize;

    backtrace::trace(|bt_frame| {
        seen += 1;
        if seen <= skip_frames {
            return true;
        }

        let mut resolved_any = false;
        backtrace::resolve_frame(bt_frame, |symbol| {
            resolved_any = true;
            let file = symbol
                .filename()
                .map(|path| path.to_string_lossy().into_owned());
            let function = symbol.name().map(|name| name.to_string());
            frames.push(Frame::new(file, function));
        });

        if !resolved_any {
            symbolication_incomplete = true;
            frames.push(Frame::new(None, None));
        }

        frames.len() < MAX_FRAMES
    });

    CaptureOutcome {
        frames,
        symbolication_incomplete,
    }
}
